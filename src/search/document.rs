//! Search document structures and indexing

use crate::models::SearchableAsset;
use crate::search::error::{IndexStoreError, IndexStoreResult};
use crate::search::schema::{AssetField, AssetSchema, FieldKind};
use chrono::{DateTime, Utc};
use tantivy::schema::Value;
use tantivy::TantivyDocument;

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &AssetSchema) -> IndexStoreResult<TantivyDocument>;

    /// Get document ID
    fn document_id(&self) -> String;
}

/// A single value destined for an index field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Unsigned(u64),
    Float(f64),
    Date(DateTime<Utc>),
}

impl FieldValue {
    fn text(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| FieldValue::Text(trimmed.to_string()))
    }
}

/// Flatten an asset into `(field, value)` pairs following the schema table.
/// Absent optional values produce no pair; collections produce one per element.
pub fn field_values(asset: &SearchableAsset) -> Vec<(AssetField, FieldValue)> {
    let mut values = Vec::new();
    let mut push_text = |field: AssetField, value: Option<&str>| {
        if let Some(value) = value.and_then(FieldValue::text) {
            values.push((field, value));
        }
    };

    push_text(AssetField::Id, Some(&asset.id));
    push_text(AssetField::Name, Some(&asset.name));
    push_text(AssetField::SerialNumber, Some(&asset.serial_number));
    push_text(AssetField::Description, asset.description.as_deref());
    push_text(AssetField::Status, Some(&asset.status));
    push_text(AssetField::BrandName, asset.brand_name.as_deref());
    push_text(AssetField::BrandDescription, asset.brand_description.as_deref());
    push_text(AssetField::CategoryName, asset.category_name.as_deref());
    push_text(AssetField::TypeName, asset.type_name.as_deref());
    push_text(AssetField::SubCategoryName, asset.sub_category_name.as_deref());
    push_text(
        AssetField::LatestCondition,
        asset.latest_condition().map(|c| c.condition.as_str()),
    );
    push_text(
        AssetField::CurrentLocation,
        asset.current_location().map(|l| l.location.as_str()),
    );

    for issue in &asset.issues {
        push_text(AssetField::IssueTitle, Some(&issue.title));
        push_text(AssetField::IssueDescription, Some(&issue.description));
        let status = issue.status.to_string();
        push_text(AssetField::IssueStatus, Some(&status));
    }

    if let Some(date) = asset.purchase_date {
        values.push((AssetField::PurchaseDate, FieldValue::Date(date)));
    }
    if let Some(price) = asset.purchase_price {
        values.push((AssetField::PurchasePrice, FieldValue::Float(price)));
    }
    for issue in &asset.issues {
        values.push((AssetField::IssuePriority, FieldValue::Unsigned(issue.priority.rank())));
    }
    for issue in asset.issues.iter().filter(|i| i.status.is_active()) {
        values.push((AssetField::OpenIssuePriority, FieldValue::Unsigned(issue.priority.rank())));
    }
    values.push((AssetField::IssueCount, FieldValue::Unsigned(asset.issues.len() as u64)));

    values
}

impl SearchDocument for SearchableAsset {
    fn to_tantivy_doc(&self, schema: &AssetSchema) -> IndexStoreResult<TantivyDocument> {
        let mut doc = TantivyDocument::default();
        let mut present: Vec<&'static str> = Vec::new();

        for (field, value) in field_values(self) {
            let handle = schema.field(field);
            match (field.kind(), value) {
                (FieldKind::Identifier | FieldKind::Text | FieldKind::Keyword, FieldValue::Text(text)) => {
                    doc.add_text(handle, &text)
                }
                (FieldKind::Unsigned, FieldValue::Unsigned(number)) => doc.add_u64(handle, number),
                (FieldKind::Float, FieldValue::Float(number)) => doc.add_f64(handle, number),
                (FieldKind::Date, FieldValue::Date(date)) => {
                    doc.add_date(handle, tantivy::DateTime::from_timestamp_secs(date.timestamp()))
                }
                (kind, value) => {
                    return Err(IndexStoreError::IndexingFailed(format!(
                        "value {:?} does not fit {:?} field '{}'",
                        value,
                        kind,
                        field.name()
                    )))
                }
            }
            if !present.contains(&field.name()) {
                present.push(field.name());
            }
        }

        for name in present {
            doc.add_text(schema.present_field(), name);
        }

        let source = serde_json::to_string(self).map_err(|e| {
            IndexStoreError::IndexingFailed(format!("Failed to serialize asset {}: {}", self.id, e))
        })?;
        doc.add_text(schema.source_field(), &source);

        Ok(doc)
    }

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

/// Map a stored document back to the asset it was built from
pub fn asset_from_doc(doc: &TantivyDocument, schema: &AssetSchema) -> IndexStoreResult<SearchableAsset> {
    let source = doc
        .get_first(schema.source_field())
        .and_then(|v| v.as_str())
        .ok_or_else(|| IndexStoreError::CorruptDocument("stored source is missing".to_string()))?;

    serde_json::from_str(source)
        .map_err(|e| IndexStoreError::CorruptDocument(format!("stored source is unreadable: {}", e)))
}
