//! Explicit index schema for asset documents
//!
//! The mapping from asset fields to index fields lives here as data, separate
//! from the domain model. Changing [`FIELD_MAPPINGS`] in a way that affects
//! stored indexes requires bumping [`SCHEMA_VERSION`]; an index written with a
//! different version is refused at open time and must be rebuilt.

use crate::search::error::{IndexStoreError, IndexStoreResult};
use serde::{Deserialize, Serialize};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, STORED, STRING, TEXT,
};
use tantivy::tokenizer::{LowerCaser, RawTokenizer, TextAnalyzer};
use tantivy::Index;

/// Version of the field mapping below
pub const SCHEMA_VERSION: u32 = 2;

/// Tokenizer for keyword fields: whole value, lowercased
pub const KEYWORD_TOKENIZER: &str = "keyword";

/// Stored-only field holding the JSON projection of the asset
pub const SOURCE_FIELD: &str = "_source";

/// Keyword field listing the names of every populated field (backs `exists`)
pub const PRESENT_FIELD: &str = "_present";

/// Indexed asset fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetField {
    Id,
    Name,
    SerialNumber,
    Description,
    Status,
    BrandName,
    BrandDescription,
    CategoryName,
    TypeName,
    SubCategoryName,
    PurchaseDate,
    PurchasePrice,
    LatestCondition,
    CurrentLocation,
    IssueTitle,
    IssueDescription,
    IssueStatus,
    IssuePriority,
    /// Priorities of open and in-progress issues only
    OpenIssuePriority,
    IssueCount,
}

impl AssetField {
    /// Field name in the index
    pub fn name(&self) -> &'static str {
        self.mapping().name
    }

    /// Mapping entry for this field
    pub fn mapping(&self) -> &'static FieldMapping {
        // FIELD_MAPPINGS is declared in enum order; see test_mappings_follow_enum_order
        &FIELD_MAPPINGS[*self as usize]
    }

    pub fn kind(&self) -> FieldKind {
        self.mapping().kind
    }
}

/// How a field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Untokenized, case-sensitive, stored
    Identifier,
    /// Full-text: default tokenizer, lowercased, with positions for phrases
    Text,
    /// Whole value lowercased; exact matching only
    Keyword,
    /// Unsigned integer, range-queryable
    Unsigned,
    /// Floating point, range-queryable
    Float,
    /// Timestamp with second precision, range-queryable
    Date,
}

impl FieldKind {
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldKind::Identifier | FieldKind::Text | FieldKind::Keyword)
    }
}

/// One row of the schema table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: AssetField,
    pub name: &'static str,
    pub kind: FieldKind,
    /// Embedded collections contribute one value per element
    pub multi_valued: bool,
}

const fn mapping(field: AssetField, name: &'static str, kind: FieldKind) -> FieldMapping {
    FieldMapping {
        field,
        name,
        kind,
        multi_valued: false,
    }
}

const fn multi(field: AssetField, name: &'static str, kind: FieldKind) -> FieldMapping {
    FieldMapping {
        field,
        name,
        kind,
        multi_valued: true,
    }
}

/// Asset index schema, in [`AssetField`] declaration order
pub const FIELD_MAPPINGS: &[FieldMapping] = &[
    mapping(AssetField::Id, "id", FieldKind::Identifier),
    mapping(AssetField::Name, "name", FieldKind::Text),
    mapping(AssetField::SerialNumber, "serial_number", FieldKind::Keyword),
    mapping(AssetField::Description, "description", FieldKind::Text),
    mapping(AssetField::Status, "status", FieldKind::Keyword),
    mapping(AssetField::BrandName, "brand.name", FieldKind::Text),
    mapping(AssetField::BrandDescription, "brand.description", FieldKind::Text),
    mapping(AssetField::CategoryName, "category.name", FieldKind::Text),
    mapping(AssetField::TypeName, "type.name", FieldKind::Text),
    mapping(AssetField::SubCategoryName, "sub_category.name", FieldKind::Text),
    mapping(AssetField::PurchaseDate, "purchase_date", FieldKind::Date),
    mapping(AssetField::PurchasePrice, "purchase_price", FieldKind::Float),
    mapping(AssetField::LatestCondition, "condition_history.latest", FieldKind::Keyword),
    mapping(AssetField::CurrentLocation, "location_history.current", FieldKind::Text),
    multi(AssetField::IssueTitle, "issues.title", FieldKind::Text),
    multi(AssetField::IssueDescription, "issues.description", FieldKind::Text),
    multi(AssetField::IssueStatus, "issues.status", FieldKind::Keyword),
    multi(AssetField::IssuePriority, "issues.priority", FieldKind::Unsigned),
    multi(AssetField::OpenIssuePriority, "issues.open_priority", FieldKind::Unsigned),
    mapping(AssetField::IssueCount, "issues.count", FieldKind::Unsigned),
];

fn keyword_options() -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(KEYWORD_TOKENIZER)
            .set_index_option(IndexRecordOption::Basic),
    )
}

/// Resolved tantivy schema plus field handles
#[derive(Debug, Clone)]
pub struct AssetSchema {
    schema: Schema,
    fields: Vec<Field>,
    source: Field,
    present: Field,
}

impl AssetSchema {
    /// Build a fresh schema from [`FIELD_MAPPINGS`]
    pub fn build() -> Self {
        let mut builder = Schema::builder();
        let mut fields = Vec::with_capacity(FIELD_MAPPINGS.len());

        for mapping in FIELD_MAPPINGS {
            let field = match mapping.kind {
                FieldKind::Identifier => builder.add_text_field(mapping.name, STRING | STORED),
                FieldKind::Text => builder.add_text_field(mapping.name, TEXT),
                FieldKind::Keyword => builder.add_text_field(mapping.name, keyword_options()),
                FieldKind::Unsigned => builder.add_u64_field(mapping.name, INDEXED),
                FieldKind::Float => builder.add_f64_field(mapping.name, INDEXED),
                FieldKind::Date => builder.add_date_field(mapping.name, INDEXED),
            };
            fields.push(field);
        }

        let source = builder.add_text_field(SOURCE_FIELD, STORED);
        let present = builder.add_text_field(PRESENT_FIELD, keyword_options());

        Self {
            schema: builder.build(),
            fields,
            source,
            present,
        }
    }

    /// Resolve field handles against the schema of an existing index
    pub fn from_schema(schema: Schema) -> IndexStoreResult<Self> {
        let resolve = |name: &str| {
            schema.get_field(name).map_err(|_| {
                IndexStoreError::SchemaMismatch(format!("field '{}' missing from existing index", name))
            })
        };

        let fields = FIELD_MAPPINGS
            .iter()
            .map(|mapping| resolve(mapping.name))
            .collect::<IndexStoreResult<Vec<_>>>()?;
        let source = resolve(SOURCE_FIELD)?;
        let present = resolve(PRESENT_FIELD)?;

        Ok(Self {
            schema,
            fields,
            source,
            present,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field(&self, field: AssetField) -> Field {
        self.fields[field as usize]
    }

    pub fn source_field(&self) -> Field {
        self.source
    }

    pub fn present_field(&self) -> Field {
        self.present
    }
}

/// Register the analyzers the schema refers to. Custom tokenizers are not
/// persisted with the index, so this runs on every open.
pub fn register_tokenizers(index: &Index) {
    index.tokenizers().register(
        KEYWORD_TOKENIZER,
        TextAnalyzer::builder(RawTokenizer::default())
            .filter(LowerCaser)
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mappings_follow_enum_order() {
        for (position, mapping) in FIELD_MAPPINGS.iter().enumerate() {
            assert_eq!(mapping.field as usize, position, "{} is out of order", mapping.name);
        }
        assert_eq!(AssetField::IssueCount.name(), "issues.count");
    }

    #[test]
    fn test_schema_building() {
        let asset_schema = AssetSchema::build();
        let schema = asset_schema.schema();

        assert!(schema.get_field("id").is_ok());
        assert!(schema.get_field("brand.name").is_ok());
        assert!(schema.get_field("issues.priority").is_ok());
        assert!(schema.get_field("issues.open_priority").is_ok());
        assert!(schema.get_field(SOURCE_FIELD).is_ok());
        assert_eq!(
            asset_schema.field(AssetField::TypeName),
            schema.get_field("type.name").unwrap()
        );
    }

    #[test]
    fn test_resolve_existing_schema() {
        let built = AssetSchema::build();
        let resolved = AssetSchema::from_schema(built.schema().clone()).unwrap();
        assert_eq!(resolved.field(AssetField::Status), built.field(AssetField::Status));
        assert_eq!(resolved.present_field(), built.present_field());
    }

    #[test]
    fn test_resolve_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("title", TEXT | STORED);
        let result = AssetSchema::from_schema(builder.build());
        assert!(matches!(result, Err(IndexStoreError::SchemaMismatch(_))));
    }
}
