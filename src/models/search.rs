use crate::models::asset::{IssuePriority, SearchableAsset};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Filter key to value, e.g. `{"brand": "Dell", "status": "ACTIVE"}`
pub type Filters = HashMap<String, String>;

/// A ranked search hit as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub brand_name: Option<String>,
    pub brand_description: Option<String>,
    pub category_name: Option<String>,
    pub type_name: Option<String>,
    pub sub_category_name: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub description: Option<String>,
    pub status: String,

    /// Relevance score assigned by the index
    pub score: f32,

    /// Generated commentary, absent until enrichment runs
    #[serde(rename = "llmCommentary")]
    pub commentary: Option<String>,
}

impl SearchResult {
    /// Map an indexed asset to a result with no commentary
    pub fn from_asset(asset: &SearchableAsset, score: f32) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            serial_number: asset.serial_number.clone(),
            brand_name: asset.brand_name.clone(),
            brand_description: asset.brand_description.clone(),
            category_name: asset.category_name.clone(),
            type_name: asset.type_name.clone(),
            sub_category_name: asset.sub_category_name.clone(),
            purchase_date: asset.purchase_date,
            purchase_price: asset.purchase_price,
            description: asset.description.clone(),
            status: asset.status.clone(),
            score,
            commentary: None,
        }
    }
}

/// Issue-based search criteria; every field is optional and additive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSearchCriteria {
    /// Only assets with at least one OPEN issue
    pub has_open_issues: Option<bool>,

    /// Only assets with at least this many issues
    pub min_issue_count: Option<u32>,

    /// Only assets with an issue at or above this priority
    #[serde(alias = "minSeverity")]
    pub min_priority: Option<IssuePriority>,

    /// Keep assets that carry RESOLVED issues (default: false)
    pub include_resolved: Option<bool>,
}

impl IssueSearchCriteria {
    pub fn includes_resolved(&self) -> bool {
        self.include_resolved == Some(true)
    }
}

/// Filters plus a natural-language intent
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompoundSearchRequest {
    #[serde(default, alias = "naturalLanguageQuery")]
    pub intent: String,

    #[serde(default)]
    pub filters: Filters,

    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

impl CompoundSearchRequest {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Issue criteria with optional filters and commentary
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueSearchRequest {
    #[serde(alias = "naturalLanguageQuery")]
    pub intent: Option<String>,

    pub filters: Option<Filters>,

    #[serde(alias = "issueSearchCriteria")]
    pub criteria: Option<IssueSearchCriteria>,

    /// Request generated commentary; requires a non-blank intent
    #[serde(default, alias = "enhanceWithLLM")]
    pub enhance: bool,

    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

impl IssueSearchRequest {
    pub fn new(criteria: IssueSearchCriteria) -> Self {
        Self {
            criteria: Some(criteria),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .get_or_insert_with(Filters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_enhancement(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self.enhance = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_asset() {
        let mut asset = SearchableAsset::new("a-7", "Dell Laptop", "ACTIVE");
        asset.brand_name = Some("Dell".to_string());

        let result = SearchResult::from_asset(&asset, 1.5);
        assert_eq!(result.id, "a-7");
        assert_eq!(result.brand_name.as_deref(), Some("Dell"));
        assert!(result.commentary.is_none());
        assert_eq!(result.score, 1.5);
    }

    #[test]
    fn test_issue_request_accepts_legacy_field_names() {
        let json = r#"{
            "naturalLanguageQuery": "printers needing attention",
            "issueSearchCriteria": {"hasOpenIssues": true, "minPriority": "HIGH"},
            "enhanceWithLLM": true,
            "limit": 5
        }"#;

        let request: IssueSearchRequest = serde_json::from_str(json).unwrap();
        let criteria = request.criteria.unwrap();
        assert!(request.enhance);
        assert_eq!(criteria.has_open_issues, Some(true));
        assert_eq!(criteria.min_priority, Some(IssuePriority::High));
        assert!(!criteria.includes_resolved());
    }

    #[test]
    fn test_compound_request_defaults() {
        let request: CompoundSearchRequest = serde_json::from_str(r#"{"filters": {"status": "ACTIVE"}}"#).unwrap();
        assert!(request.intent.is_empty());
        assert_eq!(request.limit, None);
        assert_eq!(request.filters.get("status").map(String::as_str), Some("ACTIVE"));
    }
}
