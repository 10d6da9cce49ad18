use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Read-optimized projection of an asset and its first-level relations.
///
/// Produced by the system of record and handed to the index; the search core
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableAsset {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Manufacturer serial number
    pub serial_number: String,

    /// Brand name
    pub brand_name: Option<String>,

    /// Brand description
    pub brand_description: Option<String>,

    /// Category name
    pub category_name: Option<String>,

    /// Type name (e.g. "Laptop", "Printer")
    pub type_name: Option<String>,

    /// Sub-category name
    pub sub_category_name: Option<String>,

    /// Purchase timestamp
    pub purchase_date: Option<DateTime<Utc>>,

    /// Purchase price
    pub purchase_price: Option<f64>,

    /// Free-text description
    pub description: Option<String>,

    /// Lifecycle status (e.g. "ACTIVE", "IN_REPAIR")
    pub status: String,

    /// Issues reported against this asset
    #[serde(default)]
    pub issues: Vec<IssueSummary>,

    /// Condition history, any order
    #[serde(default)]
    pub condition_history: Vec<ConditionSummary>,

    /// Location history, any order
    #[serde(default)]
    pub location_history: Vec<LocationSummary>,
}

impl SearchableAsset {
    /// Create an asset with the required fields only
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            serial_number: format!("SN-{}", id),
            id,
            name: name.into(),
            brand_name: None,
            brand_description: None,
            category_name: None,
            type_name: None,
            sub_category_name: None,
            purchase_date: None,
            purchase_price: None,
            description: None,
            status: status.into(),
            issues: Vec::new(),
            condition_history: Vec::new(),
            location_history: Vec::new(),
        }
    }

    /// Most recently recorded condition, if any
    pub fn latest_condition(&self) -> Option<&ConditionSummary> {
        self.condition_history.iter().max_by_key(|c| c.recorded_at)
    }

    /// Most recent location, if any
    pub fn current_location(&self) -> Option<&LocationSummary> {
        self.location_history.iter().max_by_key(|l| l.moved_at)
    }
}

/// Summary of an issue embedded in the asset document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub resolution: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub reported_by: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl IssueSummary {
    /// Create a freshly reported issue
    pub fn new(title: impl Into<String>, priority: IssuePriority, status: IssueStatus) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority,
            status,
            resolution: None,
            reported_at: Utc::now(),
            reported_by: "system".to_string(),
            resolved_at: None,
            resolved_by: None,
        }
    }
}

/// Issue priority, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    /// Ordinal rank used by range queries (LOW = 0 .. CRITICAL = 3)
    pub fn rank(&self) -> u64 {
        match self {
            IssuePriority::Low => 0,
            IssuePriority::Medium => 1,
            IssuePriority::High => 2,
            IssuePriority::Critical => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    /// Check if the issue still needs attention
    pub fn is_active(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSummary {
    pub condition: String,
    pub notes: String,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub location: String,
    pub building: String,
    pub floor: String,
    pub room: String,
    pub notes: Option<String>,
    pub moved_at: DateTime<Utc>,
    pub moved_by: String,
}
