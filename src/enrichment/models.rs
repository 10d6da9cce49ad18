use crate::models::{IssueSearchCriteria, SearchResult};
use serde::{Deserialize, Serialize};

/// System prompt for general asset commentary
pub const ASSET_ANALYST_PROMPT: &str = "\
You are an expert IT asset management analyst. When analyzing assets, provide detailed insights that cover:
1. Current Status: Device type, usage state, and general categorization
2. Technical Analysis: Key specifications and capabilities
3. Business Context: Suitability for business operations and investment value
4. Management Insights: Relevant points for asset lifecycle management

Format your response as a cohesive, multi-paragraph analysis that flows naturally.
Focus on practical insights that would be valuable for IT managers and asset administrators.
Keep the tone professional but accessible.";

/// System prompt for issue-focused commentary
pub const ISSUE_ANALYST_PROMPT: &str = "\
You are an IT issue analysis specialist. When analyzing assets with issues, provide insights that cover:
1. Issue Status Overview: Summary of issue count, severity, and status
2. Risk Assessment: Potential impact on operations and business continuity
3. Maintenance Recommendations: Suggested actions based on issue patterns
4. Asset Health Analysis: Overall assessment of the asset's reliability

Focus on actionable insights that help with prioritizing maintenance, resource allocation and long-term planning.
Keep the analysis practical and focused on business impact.";

/// Enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Enable enrichment
    pub enabled: bool,

    /// Per-item generation timeout (seconds)
    pub timeout_secs: u64,

    /// Maximum concurrent generation calls
    pub max_concurrent: usize,

    /// Commentary cache TTL (seconds); 0 disables caching
    pub cache_ttl_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
            max_concurrent: 4,
            cache_ttl_secs: 300,
        }
    }
}

/// Which analysis a result receives
#[derive(Debug, Clone, PartialEq)]
pub enum ContextKind {
    General,
    IssueFocused(IssueSearchCriteria),
}

impl ContextKind {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            ContextKind::General => ASSET_ANALYST_PROMPT,
            ContextKind::IssueFocused(_) => ISSUE_ANALYST_PROMPT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContextKind::General => "general",
            ContextKind::IssueFocused(_) => "issue_focused",
        }
    }

    /// Fixed-shape context describing one result. Issue-focused contexts
    /// carry the serial number and the criteria on top of the asset fields.
    pub fn build_context(&self, result: &SearchResult, intent: &str) -> String {
        let mut context = format!("Search intent: {}\n\nAnalyze this IT asset:\n", intent.trim());

        line(&mut context, "Name", &result.name);
        if let ContextKind::IssueFocused(_) = self {
            line(&mut context, "Serial Number", &result.serial_number);
        }
        line(&mut context, "Brand", or_unknown(&result.brand_name));
        line(&mut context, "Type", or_unknown(&result.type_name));
        line(&mut context, "Category", or_unknown(&result.category_name));
        line(&mut context, "SubCategory", or_unknown(&result.sub_category_name));
        line(&mut context, "Status", &result.status);
        line(&mut context, "Description", or_unknown(&result.description));

        let price = result.purchase_price.map(|price| format!("${:.2}", price));
        line(&mut context, "Purchase Price", or_unknown(&price));
        let date = result.purchase_date.map(|date| date.format("%Y-%m-%d").to_string());
        line(&mut context, "Purchase Date", or_unknown(&date));

        if let ContextKind::IssueFocused(criteria) = self {
            context.push_str("Issue Criteria:\n");
            line(&mut context, "- Open Issues", &or_any(criteria.has_open_issues));
            line(&mut context, "- Min Issues", &or_any(criteria.min_issue_count));
            line(&mut context, "- Min Priority", &or_any(criteria.min_priority));
            line(&mut context, "- Include Resolved", &criteria.includes_resolved().to_string());
        }

        context
    }
}

fn line(context: &mut String, label: &str, value: &str) {
    context.push_str(label);
    context.push_str(": ");
    context.push_str(value);
    context.push('\n');
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("unknown")
}

fn or_any<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "any".to_string(), |v| v.to_string())
}
