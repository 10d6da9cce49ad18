//! Immutable predicate trees and the filter/criteria builder
//!
//! A [`PredicateNode`] describes what to match without reference to any index
//! engine; [`crate::search::QueryBuilder`] translates it into tantivy queries.

use crate::models::{Filters, IssueSearchCriteria, IssueStatus};
use crate::search::schema::AssetField;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::{debug, warn};

/// Largest edit distance the index supports for fuzzy matching
pub const MAX_EDIT_DISTANCE: u8 = 2;

/// Fuzzy edit distance applied to brand and type filters
pub const FILTER_EDIT_DISTANCE: u8 = 1;

/// A node in a predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Matches every document
    MatchAll,
    Leaf(Leaf),
    Boolean(BooleanNode),
}

impl PredicateNode {
    pub fn is_match_all(&self) -> bool {
        matches!(self, PredicateNode::MatchAll)
    }
}

impl From<Leaf> for PredicateNode {
    fn from(leaf: Leaf) -> Self {
        PredicateNode::Leaf(leaf)
    }
}

impl From<BooleanNode> for PredicateNode {
    fn from(node: BooleanNode) -> Self {
        PredicateNode::Boolean(node)
    }
}

/// What a leaf matches on its field
#[derive(Debug, Clone, PartialEq)]
pub enum LeafKind {
    /// Analyzed tokens, each allowed up to `fuzziness` edits
    Match { text: String, fuzziness: u8 },
    /// Whole value equality under the field's normalization
    Exact { value: String },
    /// Analyzed tokens adjacent and in order
    Phrase { text: String },
    /// Inclusive lower bound; dates are given in epoch seconds
    AtLeast { gte: u64 },
    /// Field carries at least one value
    Exists,
}

/// A condition on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub field: AssetField,
    pub kind: LeafKind,
    pub boost: Option<f32>,
}

impl Leaf {
    fn new(field: AssetField, kind: LeafKind) -> Self {
        Self {
            field,
            kind,
            boost: None,
        }
    }

    /// Token match; `fuzziness` is capped at [`MAX_EDIT_DISTANCE`]
    pub fn fuzzy(field: AssetField, text: impl Into<String>, fuzziness: u8) -> Self {
        Self::new(
            field,
            LeafKind::Match {
                text: text.into(),
                fuzziness: fuzziness.min(MAX_EDIT_DISTANCE),
            },
        )
    }

    /// Token match without edits
    pub fn matching(field: AssetField, text: impl Into<String>) -> Self {
        Self::fuzzy(field, text, 0)
    }

    pub fn exact(field: AssetField, value: impl Into<String>) -> Self {
        Self::new(field, LeafKind::Exact { value: value.into() })
    }

    pub fn phrase(field: AssetField, text: impl Into<String>) -> Self {
        Self::new(field, LeafKind::Phrase { text: text.into() })
    }

    pub fn at_least(field: AssetField, gte: u64) -> Self {
        Self::new(field, LeafKind::AtLeast { gte })
    }

    pub fn exists(field: AssetField) -> Self {
        Self::new(field, LeafKind::Exists)
    }

    pub fn boosted(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// Boolean composition of child predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanNode {
    must: Vec<PredicateNode>,
    should: Vec<PredicateNode>,
    must_not: Vec<PredicateNode>,
    minimum_should_match: Option<usize>,
}

impl BooleanNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, node: impl Into<PredicateNode>) -> Self {
        self.must.push(node.into());
        self
    }

    pub fn should(mut self, node: impl Into<PredicateNode>) -> Self {
        self.should.push(node.into());
        self
    }

    pub fn must_not(mut self, node: impl Into<PredicateNode>) -> Self {
        self.must_not.push(node.into());
        self
    }

    pub fn with_minimum_should_match(mut self, count: usize) -> Self {
        self.minimum_should_match = Some(count);
        self
    }

    pub fn must_clauses(&self) -> &[PredicateNode] {
        &self.must
    }

    pub fn should_clauses(&self) -> &[PredicateNode] {
        &self.should
    }

    pub fn must_not_clauses(&self) -> &[PredicateNode] {
        &self.must_not
    }

    /// Minimum number of should clauses that must match. Never reported for a
    /// node without should clauses, where it could not be satisfied.
    pub fn minimum_should_match(&self) -> Option<usize> {
        if self.should.is_empty() {
            None
        } else {
            self.minimum_should_match
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }
}

/// Recognized filter keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FilterKey {
    Brand,
    Type,
    Status,
    Condition,
}

impl FilterKey {
    fn clause(&self, value: &str) -> Leaf {
        match self {
            FilterKey::Brand => Leaf::fuzzy(AssetField::BrandName, value, FILTER_EDIT_DISTANCE),
            FilterKey::Type => Leaf::fuzzy(AssetField::TypeName, value, FILTER_EDIT_DISTANCE),
            FilterKey::Status => Leaf::exact(AssetField::Status, value),
            FilterKey::Condition => Leaf::exact(AssetField::LatestCondition, value),
        }
    }
}

/// Builds predicate trees from request filters and issue criteria
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Compose filters and optional issue criteria under one Boolean node.
    /// Never fails: blank values are skipped and unknown keys only logged.
    /// With nothing to constrain, the result is [`PredicateNode::MatchAll`].
    pub fn build(filters: &Filters, criteria: Option<&IssueSearchCriteria>) -> PredicateNode {
        let mut node = BooleanNode::new();

        for leaf in Self::filter_clauses(filters) {
            node = node.must(leaf);
        }

        if let Some(criteria) = criteria {
            node = Self::apply_issue_criteria(node, criteria);
        }

        if node.is_empty() {
            debug!("No constraints supplied, matching all assets");
            return PredicateNode::MatchAll;
        }

        node.into()
    }

    /// One must-leaf per recognized filter with a non-blank value, in key order
    pub fn filter_clauses(filters: &Filters) -> Vec<Leaf> {
        let mut entries: Vec<(&String, &String)> = filters.iter().collect();
        entries.sort();

        entries
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.trim();
                if value.is_empty() {
                    debug!(filter = %key, "Skipping blank filter value");
                    return None;
                }
                match FilterKey::from_str(key.trim()) {
                    Ok(filter_key) => Some(filter_key.clause(value)),
                    Err(_) => {
                        warn!(filter = %key, "Ignoring unknown filter key");
                        None
                    }
                }
            })
            .collect()
    }

    fn apply_issue_criteria(mut node: BooleanNode, criteria: &IssueSearchCriteria) -> BooleanNode {
        if criteria.has_open_issues == Some(true) {
            node = node.must(Leaf::exact(AssetField::IssueStatus, IssueStatus::Open.to_string()));
        }

        if let Some(count) = criteria.min_issue_count.filter(|count| *count > 0) {
            node = node.must(Leaf::at_least(AssetField::IssueCount, u64::from(count)));
        }

        // Resolved and closed issues only count toward priority when included
        if let Some(priority) = criteria.min_priority {
            let field = if criteria.includes_resolved() {
                AssetField::IssuePriority
            } else {
                AssetField::OpenIssuePriority
            };
            node = node.must(Leaf::at_least(field, priority.rank()));
        }

        if !criteria.includes_resolved() {
            node = node.must_not(Leaf::exact(
                AssetField::IssueStatus,
                IssueStatus::Resolved.to_string(),
            ));
        }

        node
    }
}
