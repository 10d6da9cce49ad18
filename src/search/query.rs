//! Translation of predicate trees into tantivy queries

use crate::search::error::{IndexStoreError, IndexStoreResult};
use crate::search::predicate::{BooleanNode, Leaf, LeafKind, PredicateNode};
use crate::search::schema::{AssetSchema, FieldKind};
use std::ops::Bound;
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, Occur, PhraseQuery, Query,
    QueryClone, RangeQuery, TermQuery,
};
use tantivy::schema::IndexRecordOption;
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

/// Upper bound on should-clause combinations expanded for a
/// minimum-should-match above one
const MAX_SHOULD_COMBINATIONS: usize = 256;

/// Builds tantivy queries from predicate trees
pub struct QueryBuilder {
    index: Index,
    schema: AssetSchema,
}

impl QueryBuilder {
    pub fn new(index: Index, schema: AssetSchema) -> Self {
        Self { index, schema }
    }

    /// Build the query for a predicate tree
    pub fn build(&self, predicate: &PredicateNode) -> IndexStoreResult<Box<dyn Query>> {
        match predicate {
            PredicateNode::MatchAll => Ok(Box::new(AllQuery)),
            PredicateNode::Leaf(leaf) => self.build_leaf(leaf),
            PredicateNode::Boolean(node) => self.build_boolean(node),
        }
    }

    fn build_boolean(&self, node: &BooleanNode) -> IndexStoreResult<Box<dyn Query>> {
        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for child in node.must_clauses() {
            subqueries.push((Occur::Must, self.build(child)?));
        }

        let should = node
            .should_clauses()
            .iter()
            .map(|child| self.build(child))
            .collect::<IndexStoreResult<Vec<_>>>()?;

        match node.minimum_should_match() {
            // With no must clause, tantivy already requires one should match
            Some(1) if subqueries.is_empty() => {
                subqueries.extend(should.into_iter().map(|query| (Occur::Should, query)));
            }
            Some(1) => {
                let group = should.into_iter().map(|query| (Occur::Should, query)).collect();
                subqueries.push((Occur::Must, Box::new(BooleanQuery::new(group))));
            }
            Some(count) if count > 1 => {
                subqueries.push((Occur::Must, Self::at_least(should, count)?));
            }
            _ => {
                subqueries.extend(should.into_iter().map(|query| (Occur::Should, query)));
            }
        }

        for child in node.must_not_clauses() {
            subqueries.push((Occur::MustNot, self.build(child)?));
        }

        // A boolean query with only exclusions matches nothing
        if !subqueries.iter().any(|(occur, _)| *occur != Occur::MustNot) {
            subqueries.push((Occur::Must, Box::new(AllQuery)));
        }

        Ok(Box::new(BooleanQuery::new(subqueries)))
    }

    /// Disjunction over every `count`-sized conjunction of `queries`
    fn at_least(queries: Vec<Box<dyn Query>>, count: usize) -> IndexStoreResult<Box<dyn Query>> {
        if count > queries.len() {
            return Ok(Box::new(EmptyQuery));
        }

        let combinations = combinations(queries.len(), count);
        if combinations.len() > MAX_SHOULD_COMBINATIONS {
            return Err(IndexStoreError::UnsupportedPredicate(format!(
                "minimum_should_match {} over {} clauses",
                count,
                queries.len()
            )));
        }

        let alternatives = combinations
            .into_iter()
            .map(|positions| {
                let conjunction: Vec<(Occur, Box<dyn Query>)> = positions
                    .into_iter()
                    .map(|position| (Occur::Must, queries[position].box_clone()))
                    .collect();
                (Occur::Should, Box::new(BooleanQuery::new(conjunction)) as Box<dyn Query>)
            })
            .collect();

        Ok(Box::new(BooleanQuery::new(alternatives)))
    }

    fn build_leaf(&self, leaf: &Leaf) -> IndexStoreResult<Box<dyn Query>> {
        let query = match &leaf.kind {
            LeafKind::Match { text, fuzziness } => self.match_query(leaf, text, *fuzziness)?,
            LeafKind::Exact { value } => self.exact_query(leaf, value)?,
            LeafKind::Phrase { text } => self.phrase_query(leaf, text)?,
            LeafKind::AtLeast { gte } => self.at_least_query(leaf, *gte),
            LeafKind::Exists => Box::new(TermQuery::new(
                Term::from_field_text(self.schema.present_field(), leaf.field.name()),
                IndexRecordOption::Basic,
            )),
        };

        Ok(match leaf.boost {
            Some(boost) if (boost - 1.0).abs() > f32::EPSILON => Box::new(BoostQuery::new(query, boost)),
            _ => query,
        })
    }

    fn match_query(&self, leaf: &Leaf, text: &str, fuzziness: u8) -> IndexStoreResult<Box<dyn Query>> {
        let terms = self.analyze(leaf, text)?;
        if terms.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        let mut per_token: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|term| {
                let exact: Box<dyn Query> = Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs));
                if fuzziness == 0 {
                    return (Occur::Should, exact);
                }
                // Fuzzy matches score as constants; the exact term ranks true hits above near misses
                let fuzzy: Box<dyn Query> = Box::new(FuzzyTermQuery::new(term, fuzziness, true));
                (
                    Occur::Should,
                    Box::new(BooleanQuery::new(vec![(Occur::Should, fuzzy), (Occur::Should, exact)])) as Box<dyn Query>,
                )
            })
            .collect();

        if per_token.len() == 1 {
            let (_, query) = per_token.remove(0);
            return Ok(query);
        }
        Ok(Box::new(BooleanQuery::new(per_token)))
    }

    fn exact_query(&self, leaf: &Leaf, value: &str) -> IndexStoreResult<Box<dyn Query>> {
        let field = self.schema.field(leaf.field);
        match leaf.field.kind() {
            FieldKind::Identifier => Ok(Box::new(TermQuery::new(
                Term::from_field_text(field, value),
                IndexRecordOption::Basic,
            ))),
            FieldKind::Keyword => {
                let mut terms = self.analyze(leaf, value)?;
                Ok(match terms.pop() {
                    Some(term) => Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
                    None => Box::new(EmptyQuery),
                })
            }
            FieldKind::Text => self.phrase_query(leaf, value),
            FieldKind::Unsigned => {
                let number = value.trim().parse::<u64>().map_err(|_| {
                    IndexStoreError::UnsupportedPredicate(format!(
                        "'{}' is not a valid value for {}",
                        value,
                        leaf.field.name()
                    ))
                })?;
                Ok(Box::new(TermQuery::new(
                    Term::from_field_u64(field, number),
                    IndexRecordOption::Basic,
                )))
            }
            kind => Err(IndexStoreError::UnsupportedPredicate(format!(
                "exact match on {:?} field {}",
                kind,
                leaf.field.name()
            ))),
        }
    }

    fn phrase_query(&self, leaf: &Leaf, text: &str) -> IndexStoreResult<Box<dyn Query>> {
        let mut terms = self.analyze(leaf, text)?;
        Ok(match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => Box::new(TermQuery::new(terms.remove(0), IndexRecordOption::WithFreqsAndPositions)),
            _ => Box::new(PhraseQuery::new(terms)),
        })
    }

    fn at_least_query(&self, leaf: &Leaf, gte: u64) -> Box<dyn Query> {
        let name = leaf.field.name().to_string();

        match leaf.field.kind() {
            FieldKind::Float => Box::new(RangeQuery::new_f64_bounds(
                name,
                Bound::Included(gte as f64),
                Bound::Unbounded,
            )),
            FieldKind::Date => Box::new(RangeQuery::new_date_bounds(
                name,
                Bound::Included(tantivy::DateTime::from_timestamp_secs(gte as i64)),
                Bound::Unbounded,
            )),
            _ => Box::new(RangeQuery::new_u64_bounds(name, Bound::Included(gte), Bound::Unbounded)),
        }
    }

    /// Run `text` through the leaf field's analyzer and return the terms
    fn analyze(&self, leaf: &Leaf, text: &str) -> IndexStoreResult<Vec<Term>> {
        if !leaf.field.kind().is_textual() {
            return Err(IndexStoreError::UnsupportedPredicate(format!(
                "text match on non-text field {}",
                leaf.field.name()
            )));
        }

        let field = self.schema.field(leaf.field);
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(Term::from_field_text(field, &stream.token().text));
        }
        Ok(terms)
    }
}

/// All ascending index combinations of size `k` from `0..n`
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for position in start..n {
            current.push(position);
            extend(position + 1, n, k, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
    out
}
