//! SQL generation for the fuzzy text match stage.
//!
//! Each query token becomes an `EXISTS` subquery against `image_term`, the
//! per-image term index maintained by trigger. The subquery accepts any of the
//! token's fuzzy expansions, computed inline with `fuzzystrmatch`:
//!
//! - subterms no longer than the prefix length must match exactly
//! - longer subterms must share the prefix and lie within the maximum edit distance
//! - terms over [`MAX_FUZZY_TERM_CHARS`] on either side must match exactly
//! - candidates are ranked by distance then term and capped
//!
//! Candidate terms come from a byte-order range scan on the prefix, served
//! by the `text_pattern_ops` index on `image_term(term)`, and are pruned by
//! length before any distance is computed.
//!
//! Predicates are then combined with `OR`, `AND` or wrapped in `NOT (... OR ...)`.

use galleria_core::{MatchClause, TextMatch};

use crate::analysis::analyze;
use crate::fuzzy::MAX_FUZZY_TERM_CHARS;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Integer parameter.
    Int(i64),
    /// Array of strings (analyzed subterms of one token).
    StringArray(Vec<String>),
}

/// Generates the WHERE clause fragment for a [`TextMatch`].
///
/// # Example
///
/// ```rust,ignore
/// use galleria_db::match_filter::TextMatchQueryBuilder;
///
/// let builder = TextMatchQueryBuilder::new(&text_match, 0);
/// let (sql, params) = builder.build();
/// // sql: "(EXISTS (SELECT 1 FROM image_term it WHERE it.image_id = i.id AND it.term IN (...)))"
/// // params: [Int(3), Int(1), Int(50), StringArray(["cat"])]
/// ```
pub struct TextMatchQueryBuilder<'a> {
    text_match: &'a TextMatch,
    param_offset: usize,
}

impl<'a> TextMatchQueryBuilder<'a> {
    /// Create a new builder.
    ///
    /// # Parameters
    ///
    /// * `text_match` - The match stage to translate
    /// * `param_offset` - Number of parameters already in the query
    pub fn new(text_match: &'a TextMatch, param_offset: usize) -> Self {
        Self {
            text_match,
            param_offset,
        }
    }

    /// Build the clause. Expects the outer query to alias `image` as `i`.
    ///
    /// Returns the SQL fragment and the parameters in placeholder order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let fuzzy = self.text_match.fuzzy;
        let mut params = vec![
            QueryParam::Int(fuzzy.prefix_length as i64),
            QueryParam::Int(i64::from(fuzzy.max_edits)),
            QueryParam::Int(fuzzy.max_expansions as i64),
        ];
        let prefix_idx = self.param_offset + 1;
        let edits_idx = self.param_offset + 2;
        let expansions_idx = self.param_offset + 3;
        let mut param_idx = expansions_idx;

        let clause = &self.text_match.clause;
        let mut predicates = Vec::with_capacity(clause.terms().len());
        for term in clause.terms() {
            param_idx += 1;
            predicates.push(format!(
                "EXISTS (SELECT 1 FROM image_term it WHERE it.image_id = i.id AND it.term IN (\
                 SELECT c.term FROM (\
                 SELECT v.term, CASE \
                 WHEN v.term = q.sub THEN 0 \
                 WHEN char_length(v.term) > {max_chars} OR char_length(q.sub) > {max_chars} THEN NULL \
                 ELSE levenshtein(v.term, q.sub) END AS distance \
                 FROM unnest(${arr}::text[]) AS q(sub) \
                 CROSS JOIN LATERAL (\
                 SELECT DISTINCT t.term FROM image_term t \
                 WHERE t.term ~>=~ left(q.sub, ${prefix}::int) \
                 AND t.term ~<~ (left(q.sub, ${prefix}::int) || chr(1114111)) \
                 AND abs(char_length(t.term) - char_length(q.sub)) <= ${edits} \
                 AND (char_length(q.sub) > ${prefix}::int OR t.term = q.sub)) v) c \
                 WHERE c.distance <= ${edits} \
                 GROUP BY c.term \
                 ORDER BY MIN(c.distance), c.term \
                 LIMIT ${expansions}))",
                arr = param_idx,
                prefix = prefix_idx,
                edits = edits_idx,
                expansions = expansions_idx,
                max_chars = MAX_FUZZY_TERM_CHARS,
            ));
            params.push(QueryParam::StringArray(analyze(term.as_str()).collect()));
        }

        let sql = match clause {
            MatchClause::AnyOf(_) => format!("({})", predicates.join(" OR ")),
            MatchClause::AllOf(_) => format!("({})", predicates.join(" AND ")),
            MatchClause::NoneOf(_) => format!("NOT ({})", predicates.join(" OR ")),
        };
        (sql, params)
    }
}
