use crate::models::{CatalogRecord, ResolvedCriteria};
use serde_json::{json, Value};

/// Case-insensitive text predicate on one category's stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Equals(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    All(Vec<QueryNode>),
    Any(Vec<QueryNode>),
    Field { category: String, predicate: TextMatch },
}

impl QueryNode {
    fn field(category: &str, predicate: TextMatch) -> Self {
        QueryNode::Field {
            category: category.to_string(),
            predicate,
        }
    }

    /// `None` for empty criteria so no caller can issue an unconstrained query.
    pub fn exact(criteria: &ResolvedCriteria) -> Option<Self> {
        if criteria.is_empty() {
            return None;
        }
        Some(QueryNode::All(
            criteria
                .iter()
                .map(|(category, value)| {
                    Self::field(category, TextMatch::Equals(value.clone()))
                })
                .collect(),
        ))
    }

    pub fn relaxed(criteria: &ResolvedCriteria) -> Option<Self> {
        if criteria.is_empty() {
            return None;
        }
        Some(QueryNode::Any(
            criteria
                .iter()
                .map(|(category, value)| {
                    Self::field(category, TextMatch::Contains(value.clone()))
                })
                .collect(),
        ))
    }

    /// Values are regex-escaped so user text cannot change the query structure.
    pub fn to_filter(&self) -> Value {
        match self {
            QueryNode::All(children) => json!({
                "$and": children.iter().map(QueryNode::to_filter).collect::<Vec<_>>()
            }),
            QueryNode::Any(children) => json!({
                "$or": children.iter().map(QueryNode::to_filter).collect::<Vec<_>>()
            }),
            QueryNode::Field {
                category,
                predicate,
            } => {
                let pattern = match predicate {
                    TextMatch::Equals(value) => format!("^{}$", regex::escape(value)),
                    TextMatch::Contains(value) => format!(".*{}.*", regex::escape(value)),
                };
                let mut leaf = serde_json::Map::new();
                leaf.insert(
                    format!("json_data.{category}.text"),
                    json!({ "$regex": pattern, "$options": "i" }),
                );
                Value::Object(leaf)
            }
        }
    }

    // Same semantics as the compiled filter; an absent category fails its leaf.
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        match self {
            QueryNode::All(children) => children.iter().all(|child| child.matches(record)),
            QueryNode::Any(children) => children.iter().any(|child| child.matches(record)),
            QueryNode::Field {
                category,
                predicate,
            } => record
                .entities
                .get(category)
                .is_some_and(|candidates| {
                    candidates
                        .iter()
                        .any(|candidate| predicate_matches(predicate, &candidate.text))
                }),
        }
    }
}

fn predicate_matches(predicate: &TextMatch, stored: &str) -> bool {
    let stored = stored.to_lowercase();
    match predicate {
        TextMatch::Equals(value) => stored == value.to_lowercase(),
        TextMatch::Contains(value) => stored.contains(&value.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogRecord, EntityCandidate, ResolvedCriteria};
    use std::collections::BTreeMap;

    fn record(category: &str, text: &str) -> CatalogRecord {
        let mut entities = BTreeMap::new();
        entities.insert(
            category.to_string(),
            vec![EntityCandidate::new(text, 0.9)],
        );
        CatalogRecord::new("ficha.pdf", entities)
    }

    fn criteria(pairs: &[(&str, &str)]) -> ResolvedCriteria {
        pairs
            .iter()
            .map(|(category, value)| (category.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_criteria_build_no_query() {
        let empty = ResolvedCriteria::new();
        assert!(QueryNode::exact(&empty).is_none());
        assert!(QueryNode::relaxed(&empty).is_none());
    }

    #[test]
    fn exact_filter_is_anchored_conjunction() {
        let query = QueryNode::exact(&criteria(&[("Marca", "Dell"), ("Memoria RAM", "16GB")]))
            .expect("criteria are non-empty");
        let filter = query.to_filter();

        let clauses = filter["$and"].as_array().expect("conjunction");
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0]["json_data.Marca.text"]["$regex"],
            serde_json::json!("^Dell$")
        );
        assert_eq!(clauses[0]["json_data.Marca.text"]["$options"], "i");
    }

    #[test]
    fn relaxed_filter_is_substring_disjunction() {
        let query =
            QueryNode::relaxed(&criteria(&[("Marca", "Dell")])).expect("criteria are non-empty");
        let filter = query.to_filter();

        let clauses = filter["$or"].as_array().expect("disjunction");
        assert_eq!(
            clauses[0]["json_data.Marca.text"]["$regex"],
            serde_json::json!(".*Dell.*")
        );
    }

    #[test]
    fn filter_escapes_regex_metacharacters() {
        let query =
            QueryNode::exact(&criteria(&[("Procesador", "C++ (x86)")])).expect("non-empty");
        let pattern = query.to_filter()["$and"][0]["json_data.Procesador.text"]["$regex"]
            .as_str()
            .expect("pattern")
            .to_string();
        assert!(pattern.contains(r"C\+\+"));
        assert!(pattern.contains(r"\(x86\)"));
    }

    #[test]
    fn local_equals_is_case_insensitive_full_string() {
        let query = QueryNode::exact(&criteria(&[("Marca", "dell")])).expect("non-empty");
        assert!(query.matches(&record("Marca", "DELL")));
        assert!(!query.matches(&record("Marca", "Dell Inc")));
    }

    #[test]
    fn local_contains_accepts_substrings() {
        let query = QueryNode::relaxed(&criteria(&[("Marca", "dell")])).expect("non-empty");
        assert!(query.matches(&record("Marca", "Dell Inc")));
        assert!(!query.matches(&record("Marca", "Lenovo")));
    }

    #[test]
    fn missing_category_fails_the_leaf_without_panicking() {
        let query = QueryNode::exact(&criteria(&[("No Such Category $..", "x"), ("Marca", "Dell")]))
            .expect("non-empty");
        assert!(!query.matches(&record("Marca", "Dell")));
    }

    #[test]
    fn any_leaf_is_enough_for_a_disjunction() {
        let query = QueryNode::relaxed(&criteria(&[("Marca", "Asus"), ("Memoria RAM", "16")]))
            .expect("non-empty");
        assert!(query.matches(&record("Memoria RAM", "16GB DDR5")));
    }
}
