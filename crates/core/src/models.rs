use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// Category keys are Spanish: that is what the recognition project was
// trained on and what the persisted records carry.
pub mod categories {
    pub const BRAND: &str = "Marca";
    pub const MODEL: &str = "Modelo";
    pub const CPU: &str = "Procesador";
    pub const RAM: &str = "Memoria RAM";
    pub const GPU: &str = "Grafica";
    pub const STORAGE: &str = "Almacenamiento";
    pub const SCREEN: &str = "Pantalla";
}

// Persisted records name the field `confidence_score`; the conversational
// service emits `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    pub text: String,
    #[serde(
        rename = "confidence_score",
        alias = "confidence",
        alias = "confidenceScore"
    )]
    pub confidence: f64,
}

impl EntityCandidate {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

pub type ExtractedEntities = BTreeMap<String, Vec<EntityCandidate>>;

/// One chosen text value per category, derived by confidence resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCriteria(BTreeMap<String, String>);

impl ResolvedCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, value: impl Into<String>) {
        self.0.insert(category.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    pub fn without(&self, categories: &BTreeSet<String>) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(category, _)| !categories.contains(*category))
                .map(|(category, value)| (category.clone(), value.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for ResolvedCriteria {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Wire shape: `{document_id, json_data: {<category>: [{text, confidence_score}, ...]}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_id: String,
    #[serde(rename = "json_data")]
    pub entities: ExtractedEntities,
}

impl CatalogRecord {
    pub fn new(document_id: impl Into<String>, entities: ExtractedEntities) -> Self {
        Self {
            id: None,
            document_id: document_id.into(),
            entities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Exact,
    Relaxed,
    NoMatch,
}

/// Matched records in store order, plus the categories no record could satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub records: Vec<CatalogRecord>,
    pub unsatisfied: BTreeSet<String>,
    pub phase: MatchPhase,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            unsatisfied: BTreeSet::new(),
            phase: MatchPhase::NoMatch,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    SearchComputer,
    OrderComputer,
    GeneralInformation,
    Other,
}

impl Intent {
    /// Unknown labels collapse into `Other`.
    pub fn from_top_intent(label: &str) -> Self {
        match label {
            "Search_Computer" => Intent::SearchComputer,
            "Order_Computer" => Intent::OrderComputer,
            "General_Information" => Intent::GeneralInformation,
            _ => Intent::Other,
        }
    }

    pub fn wants_catalog_search(self) -> bool {
        matches!(self, Intent::SearchComputer | Intent::OrderComputer)
    }
}
