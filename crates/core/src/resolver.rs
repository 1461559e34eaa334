use crate::models::{EntityCandidate, ExtractedEntities, ResolvedCriteria};

pub const UNKNOWN: &str = "Desconocido";

/// Highest confidence wins; ties keep the first-seen candidate.
pub fn best_candidate(candidates: &[EntityCandidate]) -> Option<&EntityCandidate> {
    let mut best: Option<&EntityCandidate> = None;

    for candidate in candidates {
        match best {
            Some(current) if candidate.confidence <= current.confidence => {}
            _ => best = Some(candidate),
        }
    }

    best
}

pub fn resolve(candidates: &[EntityCandidate]) -> String {
    best_candidate(candidates)
        .map(|candidate| candidate.text.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn resolve_field(entities: &ExtractedEntities, category: &str) -> String {
    entities
        .get(category)
        .map(|candidates| resolve(candidates))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

// Sentinel-valued categories carry no information and are dropped.
pub fn resolve_criteria(entities: &ExtractedEntities) -> ResolvedCriteria {
    entities
        .iter()
        .map(|(category, candidates)| (category.clone(), resolve(candidates)))
        .filter(|(_, value)| value != UNKNOWN)
        .collect()
}
