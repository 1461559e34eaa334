use crate::error::AssistantError;
use crate::extractor::{
    extract_document_text, ChatCompletion, ConversationAnalyzer, EntityRecognizer,
};
use crate::formatter::{format_extracted, recommendation, Recommendation};
use crate::matcher::CatalogMatcher;
use crate::models::{ExtractedEntities, Intent, MatchPhase};
use crate::resolver::resolve_criteria;
use crate::store::CatalogStore;
use std::collections::BTreeSet;
use tracing::debug;

// General questions must mention one of these to reach the completion
// service.
const DOMAIN_KEYWORDS: &[&str] = &[
    "ordenador",
    "pc",
    "portátil",
    "cpu",
    "gpu",
    "ram",
    "procesador",
    "gráfica",
    "tarjeta gráfica",
];

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    Recommendations {
        items: Vec<Recommendation>,
        /// Set when the hits came from the relaxed phase.
        similar: bool,
    },
    NotFound {
        unsatisfied: BTreeSet<String>,
    },
    Answer(String),
    OffTopic,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReply {
    pub entities: ExtractedEntities,
    pub specs: String,
}

/// Each interaction is a self-contained request/response; the assistant
/// keeps no session state.
pub struct Assistant<C, G, S> {
    conversation: C,
    chat: G,
    matcher: CatalogMatcher<S>,
    blob_base_url: String,
}

impl<C, G, S> Assistant<C, G, S>
where
    C: ConversationAnalyzer + Send + Sync,
    G: ChatCompletion + Send + Sync,
    S: CatalogStore + Send + Sync,
{
    pub fn new(conversation: C, chat: G, store: S, blob_base_url: impl Into<String>) -> Self {
        Self {
            conversation,
            chat,
            matcher: CatalogMatcher::new(store),
            blob_base_url: blob_base_url.into(),
        }
    }

    pub fn catalog(&self) -> &S {
        self.matcher.store()
    }

    pub async fn handle_utterance(&self, text: &str) -> Result<AssistantReply, AssistantError> {
        let analysis = self.conversation.analyze(text).await?;
        debug!(intent = ?analysis.intent, "utterance classified");

        if analysis.intent.wants_catalog_search() {
            return self.recommend(&analysis.entities).await;
        }

        match analysis.intent {
            Intent::GeneralInformation => {
                if !is_about_computers(text) {
                    return Ok(AssistantReply::OffTopic);
                }
                let answer = self.chat.complete(text).await?;
                Ok(AssistantReply::Answer(answer))
            }
            _ => Ok(AssistantReply::Unsupported),
        }
    }

    async fn recommend(
        &self,
        entities: &ExtractedEntities,
    ) -> Result<AssistantReply, AssistantError> {
        let criteria = resolve_criteria(entities);
        let result = self.matcher.find_matches(&criteria).await?;

        // A relaxed query is already a disjunction over every criterion, so
        // re-querying with the unsatisfied categories removed could never
        // match anything the first two queries did not. No third query.
        if result.records.is_empty() {
            return Ok(AssistantReply::NotFound {
                unsatisfied: result.unsatisfied,
            });
        }

        Ok(AssistantReply::Recommendations {
            items: self.to_recommendations(&result.records),
            similar: result.phase == MatchPhase::Relaxed,
        })
    }

    pub async fn handle_document<R>(
        &self,
        bytes: &[u8],
        recognizer: &R,
    ) -> Result<DocumentReply, AssistantError>
    where
        R: EntityRecognizer + Send + Sync,
    {
        let text = extract_document_text(bytes)?;
        let entities = recognizer.recognize_entities(&text).await?;
        let specs = format_extracted(&entities);
        Ok(DocumentReply { entities, specs })
    }

    fn to_recommendations(&self, records: &[crate::models::CatalogRecord]) -> Vec<Recommendation> {
        records
            .iter()
            .map(|record| recommendation(record, &self.blob_base_url))
            .collect()
    }
}

fn is_about_computers(text: &str) -> bool {
    let lowered = text.to_lowercase();
    DOMAIN_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
