pub mod error;
pub mod extractor;
pub mod formatter;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod query;
pub mod resolver;
pub mod store;
pub mod stores;
pub mod summary;

pub use error::{AssistantError, CatalogError, ExtractError};
pub use extractor::{
    extract_document_text, ChatCompletion, ConversationAnalyzer, ConversationClient,
    EntityRecognizer, LanguageServiceClient, LopdfExtractor, OpenAiChatClient, PdfTextExtractor,
    UtteranceAnalysis,
};
pub use formatter::{
    document_link, format_extracted, format_record, recommendation, Recommendation,
    DEFAULT_BLOB_BASE_URL,
};
pub use ingest::{discover_pdf_files, ingest_folder, IngestionReport, SkippedPdf};
pub use matcher::CatalogMatcher;
pub use models::{
    categories, CatalogRecord, EntityCandidate, ExtractedEntities, Intent, MatchPhase,
    MatchResult, ResolvedCriteria,
};
pub use orchestrator::{Assistant, AssistantReply, DocumentReply};
pub use query::{QueryNode, TextMatch};
pub use resolver::{best_candidate, resolve, resolve_criteria, resolve_field, UNKNOWN};
pub use store::CatalogStore;
pub use stores::{DataApiStore, InMemoryCatalog};
pub use summary::entity_summary;
