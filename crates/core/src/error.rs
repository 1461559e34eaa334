use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("document has no readable text: {0}")]
    EmptyDocument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("extraction service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("catalog request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
