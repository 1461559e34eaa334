use crate::models::{categories, CatalogRecord, ExtractedEntities};
use crate::resolver::resolve_field;

pub const DEFAULT_BLOB_BASE_URL: &str = "https://tajamarstorage.blob.core.windows.net/articles/";

// Plain concatenation: the stored document ids are the blob names.
pub fn document_link(base_url: &str, document_id: &str) -> String {
    format!("{base_url}{document_id}")
}

pub fn format_record(record: &CatalogRecord) -> String {
    let entities = &record.entities;
    format!(
        "{} {}\nProcesador: {}\nRAM: {}\nGráfica: {}\nAlmacenamiento: {}\nPantalla: {}",
        resolve_field(entities, categories::BRAND),
        resolve_field(entities, categories::MODEL),
        resolve_field(entities, categories::CPU),
        resolve_field(entities, categories::RAM),
        resolve_field(entities, categories::GPU),
        resolve_field(entities, categories::STORAGE),
        resolve_field(entities, categories::SCREEN),
    )
}

pub fn format_extracted(entities: &ExtractedEntities) -> String {
    format!(
        "Especificaciones del ordenador detectado:\n\
         Marca: {}\nModelo: {}\nProcesador: {}\nMemoria RAM: {}\nGráfica: {}",
        resolve_field(entities, categories::BRAND),
        resolve_field(entities, categories::MODEL),
        resolve_field(entities, categories::CPU),
        resolve_field(entities, categories::RAM),
        resolve_field(entities, categories::GPU),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub specs: String,
    pub link: String,
    pub record_id: String,
}

pub fn recommendation(record: &CatalogRecord, blob_base_url: &str) -> Recommendation {
    Recommendation {
        specs: format_record(record),
        link: document_link(blob_base_url, &record.document_id),
        record_id: record
            .id
            .clone()
            .unwrap_or_else(|| record.document_id.clone()),
    }
}
