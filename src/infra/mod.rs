// Adapters for the extraction ports and the export collaborator

pub mod text_extractor;
pub mod gemini_extractor;
pub mod csv_export;
