pub mod document_parser;
pub mod errors;
pub mod events;
pub mod field_extractor;
pub mod models;
pub mod notifier;
pub mod ocr;
pub mod pdf;
pub mod resume_store;
pub mod service;
pub mod settings_store;
