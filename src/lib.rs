pub mod config;
pub mod document; // Fixed-slot ICF template writer
pub mod pipeline; // RAG core: extract → chunk → embed → index → retrieve
pub mod server; // Thin HTTP edge (multipart upload in, ICF out)
