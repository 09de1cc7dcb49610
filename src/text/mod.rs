//! Text processing
//!
//! Length-aware segmentation of input text into backend-sized chunks.

pub mod chunker;

pub use chunker::{chunk_text, normalize_whitespace, word_count, Chunk};
