//! Utility module
pub mod text;

pub use self::text::{normalize_text, tokenize};
