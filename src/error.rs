//! Crate-wide error type
//! Only I/O-facing seams return these; classification, merging, detection and
//! combo generation degrade to documented defaults instead.

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum AsoError {
    // Rule data
    #[error("Rule load failed: {0}")]
    RuleLoadError(String),
    #[error("Rule parse failed: {0}")]
    RuleParseError(String),

    // Pattern compilation
    #[error("Regex compilation failed: {0}")]
    RegexCompileError(#[from] RegexError),

    // Network
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Serialization
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("MessagePack encode/decode failed: {0}")]
    MsgPackError(String),

    // Basics
    #[error("IO operation failed: {0}")]
    IoError(#[from] IoError),
    #[error("URL parse failed: {0}")]
    UrlError(#[from] UrlParseError),
}

/// Crate-wide result alias
pub type AsoResult<T> = Result<T, AsoError>;
