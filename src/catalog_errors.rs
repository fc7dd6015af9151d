//! # Catalog Error Types Module
//!
//! Errors raised while reading the catalog document. None of them is fatal:
//! the loader recovers from every variant by scanning the assets directory.

/// Custom error types for catalog loading
#[derive(Debug, Clone)]
pub enum CatalogError {
    /// Catalog file is missing
    NotFound(String),
    /// Catalog file exists but could not be read
    Read(String),
    /// Catalog file is not valid JSON or not a JSON object
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(msg) => write!(f, "Catalog not found: {msg}"),
            CatalogError::Read(msg) => write!(f, "Catalog read error: {msg}"),
            CatalogError::Parse(msg) => write!(f, "Catalog parse error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}
