//! Error types for velomap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VelomapError {
    // Data source errors
    #[error("Failed to fetch {source_name}: {reason}")]
    DataFetch { source_name: String, reason: String },

    // CRS errors
    #[error("Unknown CRS: {context}")]
    UnknownCrs { context: String },

    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: String, found: String },

    #[error("Projection failed: {0}")]
    Projection(String),

    // Caller errors
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("No data for {category}")]
    NoDataForCategory { category: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VelomapError {
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        VelomapError::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    pub fn data_fetch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        VelomapError::DataFetch { source_name: source_name.into(), reason: reason.into() }
    }

    pub fn no_data(category: impl Into<String>) -> Self {
        VelomapError::NoDataForCategory { category: category.into() }
    }

    /// Whether the caller may fall back to previously cached data
    pub fn is_data_fetch(&self) -> bool {
        matches!(self, VelomapError::DataFetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, VelomapError>;
