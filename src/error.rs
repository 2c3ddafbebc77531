use thiserror::Error;

/// Errors surfaced by zone preparation and aggregation.
#[derive(Error, Debug)]
pub enum Error {
    /// Zone, hazard or exposure layers are missing or inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Keyword resolution cannot proceed.
    #[error("Keywords not valid: {0}")]
    KeywordsNotValid(String),

    /// Input geometry that cannot be clipped (not merely empty).
    #[error("Geometry error{}: {message}", .feature.map(|id| format!(" (feature {id})")).unwrap_or_default())]
    Geometry { feature: Option<u64>, message: String },

    /// Impact layer is malformed, empty or missing required fields.
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn geometry(feature: Option<u64>, message: impl Into<String>) -> Self {
        Self::Geometry { feature, message: message.into() }
    }
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_message_names_feature() {
        let err = Error::geometry(Some(7), "non-finite coordinate");
        assert_eq!(err.to_string(), "Geometry error (feature 7): non-finite coordinate");
    }

    #[test]
    fn geometry_message_without_feature() {
        let err = Error::geometry(None, "empty ring");
        assert_eq!(err.to_string(), "Geometry error: empty ring");
    }
}
