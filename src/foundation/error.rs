/// Convenience result type used across datajoin.
pub type DataJoinResult<T> = Result<T, DataJoinError>;

/// Top-level error taxonomy used by the load, config and output layers.
///
/// Engine-local conditions (missing metrics, duplicate ids, out-of-domain years, a driver that
/// is already running) are resolved in place and never surface through this type.
#[derive(thiserror::Error, Debug)]
pub enum DataJoinError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Dataset contents that cannot be turned into records at all.
    #[error("data error: {0}")]
    Data(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DataJoinError {
    /// Build a [`DataJoinError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DataJoinError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Build a [`DataJoinError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
