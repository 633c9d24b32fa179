/// Convenience result type used across kasu.
pub type KasuResult<T> = Result<T, KasuError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum KasuError {
    /// Configuration outside its documented range.
    #[error("validation error: {0}")]
    Validation(String),

    /// A motion period that is negative or not finite.
    ///
    /// A period of exactly zero is not an error; it maps to [`crate::Period::Static`].
    #[error("degenerate motion period for `{field}`: {secs}")]
    DegenerateMotionPeriod {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The rejected value in seconds.
        secs: f64,
    },

    /// The drawing surface could not be acquired or a raster operation failed.
    #[error("surface error: {0}")]
    Surface(String),

    /// The encoder/muxer failed to start, rejected a frame, or failed to finalize.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing configuration documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KasuError {
    /// Build a [`KasuError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KasuError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`KasuError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`KasuError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
