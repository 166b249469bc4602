//! The shared error taxonomy.

/// Errors shared by every nestdb backend and the engine.
///
/// Input-validation errors (`InvalidKey`, `InvalidValue`, `InvalidOperator`,
/// `InvalidArgument`) are raised before any load/mutate/save is attempted, so
/// a failed operation never leaves partial side effects behind. Transport
/// failures from a remote store surface as `Store` with the underlying
/// message; they are not retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller key is empty or otherwise unusable.
    #[error("invalid key: {message}")]
    InvalidKey { message: String },

    /// The caller value is the absent sentinel (null) or non-finite.
    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    /// An unrecognized math operator token.
    #[error("invalid math operator: '{token}'")]
    InvalidOperator { token: String },

    /// A path or array operation hit an incompatible existing value.
    #[error("target type mismatch: {message}")]
    TargetType { message: String },

    /// A required read did not resolve.
    #[error("no value found for key '{key}'")]
    NotFound { key: String },

    /// A sample size exceeded the record population.
    #[error("sample size {requested} exceeds record count {available}")]
    Range { requested: usize, available: usize },

    /// A search or filter argument is missing or empty.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// File I/O failure from the file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure from a remote store, propagated as-is.
    #[error("store error: {message}")]
    Store { message: String },
}

impl Error {
    /// Shorthand for an `InvalidKey` error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Error::InvalidKey {
            message: message.into(),
        }
    }

    /// Shorthand for a `TargetType` error.
    pub fn target_type(message: impl Into<String>) -> Self {
        Error::TargetType {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let e = Error::InvalidKey {
            message: "key must not be empty".to_string(),
        };
        assert!(e.to_string().contains("key must not be empty"));

        let e = Error::InvalidOperator {
            token: "^".to_string(),
        };
        assert!(e.to_string().contains("'^'"));

        let e = Error::Range {
            requested: 3,
            available: 2,
        };
        assert!(e.to_string().contains("3"));
        assert!(e.to_string().contains("2"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::other("disk gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn json_error_converts() {
        let bad = serde_json::from_str::<serde_json::Value>("{oops");
        let e: Error = bad.unwrap_err().into();
        assert!(matches!(e, Error::Json(_)));
    }
}
