//! Error types for boundary value conversion.

use thiserror::Error;

/// Errors converting raw SDK values into typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Connection status discriminant outside the known range
    #[error("unknown connect status: {0}")]
    UnknownStatus(i32),

    /// Property discriminant outside the known range for its kind
    #[error("unknown {kind} property: {raw}")]
    UnknownProperty {
        /// Which property family was being converted
        kind: &'static str,
        /// The raw discriminant
        raw: u32,
    },
}
