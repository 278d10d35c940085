//! use mkcert::error::MkcertError;

use thiserror::Error;

/// Represents errors that can occur while issuing certificates.
///
/// Every variant is a synchronous failure of the issuing call. No partial
/// key or certificate is ever returned alongside an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MkcertError {
    /// Caller supplied parameters that cannot produce a certificate.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A PEM key or certificate could not be parsed.
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// The signing operation failed, or the signing key does not fit the issuer.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// RSA key material could not be generated.
    #[error("Key generation error: {0}")]
    GenerationError(String),

    /// The requested validity window cannot be represented.
    #[error("Invalid validity window: {0}")]
    ValidityError(String),

    /// Error during DER or PEM encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, MkcertError>;

impl From<der::Error> for MkcertError {
    /// Converts a `der::Error` into a `MkcertError`.
    fn from(err: der::Error) -> Self {
        MkcertError::EncodingError(err.to_string())
    }
}

impl From<rsa::Error> for MkcertError {
    fn from(err: rsa::Error) -> Self {
        MkcertError::GenerationError(err.to_string())
    }
}

impl From<pem::PemError> for MkcertError {
    fn from(err: pem::PemError) -> Self {
        MkcertError::ParseError(err.to_string())
    }
}
