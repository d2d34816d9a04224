//! Error handling for the API.
//!
//! Every failure a resolver can surface maps onto one variant here, and every
//! variant carries a stable machine-readable code that clients receive in the
//! GraphQL error extensions. Messages are for humans; codes are the contract.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// The error enum for all failures surfaced through the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An argument was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No document matched the given identifier or search.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness pre-check found an existing document.
    #[error("{0}")]
    Duplicate(String),

    /// The request lacked a valid bearer token, or the login failed.
    #[error("{0}")]
    Unauthorized(String),

    /// The document store could not be reached or did not answer in time.
    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    /// A signing or hashing backend failed.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The return type for everything that touches the store or the auth stack.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// The stable code surfaced in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Duplicate(_) => "DUPLICATE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_carry_the_stable_code() {
        let error = ApiError::NotFound("no book with id 42".to_owned()).extend();

        assert_eq!(error.message, "no book with id 42");
        let extensions = error.extensions.expect("extensions should be set");
        let extensions = serde_json::to_value(&extensions).unwrap();
        assert_eq!(extensions["code"], serde_json::json!("NOT_FOUND"));
    }
}
