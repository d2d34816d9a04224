use async_graphql::{Context, ErrorExtensions, Guard};
use bson::oid::ObjectId;

use crate::auth::TokenKeys;
use crate::error::{ApiError, ApiResult};
use crate::graphql::AuthHeader;

const BEARER_PREFIX: &str = "Bearer ";

/// Requires a valid bearer token on the request.
///
/// Attach per-field; nothing is protected by default.
pub struct Authenticated;

#[async_trait::async_trait]
impl Guard for Authenticated {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        authenticated_subject(ctx)
            .map(|_| ())
            .map_err(|err| err.extend())
    }
}

/// Runs the full check for the current request and returns the token's
/// subject: header present, `Bearer` scheme, signature and expiry valid.
pub fn authenticated_subject(ctx: &Context<'_>) -> ApiResult<ObjectId> {
    let header = ctx.data_opt::<AuthHeader>().and_then(|h| h.0.as_deref());
    let token = bearer_token(header)?;

    let keys = ctx.data_unchecked::<TokenKeys>();
    keys.validate(token).map_err(ApiError::from)
}

fn bearer_token(header: Option<&str>) -> ApiResult<&str> {
    let header = header
        .filter(|header| !header.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

    header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        ApiError::Unauthorized("authorization header must use the Bearer scheme".to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_empty_header_means_missing_token() {
        assert!(matches!(
            bearer_token(None),
            Err(ApiError::Unauthorized(message)) if message.contains("missing")
        ));
        assert!(matches!(
            bearer_token(Some("")),
            Err(ApiError::Unauthorized(message)) if message.contains("missing")
        ));
    }

    #[test]
    fn header_without_the_bearer_scheme_is_rejected() {
        assert!(matches!(
            bearer_token(Some("Basic dXNlcjpwdw==")),
            Err(ApiError::Unauthorized(message)) if message.contains("Bearer")
        ));
    }

    #[test]
    fn the_token_follows_the_scheme() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }
}
