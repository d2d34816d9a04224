use async_graphql::{EmptySubscription, Schema};

use crate::auth::TokenKeys;
use crate::db::Db;
use crate::graphql::mutation::MutationRoot;
use crate::graphql::query::QueryRoot;

pub mod guards;
pub mod mutation;
pub mod query;

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// The raw value of the `Authorization` header, captured once per request
/// and threaded to the guards through request data.
pub struct AuthHeader(pub Option<String>);

pub fn build_schema(db: Db, token_keys: TokenKeys) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(token_keys)
        .finish()
}
