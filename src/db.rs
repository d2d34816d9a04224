//! The gateway to the document store.
//!
//! One client is opened at startup and shared for the life of the process;
//! resolvers reach it through the schema context. Every round trip to the
//! store is bounded by [`STORE_TIMEOUT`], and any transport, driver, or
//! timeout failure surfaces as [`ApiError::StoreUnavailable`].

use std::future::Future;
use std::time::Duration;

use async_graphql::Context;
use bson::oid::ObjectId;
use bson::Document;
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::book::Book;
use crate::models::review::Review;
use crate::models::user::User;

/// Upper bound on any single call into the store.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// A handle on the database, opened once at startup.
pub struct Db {
    database: mongodb::Database,
}

impl Db {
    pub async fn connect(config: &Config) -> ApiResult<Self> {
        let mut options = ClientOptions::parse(&config.mongodb_uri)
            .await
            .map_err(|err| ApiError::StoreUnavailable(err.to_string()))?;
        options.server_selection_timeout = Some(STORE_TIMEOUT);

        let client = Client::with_options(options)
            .map_err(|err| ApiError::StoreUnavailable(err.to_string()))?;

        Ok(Self {
            database: client.database(&config.database),
        })
    }

    pub fn from_ctx<'a>(ctx: &'a Context<'_>) -> &'a Db {
        ctx.data_unchecked::<Db>()
    }

    pub fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub fn books(&self) -> Collection<Book> {
        self.database.collection("books")
    }

    pub fn reviews(&self) -> Collection<Review> {
        self.database.collection("reviews")
    }
}

/// Runs one store call under the fixed deadline.
async fn bounded<T>(call: impl Future<Output = mongodb::error::Result<T>>) -> ApiResult<T> {
    match tokio::time::timeout(STORE_TIMEOUT, call).await {
        Ok(result) => result.map_err(|err| {
            tracing::warn!(error = %err, "store call failed");
            ApiError::StoreUnavailable(err.to_string())
        }),
        Err(_) => {
            tracing::warn!(timeout = ?STORE_TIMEOUT, "store call timed out");
            Err(ApiError::StoreUnavailable(format!(
                "no response within {} seconds",
                STORE_TIMEOUT.as_secs()
            )))
        }
    }
}

pub async fn find_all<T>(collection: &Collection<T>, filter: Document) -> ApiResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    bounded(async move {
        let cursor = collection.find(filter, None).await?;
        cursor.try_collect().await
    })
    .await
}

pub async fn find_one<T>(collection: &Collection<T>, filter: Document) -> ApiResult<Option<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    bounded(collection.find_one(filter, None)).await
}

/// Inserts `document` and returns the identifier it was stored under.
pub async fn insert_one<T>(collection: &Collection<T>, document: &T) -> ApiResult<ObjectId>
where
    T: Serialize,
{
    let result = bounded(collection.insert_one(document, None)).await?;

    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Internal("store returned a non-ObjectId identifier".to_owned()))
}

/// Applies a `$set` patch and returns the updated document, or `None` if
/// nothing matched the filter.
pub async fn update_one<T>(
    collection: &Collection<T>,
    filter: Document,
    patch: Document,
) -> ApiResult<Option<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    bounded(collection.find_one_and_update(filter, bson::doc! { "$set": patch }, options)).await
}

/// Deletes at most one matching document, returning how many were removed.
pub async fn delete_one<T>(collection: &Collection<T>, filter: Document) -> ApiResult<u64> {
    Ok(bounded(collection.delete_one(filter, None)).await?.deleted_count)
}
