use async_graphql::{InputObject, SimpleObject};
use bson::doc;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::db::{self, Db};
use crate::error::{ApiError, ApiResult};
use crate::models::GqlObjectId;

#[derive(SimpleObject, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user's identifier
    #[serde(rename = "_id")]
    pub id: GqlObjectId,
    /// The user's login name, which must be unique
    pub username: String,
    /// The user's email address
    pub email: String,

    #[graphql(skip)]
    pub pass_hash: String,
}

#[derive(InputObject)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(InputObject)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl User {
    pub async fn all(db: &Db) -> ApiResult<Vec<Self>> {
        db::find_all(&db.users(), doc! {}).await
    }

    pub async fn with_username_opt(username: &str, db: &Db) -> ApiResult<Option<Self>> {
        db::find_one(&db.users(), doc! { "username": username }).await
    }

    /// Hashes the password and stores the new user, returning the stored
    /// document.
    pub async fn create(new_user: NewUser, db: &Db) -> ApiResult<Self> {
        if new_user.username.trim().is_empty() {
            return Err(ApiError::Validation("username cannot be empty".to_owned()));
        }

        let user = Self {
            id: ObjectId::new().into(),
            username: new_user.username,
            email: new_user.email,
            pass_hash: hash_password(&new_user.password)?,
        };
        db::insert_one(&db.users(), &user).await?;

        Ok(user)
    }

    /// Like [`create`](Self::create), but refuses usernames that are already
    /// taken. The existence check and the insert are two separate round
    /// trips, so concurrent registrations of the same name can still race.
    pub async fn register(new_user: NewUser, db: &Db) -> ApiResult<Self> {
        if new_user.username.trim().is_empty() {
            return Err(ApiError::Validation("username cannot be empty".to_owned()));
        }

        if Self::with_username_opt(&new_user.username, db).await?.is_some() {
            return Err(ApiError::Duplicate(format!(
                "username {} is already taken",
                new_user.username
            )));
        }

        Self::create(new_user, db).await
    }

    /// Looks the user up by name and checks the password against the stored
    /// digest. The error does not say which of the two was wrong.
    pub async fn login(credentials: Credentials, db: &Db) -> ApiResult<Self> {
        let user = Self::with_username_opt(&credentials.username, db)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid username or password".to_owned()))?;

        if !verify_password(&credentials.password, &user.pass_hash) {
            return Err(ApiError::Unauthorized(
                "invalid username or password".to_owned(),
            ));
        }

        Ok(user)
    }
}
