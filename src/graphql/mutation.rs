use async_graphql::{Context, Object, Result, ResultExt};

use crate::auth::TokenKeys;
use crate::db::Db;
use crate::error::ApiError;
use crate::graphql::guards::Authenticated;
use crate::models::book::{Book, BookUpdate, NewBook};
use crate::models::review::{NewReview, Review, ReviewUpdate};
use crate::models::user::{Credentials, NewUser, User};
use crate::models::GqlObjectId;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Creates a user account and returns a login token
    pub async fn register_user(&self, ctx: &Context<'_>, new_user: NewUser) -> Result<String> {
        let db = Db::from_ctx(ctx);
        let user = User::register(new_user, db).await.extend()?;

        issue_token(ctx, &user)
    }

    /// Gets a login token on successful login
    pub async fn login_user(&self, ctx: &Context<'_>, credentials: Credentials) -> Result<String> {
        let db = Db::from_ctx(ctx);
        let user = User::login(credentials, db).await.extend()?;

        issue_token(ctx, &user)
    }

    /// Creates a user account and returns it, without issuing a token
    pub async fn add_user(&self, ctx: &Context<'_>, new_user: NewUser) -> Result<User> {
        let db = Db::from_ctx(ctx);
        User::create(new_user, db).await.extend()
    }

    /// Adds a book to the catalog
    #[graphql(guard = "Authenticated")]
    pub async fn add_book(&self, ctx: &Context<'_>, new_book: NewBook) -> Result<Book> {
        let db = Db::from_ctx(ctx);
        Book::create(new_book, db).await.extend()
    }

    /// Updates the given book's fields
    #[graphql(guard = "Authenticated")]
    pub async fn update_book(
        &self,
        ctx: &Context<'_>,
        id: GqlObjectId,
        update: BookUpdate,
    ) -> Result<Book> {
        let db = Db::from_ctx(ctx);
        Book::update(id, update, db).await.extend()
    }

    /// Deletes the given book
    #[graphql(guard = "Authenticated")]
    pub async fn delete_book(&self, ctx: &Context<'_>, id: GqlObjectId) -> Result<bool> {
        let db = Db::from_ctx(ctx);
        Book::delete(id, db).await.extend()
    }

    /// Adds a review for a book
    #[graphql(guard = "Authenticated")]
    pub async fn add_review(&self, ctx: &Context<'_>, new_review: NewReview) -> Result<Review> {
        let db = Db::from_ctx(ctx);
        Review::create(new_review, db).await.extend()
    }

    /// Updates the given review's rating or comment
    #[graphql(guard = "Authenticated")]
    pub async fn update_review(
        &self,
        ctx: &Context<'_>,
        id: GqlObjectId,
        update: ReviewUpdate,
    ) -> Result<Review> {
        let db = Db::from_ctx(ctx);
        Review::update(id, update, db).await.extend()
    }

    /// Deletes the given review
    #[graphql(guard = "Authenticated")]
    pub async fn delete_review(&self, ctx: &Context<'_>, id: GqlObjectId) -> Result<bool> {
        let db = Db::from_ctx(ctx);
        Review::delete(id, db).await.extend()
    }
}

fn issue_token(ctx: &Context<'_>, user: &User) -> Result<String> {
    let keys = ctx.data_unchecked::<TokenKeys>();
    keys.issue(user.id.0).map_err(ApiError::from).extend()
}
