use async_graphql::{Context, Object, Result, ResultExt};

use crate::db::Db;
use crate::models::book::Book;
use crate::models::review::Review;
use crate::models::user::User;
use crate::models::GqlObjectId;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    pub async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let db = Db::from_ctx(ctx);
        User::all(db).await.extend()
    }

    pub async fn books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        let db = Db::from_ctx(ctx);
        Book::all(db).await.extend()
    }

    pub async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let db = Db::from_ctx(ctx);
        Review::all(db).await.extend()
    }

    /// Books whose title or author contains the given text, ignoring case
    pub async fn find_books(
        &self,
        ctx: &Context<'_>,
        title: Option<String>,
        author: Option<String>,
    ) -> Result<Vec<Book>> {
        let db = Db::from_ctx(ctx);
        Book::matching(title, author, db).await.extend()
    }

    /// Reviews for a book picked by id, title, and/or author
    pub async fn find_reviews(
        &self,
        ctx: &Context<'_>,
        book_id: Option<GqlObjectId>,
        title: Option<String>,
        author: Option<String>,
    ) -> Result<Vec<Review>> {
        let db = Db::from_ctx(ctx);
        Review::search(book_id, title, author, db).await.extend()
    }
}
