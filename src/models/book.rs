use async_graphql::{InputObject, SimpleObject};
use bson::oid::ObjectId;
use bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::db::{self, Db};
use crate::error::{ApiError, ApiResult};
use crate::models::GqlObjectId;

#[derive(SimpleObject, Clone, Serialize, Deserialize)]
pub struct Book {
    /// The book's identifier
    #[serde(rename = "_id")]
    pub id: GqlObjectId,
    /// The book's title
    pub title: String,
    /// Who wrote the book
    pub author: String,
}

#[derive(InputObject)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

#[derive(InputObject, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookUpdate {
    /// The fields actually provided, as a `$set` payload.
    pub fn to_patch(&self) -> Document {
        let mut patch = Document::new();
        if let Some(title) = &self.title {
            patch.insert("title", title);
        }
        if let Some(author) = &self.author {
            patch.insert("author", author);
        }

        patch
    }
}

impl Book {
    pub async fn all(db: &Db) -> ApiResult<Vec<Self>> {
        db::find_all(&db.books(), doc! {}).await
    }

    pub async fn create(new_book: NewBook, db: &Db) -> ApiResult<Self> {
        let book = Self {
            id: ObjectId::new().into(),
            title: new_book.title,
            author: new_book.author,
        };
        db::insert_one(&db.books(), &book).await?;

        Ok(book)
    }

    pub async fn update(id: GqlObjectId, update: BookUpdate, db: &Db) -> ApiResult<Self> {
        let patch = update.to_patch();
        if patch.is_empty() {
            return Err(ApiError::Validation("no fields to update".to_owned()));
        }

        db::update_one(&db.books(), doc! { "_id": id.0 }, patch)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no book with id {}", id.hex())))
    }

    pub async fn delete(id: GqlObjectId, db: &Db) -> ApiResult<bool> {
        if db::delete_one(&db.books(), doc! { "_id": id.0 }).await? == 0 {
            return Err(ApiError::NotFound(format!("no book with id {}", id.hex())));
        }

        Ok(true)
    }

    /// Books whose title or author contains the given text, ignoring case.
    /// An empty result is an error rather than an empty list.
    pub async fn matching(
        title: Option<String>,
        author: Option<String>,
        db: &Db,
    ) -> ApiResult<Vec<Self>> {
        let filter = Self::search_filter(title.as_deref(), author.as_deref());
        let books = db::find_all(&db.books(), filter).await?;

        if books.is_empty() {
            return Err(ApiError::NotFound("no books matched the search".to_owned()));
        }

        Ok(books)
    }

    /// Builds a case-insensitive substring filter over title and/or author.
    /// The search text is escaped, so regex metacharacters match literally.
    pub fn search_filter(title: Option<&str>, author: Option<&str>) -> Document {
        let mut filter = Document::new();
        if let Some(title) = title.filter(|title| !title.is_empty()) {
            filter.insert("title", substring_match(title));
        }
        if let Some(author) = author.filter(|author| !author.is_empty()) {
            filter.insert("author", substring_match(author));
        }

        filter
    }
}

fn substring_match(text: &str) -> Document {
    doc! { "$regex": regex::escape(text), "$options": "i" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_filter_matches_substrings_case_insensitively() {
        let filter = Book::search_filter(Some("dune"), None);

        assert_eq!(
            filter,
            doc! { "title": { "$regex": "dune", "$options": "i" } }
        );
    }

    #[test]
    fn search_filter_escapes_regex_metacharacters() {
        let filter = Book::search_filter(None, Some("K. Dick"));

        assert_eq!(
            filter,
            doc! { "author": { "$regex": "K\\. Dick", "$options": "i" } }
        );
    }

    #[test]
    fn search_filter_ignores_empty_terms() {
        assert_eq!(Book::search_filter(Some(""), None), doc! {});
    }

    #[test]
    fn patch_contains_only_the_provided_fields() {
        let update = BookUpdate {
            title: Some("Dune Messiah".to_owned()),
            author: None,
        };

        assert_eq!(update.to_patch(), doc! { "title": "Dune Messiah" });
        assert!(BookUpdate::default().to_patch().is_empty());
    }
}
