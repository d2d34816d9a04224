use async_graphql::{InputObject, SimpleObject};
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{self, Db};
use crate::error::{ApiError, ApiResult};
use crate::models::book::Book;
use crate::models::GqlObjectId;

#[derive(SimpleObject, Clone, Serialize, Deserialize)]
pub struct Review {
    /// The review's identifier
    #[serde(rename = "_id")]
    pub id: GqlObjectId,
    /// The book being reviewed
    pub book_id: GqlObjectId,
    /// Who wrote the review
    pub user_id: GqlObjectId,
    /// The rating given to the book
    pub rating: i32,
    /// What the reviewer had to say
    pub comment: String,
    /// When the review was written
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

#[derive(InputObject)]
pub struct NewReview {
    pub book_id: GqlObjectId,
    pub user_id: GqlObjectId,
    pub rating: i32,
    pub comment: String,
    /// Defaults to the current time when omitted
    pub date: Option<DateTime<Utc>>,
}

#[derive(InputObject, Default)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewUpdate {
    pub fn to_patch(&self) -> Document {
        let mut patch = Document::new();
        if let Some(rating) = self.rating {
            patch.insert("rating", rating);
        }
        if let Some(comment) = &self.comment {
            patch.insert("comment", comment);
        }

        patch
    }
}

impl Review {
    pub async fn all(db: &Db) -> ApiResult<Vec<Self>> {
        db::find_all(&db.reviews(), doc! {}).await
    }

    pub async fn create(new_review: NewReview, db: &Db) -> ApiResult<Self> {
        let review = Self {
            id: ObjectId::new().into(),
            book_id: new_review.book_id,
            user_id: new_review.user_id,
            rating: new_review.rating,
            comment: new_review.comment,
            date: new_review.date.unwrap_or_else(Utc::now),
        };
        db::insert_one(&db.reviews(), &review).await?;

        Ok(review)
    }

    pub async fn update(id: GqlObjectId, update: ReviewUpdate, db: &Db) -> ApiResult<Self> {
        let patch = update.to_patch();
        if patch.is_empty() {
            return Err(ApiError::Validation("no fields to update".to_owned()));
        }

        db::update_one(&db.reviews(), doc! { "_id": id.0 }, patch)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no review with id {}", id.hex())))
    }

    pub async fn delete(id: GqlObjectId, db: &Db) -> ApiResult<bool> {
        if db::delete_one(&db.reviews(), doc! { "_id": id.0 }).await? == 0 {
            return Err(ApiError::NotFound(format!("no review with id {}", id.hex())));
        }

        Ok(true)
    }

    /// Reviews for a book picked by id, title, and/or author.
    ///
    /// Title or author terms are resolved to matching books first, then
    /// reviews are filtered by the resulting id set; the two lookups are
    /// independent round trips. An empty result at either step is an error
    /// rather than an empty list.
    pub async fn search(
        book_id: Option<GqlObjectId>,
        title: Option<String>,
        author: Option<String>,
        db: &Db,
    ) -> ApiResult<Vec<Self>> {
        let title = title.filter(|title| !title.is_empty());
        let author = author.filter(|author| !author.is_empty());

        let filter = if title.is_some() || author.is_some() {
            let mut book_filter = Book::search_filter(title.as_deref(), author.as_deref());
            if let Some(id) = book_id {
                book_filter.insert("_id", id.0);
            }

            let books = db::find_all(&db.books(), book_filter).await?;
            if books.is_empty() {
                return Err(ApiError::NotFound("no books matched the search".to_owned()));
            }

            Self::book_set_filter(books.iter().map(|book| book.id.0))
        } else if let Some(id) = book_id {
            doc! { "book_id": id.0 }
        } else {
            return Err(ApiError::Validation(
                "provide a book id, a title, or an author to search by".to_owned(),
            ));
        };

        let reviews = db::find_all(&db.reviews(), filter).await?;
        if reviews.is_empty() {
            return Err(ApiError::NotFound(
                "no reviews matched the search".to_owned(),
            ));
        }

        Ok(reviews)
    }

    fn book_set_filter(book_ids: impl Iterator<Item = ObjectId>) -> Document {
        doc! { "book_id": { "$in": book_ids.collect::<Vec<_>>() } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_set_filter_lists_every_candidate_id() {
        let first = ObjectId::new();
        let second = ObjectId::new();

        let filter = Review::book_set_filter([first, second].into_iter());

        assert_eq!(filter, doc! { "book_id": { "$in": [first, second] } });
    }

    #[test]
    fn patch_contains_only_the_provided_fields() {
        let update = ReviewUpdate {
            rating: Some(4),
            comment: None,
        };

        assert_eq!(update.to_patch(), doc! { "rating": 4 });
        assert!(ReviewUpdate::default().to_patch().is_empty());
    }
}
