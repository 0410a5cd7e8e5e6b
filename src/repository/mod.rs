//! Storage for articles, notes and users.

mod embedded;
mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    error::PersistError,
    models::{Article, NewArticle, Note, User},
};

/// Operations the handlers need from a store.
///
/// Lookups that match nothing return `Ok(None)`; updates of a missing record
/// are a no-op that also returns `Ok(None)`. Lists are in insertion order.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_article(&self, article: NewArticle) -> Result<Article, PersistError>;

    async fn find_articles(&self) -> Result<Vec<Article>, PersistError>;

    async fn find_article(&self, id: i64) -> Result<Option<Article>, PersistError>;

    /// Point an article at a note, returning the updated article.
    async fn set_article_note(
        &self,
        id: i64,
        note_id: i64,
    ) -> Result<Option<Article>, PersistError>;

    async fn create_note(&self, body: Map<String, Value>) -> Result<Note, PersistError>;

    async fn find_notes(&self) -> Result<Vec<Note>, PersistError>;

    /// Notes with the given ids, in the order of `ids`. Unknown ids are skipped.
    async fn find_notes_by_ids(&self, ids: &[i64]) -> Result<Vec<Note>, PersistError>;

    async fn find_note(&self, id: i64) -> Result<Option<Note>, PersistError> {
        Ok(self.find_notes_by_ids(&[id]).await?.into_iter().next())
    }

    /// Fails with [`PersistError::DuplicateKey`] if the name is taken.
    async fn create_user(&self, name: &str) -> Result<User, PersistError>;

    async fn find_users(&self) -> Result<Vec<User>, PersistError>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, PersistError>;

    /// Append a note id to a user's notes, returning the updated user.
    async fn push_user_note(&self, id: i64, note_id: i64) -> Result<Option<User>, PersistError>;
}

/// Stand-in for a database that could not be reached at startup.
pub struct Unavailable;

#[async_trait]
impl Repository for Unavailable {
    async fn create_article(&self, _article: NewArticle) -> Result<Article, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_articles(&self) -> Result<Vec<Article>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_article(&self, _id: i64) -> Result<Option<Article>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn set_article_note(
        &self,
        _id: i64,
        _note_id: i64,
    ) -> Result<Option<Article>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn create_note(&self, _body: Map<String, Value>) -> Result<Note, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_notes(&self) -> Result<Vec<Note>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_notes_by_ids(&self, _ids: &[i64]) -> Result<Vec<Note>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn create_user(&self, _name: &str) -> Result<User, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_users(&self) -> Result<Vec<User>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn find_user_by_name(&self, _name: &str) -> Result<Option<User>, PersistError> {
        Err(PersistError::Unavailable)
    }

    async fn push_user_note(&self, _id: i64, _note_id: i64) -> Result<Option<User>, PersistError> {
        Err(PersistError::Unavailable)
    }
}
