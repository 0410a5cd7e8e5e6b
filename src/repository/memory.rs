use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::Repository;
use crate::{
    error::PersistError,
    models::{Article, NewArticle, Note, User},
};

#[derive(Default)]
struct Collections {
    next_id: i64,
    articles: Vec<Article>,
    notes: Vec<Note>,
    users: Vec<User>,
}

impl Collections {
    const fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store, used when no database is configured.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Collections>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_article(&self, article: NewArticle) -> Result<Article, PersistError> {
        let mut inner = self.inner.write().await;
        let article = Article {
            id: inner.allocate_id(),
            title: article.title,
            link: article.link,
            note_id: None,
            created_at: Utc::now(),
        };
        inner.articles.push(article.clone());
        Ok(article)
    }

    async fn find_articles(&self) -> Result<Vec<Article>, PersistError> {
        Ok(self.inner.read().await.articles.clone())
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>, PersistError> {
        let inner = self.inner.read().await;
        Ok(inner.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn set_article_note(
        &self,
        id: i64,
        note_id: i64,
    ) -> Result<Option<Article>, PersistError> {
        let mut inner = self.inner.write().await;
        Ok(inner.articles.iter_mut().find(|a| a.id == id).map(|article| {
            article.note_id = Some(note_id);
            article.clone()
        }))
    }

    async fn create_note(&self, body: Map<String, Value>) -> Result<Note, PersistError> {
        let mut inner = self.inner.write().await;
        let note = Note {
            id: inner.allocate_id(),
            body,
            created_at: Utc::now(),
        };
        inner.notes.push(note.clone());
        Ok(note)
    }

    async fn find_notes(&self) -> Result<Vec<Note>, PersistError> {
        Ok(self.inner.read().await.notes.clone())
    }

    async fn find_notes_by_ids(&self, ids: &[i64]) -> Result<Vec<Note>, PersistError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.notes.iter().find(|n| n.id == *id).cloned())
            .collect())
    }

    async fn create_user(&self, name: &str) -> Result<User, PersistError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.name == name) {
            return Err(PersistError::DuplicateKey {
                field: "name",
                value: name.to_string(),
            });
        }

        let user = User {
            id: inner.allocate_id(),
            name: name.to_string(),
            note_ids: Vec::new(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_users(&self) -> Result<Vec<User>, PersistError> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, PersistError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.name == name).cloned())
    }

    async fn push_user_note(&self, id: i64, note_id: i64) -> Result<Option<User>, PersistError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.note_ids.push(note_id);
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            link: format!("/{title}"),
        }
    }

    #[tokio::test]
    async fn created_article_has_no_note() {
        let repo = MemoryRepository::new();
        let created = repo.create_article(article("T")).await.unwrap();

        assert_eq!(created.title, "T");
        assert_eq!(created.link, "/T");
        assert_eq!(created.note_id, None);
        assert_eq!(repo.find_article(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn duplicate_articles_are_allowed() {
        let repo = MemoryRepository::new();
        repo.create_article(article("same")).await.unwrap();
        repo.create_article(article("same")).await.unwrap();

        assert_eq!(repo.find_articles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_user_name_is_rejected() {
        let repo = MemoryRepository::new();
        repo.create_user("Ada").await.unwrap();

        let err = repo.create_user("Ada").await.unwrap_err();
        assert!(matches!(err, PersistError::DuplicateKey { field: "name", .. }));
        assert_eq!(repo.find_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updates_of_missing_records_return_none() {
        let repo = MemoryRepository::new();

        assert_eq!(repo.set_article_note(42, 1).await.unwrap(), None);
        assert_eq!(repo.push_user_note(42, 1).await.unwrap(), None);
        assert_eq!(repo.find_article(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn user_notes_keep_append_order() {
        let repo = MemoryRepository::new();
        let user = repo.create_user("Ada").await.unwrap();
        let first = repo.create_note(Map::new()).await.unwrap();
        let second = repo.create_note(Map::new()).await.unwrap();

        repo.push_user_note(user.id, second.id).await.unwrap();
        let updated = repo.push_user_note(user.id, first.id).await.unwrap().unwrap();

        assert_eq!(updated.note_ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn notes_by_ids_follow_requested_order_and_skip_unknown() {
        let repo = MemoryRepository::new();
        let a = repo.create_note(Map::new()).await.unwrap();
        let b = repo.create_note(Map::new()).await.unwrap();

        let found = repo.find_notes_by_ids(&[b.id, 999, a.id]).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert_eq!(repo.find_note(a.id).await.unwrap(), Some(a));
    }
}
