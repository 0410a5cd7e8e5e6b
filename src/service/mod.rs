use crate::{
    dto::{
        ArticleResponse, CreateNoteRequest, NoteResponse, PopulatedArticleResponse,
        PopulatedUserResponse, UserResponse,
    },
    error::{AppError, PersistError},
    models::Note,
    repository::Repository,
    scrape::{Extractor, PageSource},
};

use futures::future::try_join_all;
use tokio::sync::OnceCell;

use std::{collections::HashMap, sync::Arc};

pub struct ScraperService {
    repo: Arc<dyn Repository>,
    source: Arc<dyn PageSource>,
    extractor: Extractor,
    default_user_name: String,
    default_user_id: OnceCell<i64>,
}

impl ScraperService {
    pub fn new(
        repo: Arc<dyn Repository>,
        source: Arc<dyn PageSource>,
        extractor: Extractor,
        default_user_name: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            source,
            extractor,
            default_user_name: default_user_name.into(),
            default_user_id: OnceCell::new(),
        }
    }

    /// Id of the user that submitted notes go to, creating it on first use.
    pub async fn default_user_id(&self) -> Result<i64, PersistError> {
        self.default_user_id
            .get_or_try_init(|| self.ensure_default_user())
            .await
            .copied()
    }

    async fn ensure_default_user(&self) -> Result<i64, PersistError> {
        match self.repo.create_user(&self.default_user_name).await {
            Ok(user) => {
                tracing::info!("Created default user '{}' ({})", user.name, user.id);
                Ok(user.id)
            }
            Err(PersistError::DuplicateKey { .. }) => {
                let user = self
                    .repo
                    .find_user_by_name(&self.default_user_name)
                    .await?
                    .ok_or_else(|| PersistError::MissingDefaultUser(self.default_user_name.clone()))?;
                tracing::info!("Using existing default user '{}' ({})", user.name, user.id);
                Ok(user.id)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the page and store one article per extracted link.
    ///
    /// Returns the number of articles created. Stops at the first failed insert.
    pub async fn scrape(&self) -> Result<usize, AppError> {
        let html = self.source.fetch().await?;
        let links = self.extractor.extract(&html);
        tracing::debug!("extracted {} links", links.len());

        let created = try_join_all(
            links
                .into_iter()
                .map(|link| self.repo.create_article(link.into())),
        )
        .await?;

        Ok(created.len())
    }

    pub async fn get_all_articles(&self) -> Result<Vec<ArticleResponse>, AppError> {
        let articles = self.repo.find_articles().await?;
        Ok(articles.into_iter().map(ArticleResponse::from).collect())
    }

    pub async fn get_one_article(
        &self,
        id: &str,
    ) -> Result<Option<PopulatedArticleResponse>, AppError> {
        let Some(article) = self.repo.find_article(parse_id(id)?).await? else {
            return Ok(None);
        };

        let note = match article.note_id {
            Some(note_id) => self.repo.find_note(note_id).await?,
            None => None,
        };

        Ok(Some(PopulatedArticleResponse::new(article, note)))
    }

    /// Create a note and link it to the article, returning the updated article.
    pub async fn add_article_note(
        &self,
        id: &str,
        request: CreateNoteRequest,
    ) -> Result<Option<ArticleResponse>, AppError> {
        let id = parse_id(id)?;
        let note = self.repo.create_note(request.into_body()).await?;
        let article = self.repo.set_article_note(id, note.id).await?;

        Ok(article.map(ArticleResponse::from))
    }

    pub async fn get_all_notes(&self) -> Result<Vec<NoteResponse>, AppError> {
        let notes = self.repo.find_notes().await?;
        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }

    pub async fn get_all_users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repo.find_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Create a note and append it to the default user's notes.
    pub async fn submit_note(
        &self,
        request: CreateNoteRequest,
    ) -> Result<Option<UserResponse>, AppError> {
        let user_id = self.default_user_id().await?;
        let note = self.repo.create_note(request.into_body()).await?;
        let user = self.repo.push_user_note(user_id, note.id).await?;

        Ok(user.map(UserResponse::from))
    }

    pub async fn get_populated_users(&self) -> Result<Vec<PopulatedUserResponse>, AppError> {
        let users = self.repo.find_users().await?;

        let mut note_ids: Vec<i64> = users
            .iter()
            .flat_map(|user| user.note_ids.iter().copied())
            .collect();
        note_ids.sort_unstable();
        note_ids.dedup();

        let notes: HashMap<i64, Note> = self
            .repo
            .find_notes_by_ids(&note_ids)
            .await?
            .into_iter()
            .map(|note| (note.id, note))
            .collect();

        Ok(users
            .into_iter()
            .map(|user| {
                let user_notes = user
                    .note_ids
                    .iter()
                    .filter_map(|id| notes.get(id).cloned())
                    .collect();
                PopulatedUserResponse::new(user, user_notes)
            })
            .collect())
    }
}

fn parse_id(raw: &str) -> Result<i64, PersistError> {
    raw.parse::<i64>()
        .map_err(|_| PersistError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        models::{Article, NewArticle, User},
        repository::{MemoryRepository, Unavailable},
        scrape::StaticPage,
    };

    /// Memory store that counts note lookups.
    #[derive(Default)]
    struct CountingRepository {
        inner: MemoryRepository,
        note_lookups: AtomicUsize,
    }

    #[async_trait]
    impl Repository for CountingRepository {
        async fn create_article(&self, article: NewArticle) -> Result<Article, PersistError> {
            self.inner.create_article(article).await
        }

        async fn find_articles(&self) -> Result<Vec<Article>, PersistError> {
            self.inner.find_articles().await
        }

        async fn find_article(&self, id: i64) -> Result<Option<Article>, PersistError> {
            self.inner.find_article(id).await
        }

        async fn set_article_note(
            &self,
            id: i64,
            note_id: i64,
        ) -> Result<Option<Article>, PersistError> {
            self.inner.set_article_note(id, note_id).await
        }

        async fn create_note(&self, body: Map<String, Value>) -> Result<Note, PersistError> {
            self.inner.create_note(body).await
        }

        async fn find_notes(&self) -> Result<Vec<Note>, PersistError> {
            self.inner.find_notes().await
        }

        async fn find_notes_by_ids(&self, ids: &[i64]) -> Result<Vec<Note>, PersistError> {
            self.note_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_notes_by_ids(ids).await
        }

        async fn create_user(&self, name: &str) -> Result<User, PersistError> {
            self.inner.create_user(name).await
        }

        async fn find_users(&self) -> Result<Vec<User>, PersistError> {
            self.inner.find_users().await
        }

        async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, PersistError> {
            self.inner.find_user_by_name(name).await
        }

        async fn push_user_note(
            &self,
            id: i64,
            note_id: i64,
        ) -> Result<Option<User>, PersistError> {
            self.inner.push_user_note(id, note_id).await
        }
    }

    fn service_with(repo: Arc<dyn Repository>, html: &str) -> ScraperService {
        ScraperService::new(
            repo,
            Arc::new(StaticPage(html.to_string())),
            Extractor::new("article h4").unwrap(),
            "ShaToya Jones",
        )
    }

    #[tokio::test]
    async fn default_user_is_created_once() {
        let repo = Arc::new(MemoryRepository::new());
        let service = service_with(repo.clone(), "");

        let first = service.default_user_id().await.unwrap();
        let second = service.default_user_id().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.find_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_default_user_is_reused_after_restart() {
        let repo = Arc::new(MemoryRepository::new());
        let existing = repo.create_user("ShaToya Jones").await.unwrap();

        let service = service_with(repo.clone(), "");

        assert_eq!(service.default_user_id().await.unwrap(), existing.id);
        assert_eq!(repo.find_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn populated_users_share_one_note_lookup() {
        let repo = Arc::new(CountingRepository::default());
        let ada = repo.create_user("Ada").await.unwrap();
        let grace = repo.create_user("Grace").await.unwrap();
        let mut body = Map::new();
        body.insert("text".to_string(), Value::String("shared".to_string()));
        let shared = repo.create_note(body).await.unwrap();
        let own = repo.create_note(Map::new()).await.unwrap();
        repo.push_user_note(ada.id, shared.id).await.unwrap();
        repo.push_user_note(ada.id, own.id).await.unwrap();
        repo.push_user_note(grace.id, shared.id).await.unwrap();
        repo.push_user_note(grace.id, 999).await.unwrap();

        let service = service_with(repo.clone(), "");
        let users = service.get_populated_users().await.unwrap();

        assert_eq!(repo.note_lookups.load(Ordering::SeqCst), 1);
        let ada_notes: Vec<i64> = users[0].notes.iter().map(|n| n.id).collect();
        let grace_notes: Vec<i64> = users[1].notes.iter().map(|n| n.id).collect();
        assert_eq!(ada_notes, vec![shared.id, own.id]);
        assert_eq!(grace_notes, vec![shared.id]);
        assert_eq!(users[1].notes[0].body["text"], "shared");
    }

    #[tokio::test]
    async fn scrape_stores_every_link() {
        let repo = Arc::new(MemoryRepository::new());
        let service = service_with(
            repo.clone(),
            r#"<article><h4><a href="/a">A</a></h4><h4><a href="/b">B</a></h4></article>"#,
        );

        assert_eq!(service.scrape().await.unwrap(), 2);

        let titles: Vec<String> = repo
            .find_articles()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"A".to_string()));
        assert!(titles.contains(&"B".to_string()));
    }

    #[tokio::test]
    async fn scrape_without_matches_creates_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let service = service_with(repo.clone(), "<p>nothing here</p>");

        assert_eq!(service.scrape().await.unwrap(), 0);
        assert!(repo.find_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_id_is_a_persist_error() {
        let service = service_with(Arc::new(MemoryRepository::new()), "");

        let err = service.get_one_article("not-an-id").await.unwrap_err();
        assert_eq!(err.name(), "PersistError");
        assert_eq!(err.to_string(), "invalid id 'not-an-id'");
    }

    #[tokio::test]
    async fn unavailable_store_surfaces_as_persist_error() {
        let service = service_with(
            Arc::new(Unavailable),
            r#"<article><h4><a href="/a">A</a></h4></article>"#,
        );

        let err = service.scrape().await.unwrap_err();
        assert_eq!(err.name(), "PersistError");

        let err = service.submit_note(CreateNoteRequest::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "store is unavailable");
    }
}
