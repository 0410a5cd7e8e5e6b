use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_postgres::{Client, NoTls, Row, error::SqlState};

use super::{Repository, embedded::migrations};
use crate::{
    error::PersistError,
    models::{Article, NewArticle, Note, User},
};

const ARTICLE_COLUMNS: &str = "id, title, link, note_id, created_at";
const NOTE_COLUMNS: &str = "id, body, created_at";
const USER_COLUMNS: &str = "id, name, notes, created_at";

pub struct PgRepository {
    client: Client,
}

impl PgRepository {
    pub async fn new(database_dsn: &str) -> Result<Self, PersistError> {
        let (client, con) = tokio_postgres::connect(database_dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self { client })
    }

    pub async fn migrate(&mut self) -> Result<(), PersistError> {
        let migrations_report = migrations::runner().run_async(&mut self.client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }
}

fn article_from_row(row: &Row) -> Article {
    Article {
        id: row.get("id"),
        title: row.get("title"),
        link: row.get("link"),
        note_id: row.get("note_id"),
        created_at: row.get("created_at"),
    }
}

fn note_from_row(row: &Row) -> Note {
    let body = match row.get::<_, Value>("body") {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Note {
        id: row.get("id"),
        body,
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        note_ids: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_article(&self, article: NewArticle) -> Result<Article, PersistError> {
        let row = self
            .client
            .query_one(
                &format!(
                    "INSERT INTO articles (title, link) VALUES ($1, $2) RETURNING {ARTICLE_COLUMNS}"
                ),
                &[&article.title, &article.link],
            )
            .await?;

        Ok(article_from_row(&row))
    }

    async fn find_articles(&self) -> Result<Vec<Article>, PersistError> {
        let rows = self
            .client
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id"),
                &[],
            )
            .await?;

        Ok(rows.iter().map(article_from_row).collect())
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>, PersistError> {
        let row = self
            .client
            .query_opt(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"),
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(article_from_row))
    }

    async fn set_article_note(
        &self,
        id: i64,
        note_id: i64,
    ) -> Result<Option<Article>, PersistError> {
        let row = self
            .client
            .query_opt(
                &format!("UPDATE articles SET note_id = $1 WHERE id = $2 RETURNING {ARTICLE_COLUMNS}"),
                &[&note_id, &id],
            )
            .await?;

        Ok(row.as_ref().map(article_from_row))
    }

    async fn create_note(&self, body: Map<String, Value>) -> Result<Note, PersistError> {
        let body = Value::Object(body);
        let row = self
            .client
            .query_one(
                &format!("INSERT INTO notes (body) VALUES ($1) RETURNING {NOTE_COLUMNS}"),
                &[&body],
            )
            .await?;

        Ok(note_from_row(&row))
    }

    async fn find_notes(&self) -> Result<Vec<Note>, PersistError> {
        let rows = self
            .client
            .query(&format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY id"), &[])
            .await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn find_notes_by_ids(&self, ids: &[i64]) -> Result<Vec<Note>, PersistError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_param = ids.to_vec();
        let rows = self
            .client
            .query(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ANY($1)"),
                &[&ids_param],
            )
            .await?;

        let mut by_id: HashMap<i64, Note> = rows
            .iter()
            .map(note_from_row)
            .map(|note| (note.id, note))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn create_user(&self, name: &str) -> Result<User, PersistError> {
        let row = self
            .client
            .query_one(
                &format!("INSERT INTO users (name) VALUES ($1) RETURNING {USER_COLUMNS}"),
                &[&name],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    PersistError::DuplicateKey {
                        field: "name",
                        value: name.to_string(),
                    }
                } else {
                    PersistError::from(e)
                }
            })?;

        Ok(user_from_row(&row))
    }

    async fn find_users(&self) -> Result<Vec<User>, PersistError> {
        let rows = self
            .client
            .query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"), &[])
            .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, PersistError> {
        let row = self
            .client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1"),
                &[&name],
            )
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn push_user_note(&self, id: i64, note_id: i64) -> Result<Option<User>, PersistError> {
        let row = self
            .client
            .query_opt(
                &format!(
                    "UPDATE users SET notes = array_append(notes, $1::BIGINT) WHERE id = $2 RETURNING {USER_COLUMNS}"
                ),
                &[&note_id, &id],
            )
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}
