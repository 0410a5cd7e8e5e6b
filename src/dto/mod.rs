use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::models::{Article, Note, User};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleResponse {
    /// Article ID
    pub id: i64,
    pub title: String,
    pub link: String,
    /// ID of the linked note
    pub note: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An article with its note resolved inline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PopulatedArticleResponse {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub note: Option<NoteResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,
    /// Fields submitted with the note
    #[schema(value_type = Object)]
    pub body: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    pub id: i64,
    pub name: String,
    /// IDs of the user's notes, oldest first
    pub notes: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// A user with every note resolved inline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PopulatedUserResponse {
    pub id: i64,
    pub name: String,
    pub notes: Vec<NoteResponse>,
    pub created_at: DateTime<Utc>,
}

/// Form payload of a new note. Any field is accepted and kept as a string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CreateNoteRequest(pub BTreeMap<String, String>);

impl CreateNoteRequest {
    pub fn into_body(self) -> Map<String, Value> {
        self.0
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect()
    }
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            link: article.link,
            note: article.note_id,
            created_at: article.created_at,
        }
    }
}

impl PopulatedArticleResponse {
    pub fn new(article: Article, note: Option<Note>) -> Self {
        Self {
            id: article.id,
            title: article.title,
            link: article.link,
            note: note.map(NoteResponse::from),
            created_at: article.created_at,
        }
    }
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            body: note.body,
            created_at: note.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            notes: user.note_ids,
            created_at: user.created_at,
        }
    }
}

impl PopulatedUserResponse {
    pub fn new(user: User, notes: Vec<Note>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            notes: notes.into_iter().map(NoteResponse::from).collect(),
            created_at: user.created_at,
        }
    }
}
