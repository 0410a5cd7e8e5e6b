use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    dto::{
        ArticleResponse, CreateNoteRequest, NoteResponse, PopulatedArticleResponse,
        PopulatedUserResponse, UserResponse,
    },
    error::ErrorResponse,
    service::ScraperService,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        scrape,
        get_all_articles,
        get_one_article,
        add_article_note,
        get_all_notes,
        get_all_users,
        submit_note,
        get_populated_users
    ),
    components(schemas(
        ArticleResponse,
        PopulatedArticleResponse,
        NoteResponse,
        UserResponse,
        PopulatedUserResponse,
        CreateNoteRequest,
        ErrorResponse
    )),
    tags(
        (name = "articles", description = "Scraped articles"),
        (name = "notes", description = "Notes and the default user")
    )
)]
pub struct ApiDoc;

// Bodies that are not form-encoded become an empty note.
fn note_payload(form: Result<Form<CreateNoteRequest>, FormRejection>) -> CreateNoteRequest {
    form.map_or_else(
        |rejection| {
            tracing::debug!("ignoring note payload: {}", rejection);
            CreateNoteRequest::default()
        },
        |Form(request)| request,
    )
}

pub fn router(service: Arc<ScraperService>) -> Router {
    Router::new()
        .route("/scrape", get(scrape))
        .route("/articles", get(get_all_articles))
        .route(
            "/articles/{id}",
            get(get_one_article).post(add_article_note),
        )
        .route("/notes", get(get_all_notes))
        .route("/user", get(get_all_users))
        .route("/submit", post(submit_note))
        .route("/populateduser", get(get_populated_users))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/scrape",
    responses(
        (status = 200, description = "`Scrape Complete`, or an ErrorResponse if fetching or storing failed", body = String, content_type = "text/plain")
    ),
    tag = "articles"
)]
#[debug_handler]
pub async fn scrape(State(service): State<Arc<ScraperService>>) -> Response {
    match service.scrape().await {
        Ok(count) => {
            tracing::info!("scrape stored {} articles", count);
            (StatusCode::OK, "Scrape Complete").into_response()
        }
        Err(e) => {
            tracing::error!("failed to scrape articles: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/articles",
    responses(
        (status = 200, description = "List of all articles", body = Vec<ArticleResponse>)
    ),
    tag = "articles"
)]
#[debug_handler]
pub async fn get_all_articles(State(service): State<Arc<ScraperService>>) -> Response {
    match service.get_all_articles().await {
        Ok(articles) => (StatusCode::OK, Json(articles)).into_response(),
        Err(e) => {
            tracing::error!("failed to get article entries: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(
        ("id" = String, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Article with its note inline, or null if not found", body = PopulatedArticleResponse)
    ),
    tag = "articles"
)]
#[debug_handler]
pub async fn get_one_article(
    State(service): State<Arc<ScraperService>>,
    Path(id): Path<String>,
) -> Response {
    match service.get_one_article(&id).await {
        Ok(article) => (StatusCode::OK, Json(article)).into_response(),
        Err(e) => {
            tracing::error!("failed to get article entry: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/articles/{id}",
    params(
        ("id" = String, Path, description = "Article ID")
    ),
    request_body(content = CreateNoteRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Article linked to the new note, or null if not found", body = ArticleResponse)
    ),
    tag = "articles"
)]
#[debug_handler]
pub async fn add_article_note(
    State(service): State<Arc<ScraperService>>,
    Path(id): Path<String>,
    form: Result<Form<CreateNoteRequest>, FormRejection>,
) -> Response {
    match service.add_article_note(&id, note_payload(form)).await {
        Ok(article) => (StatusCode::OK, Json(article)).into_response(),
        Err(e) => {
            tracing::error!("failed to attach note to article: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "List of all notes", body = Vec<NoteResponse>)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<ScraperService>>) -> Response {
    match service.get_all_notes().await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => {
            tracing::error!("failed to get note entries: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "List of all users", body = Vec<UserResponse>)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_users(State(service): State<Arc<ScraperService>>) -> Response {
    match service.get_all_users().await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => {
            tracing::error!("failed to get user entries: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/submit",
    request_body(content = CreateNoteRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Default user with the new note appended", body = UserResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn submit_note(
    State(service): State<Arc<ScraperService>>,
    form: Result<Form<CreateNoteRequest>, FormRejection>,
) -> Response {
    match service.submit_note(note_payload(form)).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => {
            tracing::error!("failed to submit note: {}", e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/populateduser",
    responses(
        (status = 200, description = "List of all users with their notes inline", body = Vec<PopulatedUserResponse>)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_populated_users(State(service): State<Arc<ScraperService>>) -> Response {
    match service.get_populated_users().await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => {
            tracing::error!("failed to get populated users: {}", e);
            e.into_response()
        }
    }
}
