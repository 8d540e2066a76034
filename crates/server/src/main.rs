use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::FormRejection, Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use board_api::{
    create_post, dispatch_action, list_board_posts, list_board_titles, list_boards, load_post,
    post_route, unknown_failure, update_post, ActionOutcome, AdminSecret, ApiContext,
    LoaderOutcome,
};
use shared::{
    domain::{Board, BoardId, Post, PostTitle},
    error::{ApiError, ErrorCode},
    protocol::{ActionForm, ActionResponse, NewPostForm, UpdatePostForm},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let admin_secret = AdminSecret::new(settings.admin_password);
    if !admin_secret.is_configured() {
        warn!("ADMIN_PASSWORD is empty; post deletion and comment moderation are disabled");
    }
    let api = ApiContext {
        storage,
        admin_secret,
    };

    let app = build_router(Arc::new(AppState { api }), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/boards", get(http_list_boards))
        .route(
            "/boards/:board_id/posts",
            get(http_list_posts).post(http_create_post),
        )
        .route("/boards/:board_id/titles", get(http_list_titles))
        .route("/posts/:post_id", get(http_load_post).post(http_post_action))
        .route("/posts/:post_id/update", post(http_update_post))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_list_boards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Board>>, HttpError> {
    let boards = list_boards(&state.api).await.map_err(http_error)?;
    Ok(Json(boards))
}

async fn http_list_posts(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i64>,
) -> Result<Json<Vec<Post>>, HttpError> {
    let posts = list_board_posts(&state.api, BoardId(board_id))
        .await
        .map_err(http_error)?;
    Ok(Json(posts))
}

async fn http_list_titles(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i64>,
) -> Result<Json<Vec<PostTitle>>, HttpError> {
    let titles = list_board_titles(&state.api, BoardId(board_id))
        .await
        .map_err(http_error)?;
    Ok(Json(titles))
}

async fn http_create_post(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<i64>,
    Form(form): Form<NewPostForm>,
) -> Result<Redirect, HttpError> {
    let post_id = create_post(&state.api, BoardId(board_id), form)
        .await
        .map_err(http_error)?;
    Ok(Redirect::to(&post_route(post_id)))
}

async fn http_load_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Response, HttpError> {
    match load_post(&state.api, &post_id).await.map_err(http_error)? {
        LoaderOutcome::Found(loaded) => Ok(Json(loaded).into_response()),
        LoaderOutcome::Redirect(to) => Ok(Redirect::to(&to).into_response()),
    }
}

async fn http_post_action(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    form: Result<Form<ActionForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => action_response(dispatch_action(&state.api, &post_id, form).await),
        Err(rejection) => form_rejection_response(&post_id, rejection),
    }
}

async fn http_update_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    form: Result<Form<UpdatePostForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => action_response(update_post(&state.api, &post_id, form).await),
        Err(rejection) => form_rejection_response(&post_id, rejection),
    }
}

// Oversized bodies keep their 413; every other undecodable form is treated
// like a missing field.
fn form_rejection_response(post_id: &str, rejection: FormRejection) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return rejection.into_response();
    }
    debug!(post_id, reason = %rejection.body_text(), "undecodable action form");
    action_response(ActionOutcome::Message(unknown_failure()))
}

fn action_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Redirect(to) => Redirect::to(&to).into_response(),
        ActionOutcome::Message(message) => Json(ActionResponse { message }).into_response(),
    }
}

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
