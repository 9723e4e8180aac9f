use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, PathRejection},
        Path, State,
    },
    response::IntoResponse,
    Extension, Form, Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    model::{normalize_email, CurrentUser, Todo, User},
    schema::{LoginSchema, TokenSchema},
    AppState,
};

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Todo API with Rust, Axum and bearer token authentication";

    let json_response = serde_json::json!({
        "status": "success",
        "message": MESSAGE
    });

    Json(json_response)
}

// Handler for registering a new user
pub async fn register(
    State(data): State<Arc<AppState>>,
    body: Result<Json<User>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(mut user) = body?;

    user.email = normalize_email(&user.email).ok_or_else(|| {
        AppError::Validation(format!("{} is not a valid email address", user.email))
    })?;

    let user_id = user.id;
    data.users.create(user).await?;
    info!(user_id, "User registered");

    Ok(Json(json!({ "message": "User registered" })))
}

// Handler exchanging email and password for an access token
pub async fn login(
    State(data): State<Arc<AppState>>,
    body: Result<Form<LoginSchema>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(body) = body?;

    let user = data
        .users
        .find_by_credentials(&body.username, &body.password)
        .await?
        .ok_or_else(|| {
            warn!("Login rejected");
            AppError::Unauthorized("Incorrect username or password".to_string())
        })?;

    let access_token = data.tokens.issue(user.id, Some(data.access_token_ttl))?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(TokenSchema::bearer(access_token)))
}

// Handler returning a user record, or an empty object when unknown
pub async fn get_user(
    State(data): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;

    let body = match data.users.get(id).await? {
        Some(user) => json!(user),
        None => json!({}),
    };
    Ok(Json(body))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<Todo>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(todo) = body?;

    // Past schedules are accepted as-is.
    if todo.scheduled_for < Utc::now().naive_utc() {
        debug!(todo_id = todo.id, "Todo scheduled in the past");
    }

    data.todos.append(todo.clone()).await?;
    info!(
        todo_id = todo.id,
        owner_id = todo.user_id,
        created_by = current_user.id,
        "Todo created"
    );

    Ok(Json(todo))
}

// Handler listing every Todo owned by a user
pub async fn list_user_todos(
    State(data): State<Arc<AppState>>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(user_id) = user_id?;

    let todos = data.todos.list_by_user(user_id).await?;
    debug!(user_id, results = todos.len(), "Listed todos");

    Ok(Json(todos))
}

// Handler replacing a Todo by ID
pub async fn update_todo(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Todo>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(updated) = body?;

    let todo = data.todos.replace(id, updated).await?;
    info!(todo_id = id, updated_by = current_user.id, "Todo updated");

    Ok(Json(todo))
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    State(data): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;

    let removed = data.todos.remove(id).await?;
    info!(
        todo_id = id,
        removed,
        deleted_by = %current_user.email,
        "Todo delete processed"
    );

    Ok(Json(json!({ "message": "Todo deleted" })))
}
