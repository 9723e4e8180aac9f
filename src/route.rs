use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::{handler::*, middleware::mw_require_auth, AppState};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/todos/", post(create_todo))
        .route("/todos/:id", put(update_todo).delete(delete_todo))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users/:id", get(get_user))
        .route("/todos/user/:id", get(list_user_todos))
        .route("/", get(health_checker_handler))
        .with_state(app_state);
    app
}
