use std::sync::Arc;

use axum::{
    extract::State,
    http::{self, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{error::AppError, model::CurrentUser, token::invalid_token, AppState};

pub async fn mw_require_auth<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let token = match token {
        Some(token) => token,
        None => {
            warn!(uri = %request.uri(), "Request without bearer token");
            return Err(AppError::Unauthorized("Not authenticated".to_string()));
        }
    };

    let current_user = authenticate(&state, &token).await?;
    debug!(user_id = current_user.id, "Request authenticated");

    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}

/// Verifies `token` and resolves its subject to a stored user. A subject that
/// no longer exists is reported the same way as a bad token.
pub async fn authenticate(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    let user_id = state.tokens.verify(token)?;

    match state.users.get(user_id).await? {
        Some(user) => Ok(CurrentUser {
            id: user.id,
            email: user.email,
        }),
        None => {
            warn!(user_id, "Token subject does not match any user");
            Err(invalid_token())
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
