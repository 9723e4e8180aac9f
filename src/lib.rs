//! Todo-list HTTP service with email/password registration and bearer-token
//! authentication. Users and todos live in in-memory stores injected through
//! [`AppState`].

use std::sync::Arc;

use chrono::Duration;

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;
pub mod store;
pub mod token;

use config::Config;
use store::{InMemoryTodoStore, InMemoryUserStore, TodoStore, UserStore};
use token::TokenIssuer;

// Struct representing the application state
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub tokens: TokenIssuer,
    pub access_token_ttl: Duration,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, todos: Arc<dyn TodoStore>, config: &Config) -> Self {
        Self {
            users,
            todos,
            tokens: TokenIssuer::from_config(config),
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// State backed by empty in-memory stores.
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryTodoStore::new()),
            config,
        )
    }
}
