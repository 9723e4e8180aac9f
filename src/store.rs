use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::{
    error::AppError,
    model::{Todo, User},
};

/// Storage for registered users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts `user` keyed by its own id. Fails when the email is already
    /// taken; an existing record with the same id is overwritten.
    async fn create(&self, user: User) -> Result<(), AppError>;
    async fn get(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AppError>;
}

/// Storage for todo items, kept in insertion order
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn append(&self, todo: Todo) -> Result<(), AppError>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Todo>, AppError>;
    /// Replaces the first todo whose id is `id` with `todo`.
    async fn replace(&self, id: i64, todo: Todo) -> Result<Todo, AppError>;
    /// Drops every todo whose id is `id`, returning how many were removed.
    async fn remove(&self, id: i64) -> Result<usize, AppError>;
}

/// In-memory user store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn create(&self, user: User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            warn!(email = %user.email, "Email already registered");
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        if users.insert(user.id, user).is_some() {
            warn!("Existing user record overwritten by registration");
        }
        debug!(total_users = users.len(), "User stored");
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    #[instrument(skip(self, password))]
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        let found = users
            .values()
            .find(|user| user.email == email && user.password == password)
            .cloned();

        debug!(matched = found.is_some(), "Credential lookup finished");
        Ok(found)
    }
}

/// In-memory todo store backed by a vector
#[derive(Default)]
pub struct InMemoryTodoStore {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn snapshot(&self) -> Vec<Todo> {
        self.todos.read().await.clone()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    #[instrument(skip(self, todo), fields(todo_id = todo.id, user_id = todo.user_id))]
    async fn append(&self, todo: Todo) -> Result<(), AppError> {
        let mut todos = self.todos.write().await;
        todos.push(todo);
        debug!(total_todos = todos.len(), "Todo appended");
        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Todo>, AppError> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .filter(|todo| todo.user_id == user_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, todo))]
    async fn replace(&self, id: i64, todo: Todo) -> Result<Todo, AppError> {
        let mut todos = self.todos.write().await;
        match todos.iter_mut().find(|existing| existing.id == id) {
            Some(slot) => {
                *slot = todo.clone();
                debug!("Todo replaced");
                Ok(todo)
            }
            None => {
                debug!("No todo to replace");
                Err(AppError::NotFound("Todo not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: i64) -> Result<usize, AppError> {
        let mut todos = self.todos.write().await;
        let before = todos.len();
        todos.retain(|todo| todo.id != id);

        let removed = before - todos.len();
        debug!(removed, "Todo removal finished");
        Ok(removed)
    }
}
