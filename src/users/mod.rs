use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory_repo;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

pub use memory_repo::MemoryUserStore;
pub use repo::{PgUserStore, StoreError, UserStore};
pub use services::AccountService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
