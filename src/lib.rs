//! User accounts service: signup with a profile image, login, and listing,
//! with Argon2 password hashes and stateless JWT session tokens.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod users;
