pub mod claims;
pub mod jwt;
pub mod password;

pub use claims::{Claims, SessionClaims};
pub use jwt::{TokenError, TokenIssuer, SESSION_TTL};
pub use password::PasswordError;
