use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a session token asserts about its holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
}

/// JWT payload as it goes over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid, // user ID
    pub email: String,
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl Claims {
    pub fn session(&self) -> SessionClaims {
        SessionClaims {
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}
