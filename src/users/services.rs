use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterInput},
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
    validation::validate_registration,
};
use crate::{
    auth::{password, SessionClaims, TokenIssuer, SESSION_TTL},
    error::{AccountError, StoreOp},
};

/// Registration, login and listing over a user store and a token issuer.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<PublicUser>, AccountError> {
        let users = self.store.list().await.map_err(|e| {
            error!(error = %e, "list users failed");
            AccountError::StoreUnavailable(StoreOp::ListUsers, e)
        })?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthResponse, AccountError> {
        if let Err(fields) = validate_registration(&input) {
            warn!(?fields, "registration failed validation");
            return Err(AccountError::InvalidInput(fields));
        }

        // Early exit before paying for a hash; the store still has the final say.
        let existing = self
            .store
            .find_by_email(&input.email)
            .await
            .map_err(|e| AccountError::StoreUnavailable(StoreOp::Signup, e))?;
        if existing.is_some() {
            warn!("email already registered");
            return Err(AccountError::DuplicateAccount);
        }

        let password_hash = password::hash_in_background(input.password)
            .await
            .map_err(AccountError::HashingFailure)?;

        let new_user = NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            image_path: input.image_path,
            places: Vec::new(),
        };
        let user = match self.store.insert(new_user).await {
            Ok(u) => u,
            Err(StoreError::Duplicate) => {
                warn!("email registered concurrently");
                return Err(AccountError::DuplicateAccount);
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(AccountError::StoreUnavailable(StoreOp::Signup, e));
            }
        };

        let response = self.session_for(user)?;
        info!(user_id = %response.user_id, "user registered");
        Ok(response)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> Result<AuthResponse, AccountError> {
        let user = match self.store.find_by_email(&input.email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("login unknown email");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AccountError::StoreUnavailable(StoreOp::Login, e));
            }
        };

        match password::verify_in_background(input.password, user.password_hash.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, "login invalid password");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, user_id = %user.id, "password verification errored");
                return Err(AccountError::InvalidCredentials);
            }
        }

        let response = self.session_for(user)?;
        info!(user_id = %response.user_id, "user logged in");
        Ok(response)
    }

    fn session_for(&self, user: User) -> Result<AuthResponse, AccountError> {
        let session = SessionClaims {
            user_id: user.id,
            email: user.email,
        };
        let token = self.tokens.issue(&session, SESSION_TTL).map_err(|e| {
            error!(error = %e, user_id = %session.user_id, "jwt sign failed");
            AccountError::TokenIssuanceFailure(e)
        })?;
        Ok(AuthResponse {
            user_id: session.user_id,
            email: session.email,
            token,
        })
    }
}
