use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterInput, UsersResponse},
    validation::MAX_IMAGE_BYTES,
};
use crate::{
    error::{not_found, AccountError},
    state::AppState,
    storage::ext_from_mime,
};

/// Room for the image plus the text fields and multipart framing.
const SIGNUP_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).fallback(not_found))
        .route(
            "/api/users/signup",
            post(signup)
                .fallback(not_found)
                .layer(DefaultBodyLimit::max(SIGNUP_BODY_LIMIT)),
        )
        .route("/api/users/login", post(login).fallback(not_found))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AccountError> {
    let users = state.accounts.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

struct ImageUpload {
    content_type: String,
    body: Bytes,
}

#[derive(Default)]
struct SignupForm {
    name: String,
    email: String,
    password: String,
    image: Option<ImageUpload>,
}

async fn read_signup_form(mut mp: Multipart) -> Result<SignupForm, AccountError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        warn!(error = %e, "malformed multipart body");
        AccountError::InvalidInput(vec!["body"])
    };

    let mut form = SignupForm::default();
    while let Some(field) = mp.next_field().await.map_err(malformed)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("name") => form.name = field.text().await.map_err(malformed)?,
            Some("email") => form.email = field.text().await.map_err(malformed)?,
            Some("password") => form.password = field.text().await.map_err(malformed)?,
            Some("image") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await.map_err(malformed)?;
                form.image = Some(ImageUpload { content_type, body });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /api/users/signup (multipart: name, email, password, image)
#[instrument(skip(state, mp))]
pub async fn signup(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AccountError> {
    let mp = mp.map_err(|e| {
        warn!(error = %e, "signup body rejected");
        AccountError::InvalidInput(vec!["body"])
    })?;
    let form = read_signup_form(mp).await?;

    let image = form.image.ok_or(AccountError::InvalidInput(vec!["image"]))?;
    let ext = ext_from_mime(&image.content_type).ok_or_else(|| {
        warn!(content_type = %image.content_type, "unsupported image type");
        AccountError::InvalidInput(vec!["image"])
    })?;
    if image.body.is_empty() || image.body.len() > MAX_IMAGE_BYTES {
        warn!(bytes = image.body.len(), "image size out of range");
        return Err(AccountError::InvalidInput(vec!["image"]));
    }

    let key = format!("{}.{}", Uuid::new_v4(), ext);
    let image_path = state
        .storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .map_err(AccountError::UploadFailure)?;

    let input = RegisterInput {
        name: form.name,
        email: form.email,
        password: form.password,
        image_path: image_path.clone(),
    };

    match state.accounts.register(input).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            if let Err(cleanup) = state.storage.delete_object(&image_path).await {
                warn!(error = %cleanup, %image_path, "could not remove uploaded image");
            }
            Err(e)
        }
    }
}

/// POST /api/users/login { email, password }
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AccountError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "login body rejected");
        AccountError::InvalidInput(vec!["body"])
    })?;
    let response = state.accounts.login(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
