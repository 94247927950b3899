use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use memoria_db::models::UserRow;
use memoria_types::api::{Claims, RegisterRequest, TokenForm, TokenResponse, UserResponse};

use crate::dates::parse_db_datetime;
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, AppStateInner};

/// Validates the bearer JWT and confirms the user still exists and is
/// active. Every owner-facing handler starts here.
pub fn authenticate(state: &AppStateInner, headers: &HeaderMap) -> ApiResult<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let user = state
        .db
        .get_user_by_id(token_data.claims.sub)?
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active {
        return Err(ApiError::Unauthorized);
    }

    Ok(token_data.claims)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(ApiError::Validation("Email no válido".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "La contraseña debe tener al menos 8 caracteres".to_string(),
        ));
    }

    if state.db.email_exists(email)? {
        return Err(ApiError::Duplicate("El email ya está registrado".to_string()));
    }

    // Argon2id with a fresh salt.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = state.db.create_user(email, &password_hash)?;
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", user_id))?;

    Ok((StatusCode::CREATED, Json(user_response(&user))))
}

pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> ApiResult<Json<TokenResponse>> {
    // The `username` form field carries the email.
    let user = state
        .db
        .get_user_by_email(form.username.trim())?
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active {
        return Err(ApiError::Unauthorized);
    }

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash unparseable for user {}: {}", user.id, e))?;
    Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let access_token = create_token(
        &state.config.jwt_secret,
        user.id,
        &user.email,
        state.config.token_expire_minutes,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<UserResponse>> {
    let claims = authenticate(&state, &headers)?;
    let user = state.db.get_user_by_id(claims.sub)?.ok_or(ApiError::Unauthorized)?;
    Ok(Json(user_response(&user)))
}

fn create_token(secret: &str, user_id: i64, email: &str, expire_minutes: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(expire_minutes)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn user_response(user: &UserRow) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        is_active: user.is_active,
        created_at: parse_db_datetime(&user.created_at),
    }
}
