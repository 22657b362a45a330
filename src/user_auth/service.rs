use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::LedgerRules;
use crate::models::User;
use crate::referral::ReferralService;
use crate::users::{USER_COLUMNS, UserRepository};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Phone number already registered")]
    PhoneTaken,

    #[error("Telegram account already registered")]
    TelegramTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// User Registration Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "user1")]
    pub username: String,
    #[schema(example = "password123")]
    pub password: String,
    #[schema(example = "secpass456")]
    pub security_password: String,
    #[schema(example = "WELCOME")]
    pub invite_code: String,
    #[schema(example = "user1@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
}

/// User Login Request. Exactly one identifier must be supplied.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user1")]
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    #[schema(example = "password123")]
    pub password: String,
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub referral_code: String,
}

pub struct AuthService {
    db: Pool<Postgres>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: Pool<Postgres>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.db
    }

    /// Register a new user. The invite code must reference an existing code;
    /// when the code has a creator, a level-1 referral edge is recorded in the
    /// same transaction as the user insert.
    pub async fn register(
        &self,
        rules: &LedgerRules,
        req: RegisterRequest,
    ) -> Result<AuthResponse, AuthError> {
        validate_registration(&req)?;

        let invite = ReferralService::get_invite_code(&self.db, req.invite_code.trim())
            .await?
            .ok_or(AuthError::InvalidInviteCode)?;

        if UserRepository::get_by_username(&self.db, &req.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }
        if let Some(email) = req.email.as_deref() {
            if UserRepository::get_by_email(&self.db, email).await?.is_some() {
                return Err(AuthError::EmailTaken);
            }
        }
        if let Some(phone) = req.phone.as_deref() {
            if UserRepository::get_by_phone(&self.db, phone).await?.is_some() {
                return Err(AuthError::PhoneTaken);
            }
        }
        if let Some(telegram) = req.telegram.as_deref() {
            if UserRepository::get_by_telegram(&self.db, telegram)
                .await?
                .is_some()
            {
                return Err(AuthError::TelegramTaken);
            }
        }

        let password_hash = hash_password(&req.password)?;
        let security_password_hash = hash_password(&req.security_password)?;

        let mut tx = self.db.begin().await?;

        // Each new user gets their own referral code; regenerate on the
        // unlikely collision with an existing one.
        let mut referral_code = ReferralService::generate_code();
        for _ in 0..5 {
            let taken: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM users WHERE referral_code = $1")
                    .bind(&referral_code)
                    .fetch_optional(&mut *tx)
                    .await?;
            if taken.is_none() {
                break;
            }
            referral_code = ReferralService::generate_code();
        }

        let user: User = sqlx::query_as(&format!(
            r#"INSERT INTO users
                   (username, email, phone, telegram, password_hash,
                    security_password_hash, invite_code, referral_code)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&req.username)
        .bind(req.email.as_deref())
        .bind(req.phone.as_deref())
        .bind(req.telegram.as_deref())
        .bind(&password_hash)
        .bind(&security_password_hash)
        .bind(invite.code.as_str())
        .bind(&referral_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        if let Some(referrer_id) = invite.created_by {
            let rate_percent = rules.referral_commission_rate * Decimal::new(100, 0);
            ReferralService::create_edge(&mut *tx, referrer_id, user.id, rate_percent).await?;
        }

        tx.commit().await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        let token = self.issue_token(user.id)?;
        Ok(AuthResponse {
            token,
            user_id: user.id,
            username: user.username,
            referral_code: user.referral_code,
        })
    }

    /// Login by any one of username / email / phone / telegram.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = if let Some(username) = req.username.as_deref() {
            UserRepository::get_by_username(&self.db, username).await?
        } else if let Some(email) = req.email.as_deref() {
            UserRepository::get_by_email(&self.db, email).await?
        } else if let Some(phone) = req.phone.as_deref() {
            UserRepository::get_by_phone(&self.db, phone).await?
        } else if let Some(telegram) = req.telegram.as_deref() {
            UserRepository::get_by_telegram(&self.db, telegram).await?
        } else {
            return Err(AuthError::Validation(
                "A username, email, phone or telegram identifier is required".to_string(),
            ));
        };

        let user = user.ok_or(AuthError::InvalidCredentials)?;
        verify_hash(&req.password, &user.password_hash)
            .then_some(())
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.issue_token(user.id)?;
        Ok(AuthResponse {
            token,
            user_id: user.id,
            username: user.username,
            referral_code: user.referral_code,
        })
    }

    /// Check the secondary password used to confirm sensitive operations.
    pub async fn verify_security_password(
        &self,
        user_id: i64,
        supplied: &str,
    ) -> Result<bool, AuthError> {
        let user = UserRepository::get_by_id(&self.db, user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(verify_hash(supplied, &user.security_password_hash))
    }

    /// Generate a JWT for a user id, valid for 24 hours.
    pub fn issue_token(&self, user_id: i64) -> Result<String, AuthError> {
        encode_token(&self.jwt_secret, user_id)
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode_token(&self.jwt_secret, token)
    }
}

fn encode_token(secret: &str, user_id: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .unwrap_or(now)
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

/// Insert the bootstrap operator account if missing. Used at startup; the
/// role comes from the caller so configuration stays the single source of
/// admin identity.
pub async fn seed_admin_user(
    pool: &Pool<Postgres>,
    username: &str,
    password: &str,
    security_password: &str,
    role: i16,
) -> Result<i64, AuthError> {
    let password_hash = hash_password(password)?;
    let security_password_hash = hash_password(security_password)?;
    let referral_code = ReferralService::generate_code();

    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO users
               (username, password_hash, security_password_hash, referral_code, role)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING id"#,
    )
    .bind(username)
    .bind(&password_hash)
    .bind(&security_password_hash)
    .bind(&referral_code)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Translate a unique-constraint violation raised by the user insert into the
/// matching conflict error. The pre-insert existence checks give friendly
/// errors on the common path, but two concurrent registrations can both pass
/// them; the database constraint is the authority.
fn map_unique_violation(e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            if let Some(taken) = db.constraint().and_then(taken_error_for_constraint) {
                return taken;
            }
        }
    }
    AuthError::Database(e)
}

fn taken_error_for_constraint(constraint: &str) -> Option<AuthError> {
    match constraint {
        "users_username_key" => Some(AuthError::UsernameTaken),
        "users_email_key" => Some(AuthError::EmailTaken),
        "users_phone_key" => Some(AuthError::PhoneTaken),
        "users_telegram_key" => Some(AuthError::TelegramTaken),
        _ => None,
    }
}

fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_hash(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    let username = req.username.trim();
    if username.len() < 3 || username.len() > 50 {
        return Err(AuthError::Validation(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    if req.password.len() < 6 {
        return Err(AuthError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if req.security_password.len() < 6 {
        return Err(AuthError::Validation(
            "Security password must be at least 6 characters".to_string(),
        ));
    }
    if req.invite_code.trim().is_empty() {
        return Err(AuthError::Validation("Invite code is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            password: "password123".to_string(),
            security_password: "secpass456".to_string(),
            invite_code: "WELCOME".to_string(),
            email: None,
            phone: None,
            telegram: None,
        }
    }

    #[test]
    fn test_validate_registration_ok() {
        assert!(validate_registration(&register_request()).is_ok());
    }

    #[test]
    fn test_validate_registration_short_username() {
        let mut req = register_request();
        req.username = "ab".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username must be between 3 and 50 characters"
        );
    }

    #[test]
    fn test_validate_registration_short_password() {
        let mut req = register_request();
        req.password = "12345".to_string();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn test_validate_registration_missing_invite_code() {
        let mut req = register_request();
        req.invite_code = "   ".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert_eq!(err.to_string(), "Invite code is required");
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_hash("password123", &hash));
        assert!(!verify_hash("wrong", &hash));
    }

    #[test]
    fn test_verify_hash_garbage_input() {
        assert!(!verify_hash("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let token = encode_token("test-secret", 42).unwrap();
        let claims = decode_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let token = encode_token("secret-a", 7).unwrap();
        assert!(decode_token("secret-b", &token).is_err());
    }

    #[test]
    fn test_taken_error_for_constraint() {
        assert!(matches!(
            taken_error_for_constraint("users_username_key"),
            Some(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            taken_error_for_constraint("users_email_key"),
            Some(AuthError::EmailTaken)
        ));
        assert!(matches!(
            taken_error_for_constraint("users_phone_key"),
            Some(AuthError::PhoneTaken)
        ));
        assert!(matches!(
            taken_error_for_constraint("users_telegram_key"),
            Some(AuthError::TelegramTaken)
        ));
        assert!(taken_error_for_constraint("users_pkey").is_none());
    }
}
