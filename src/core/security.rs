use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Payload of the session cookie. Identity comes from the external
/// provider; the role is re-read from the users table on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) uid: String,
    pub(crate) email: String,
    #[serde(rename = "nama")]
    pub(crate) name: String,
    pub(crate) role: UserRole,
    pub(crate) exp: i64,
}

pub(crate) fn create_session_token(
    user: &User,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let expire = OffsetDateTime::now_utc()
        + expires_in.unwrap_or_else(|| session_lifetime(settings));

    let claims = SessionClaims {
        uid: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role(),
        exp: expire.unix_timestamp(),
    };

    encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

pub(crate) fn verify_session_token(
    token: &str,
    settings: &Settings,
) -> Result<SessionClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.required_spec_claims.insert("exp".to_string());

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::JwtDecoding)
}

pub(crate) fn session_lifetime(settings: &Settings) -> Duration {
    Duration::minutes(settings.security().session_expire_minutes as i64)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::UserProfile;
    use crate::test_support;

    fn teacher() -> User {
        let now = primitive_now_utc();
        User {
            id: "guru-1".to_string(),
            email: "guru@sekolah.test".to_string(),
            name: "Bu Sari".to_string(),
            profile: UserProfile::Guru { subject_ids: vec![], homeroom_class_ids: vec![] },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn session_token_roundtrip() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token =
            create_session_token(&teacher(), &settings, Some(Duration::minutes(1))).expect("token");
        let claims = verify_session_token(&token, &settings).expect("claims");

        assert_eq!(claims.uid, "guru-1");
        assert_eq!(claims.name, "Bu Sari");
        assert_eq!(claims.role, UserRole::Guru);
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let token = create_session_token(&teacher(), &settings, Some(Duration::minutes(-5)))
            .expect("token");

        assert!(verify_session_token(&token, &settings).is_err());
    }

    #[test]
    fn claims_use_nama_on_the_wire() {
        let claims = SessionClaims {
            uid: "u".to_string(),
            email: "e".to_string(),
            name: "Ani".to_string(),
            role: UserRole::Siswa,
            exp: 0,
        };
        let json = serde_json::to_value(&claims).expect("json");
        assert_eq!(json["nama"], "Ani");
        assert_eq!(json["role"], "siswa");
    }
}
