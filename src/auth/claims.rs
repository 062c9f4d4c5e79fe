use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Access token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,                 // user ID
    pub exp: usize,                // expires at (unix timestamp)
    pub aud: String,               // audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,       // issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

pub fn verify_access_token(
    cfg: &JwtConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(std::slice::from_ref(&cfg.audience));
    if let Some(issuer) = &cfg.issuer {
        validation.set_issuer(std::slice::from_ref(issuer));
    }
    let decoding = DecodingKey::from_secret(cfg.secret.as_bytes());
    Ok(decode::<Claims>(token, &decoding, &validation)?.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;

    fn cfg() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            audience: "authenticated".into(),
            issuer: None,
        }
    }

    fn token(secret: &str, aud: &str, exp_offset: i64) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let claims = Claims {
            sub,
            exp: (OffsetDateTime::now_utc().unix_timestamp() + exp_offset) as usize,
            aud: aud.into(),
            iss: Some("https://project.supabase.co/auth/v1".into()),
            email: Some("cook@example.com".into()),
            role: Some("authenticated".into()),
        };
        let t = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (sub, t)
    }

    #[test]
    fn accepts_valid_token() {
        let (sub, t) = token("test-secret", "authenticated", 600);
        let claims = verify_access_token(&cfg(), &t).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.email.as_deref(), Some("cook@example.com"));
    }

    #[test]
    fn rejects_wrong_secret_audience_and_expired() {
        let (_, t) = token("other-secret", "authenticated", 600);
        assert!(verify_access_token(&cfg(), &t).is_err());

        let (_, t) = token("test-secret", "anon", 600);
        assert!(verify_access_token(&cfg(), &t).is_err());

        let (_, t) = token("test-secret", "authenticated", -3600);
        assert!(verify_access_token(&cfg(), &t).is_err());
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let mut c = cfg();
        c.issuer = Some("https://elsewhere.example/auth/v1".into());
        let (_, t) = token("test-secret", "authenticated", 600);
        assert!(verify_access_token(&c, &t).is_err());

        c.issuer = Some("https://project.supabase.co/auth/v1".into());
        assert!(verify_access_token(&c, &t).is_ok());
    }
}
