//! Bearer token decoding.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Turns a raw bearer token into verified claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// HS256 shared-secret validator.
///
/// The time window lives in `issued_at`/`expires_at` (RFC 3339), not in the
/// registered numeric `exp` claim, so the library's own expiry check is off
/// and `validate_claims` does it instead.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrincipalId, Role};
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use procura_core::TenantId;

    fn mint(secret: &str, expires_in: Duration) -> (String, JwtClaims) {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: PrincipalId::new(),
            tenant_id: TenantId::new(),
            roles: vec![Role::SUPERVISOR],
            issued_at: now - Duration::seconds(5),
            expires_at: now + expires_in,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (token, claims)
    }

    #[test]
    fn valid_token_round_trips_claims() {
        let (token, claims) = mint("s3cret", Duration::minutes(5));
        let decoded = Hs256JwtValidator::new("s3cret")
            .validate(&token, Utc::now())
            .unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn wrong_secret_fails_to_decode() {
        let (token, _) = mint("s3cret", Duration::minutes(5));
        let err = Hs256JwtValidator::new("other")
            .validate(&token, Utc::now())
            .unwrap_err();
        assert!(matches!(err, JwtError::Decode(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let (token, _) = mint("s3cret", Duration::minutes(5));
        let err = Hs256JwtValidator::new("s3cret")
            .validate(&token, Utc::now() + Duration::hours(1))
            .unwrap_err();
        assert!(matches!(
            err,
            JwtError::Claims(TokenValidationError::Expired)
        ));
    }
}
