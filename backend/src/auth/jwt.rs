//! JWT token issuance and validation
//!
//! Session tokens are signed HS256 with pre-computed keys and carry the
//! tenant and role claims. Validity is fixed at one week from issuance.

use anyhow::Result;
use chrono::{Duration, Utc};
use crm_platform_shared::UserRole;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Fixed session-token validity window: one week.
pub const TOKEN_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Session claims
///
/// `enterprise` is the owning tenant's id and is null exactly when the
/// role is `MASTER`. `jti` is minted fresh on every issuance; it is
/// carried for future revocation support and not checked against any
/// blocklist today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub enterprise: Option<String>,
    pub iss: String,
    pub aud: String,
    /// Unique token id
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// JWT service for token operations
///
/// Uses pre-computed keys to avoid expensive key derivation on every
/// request; construct once at startup and store in AppState.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    issuer: Arc<str>,
    audience: Arc<str>,
}

impl JwtService {
    pub fn new(secret: &str, issuer: &str, audience: &str) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            issuer: Arc::from(issuer),
            audience: Arc::from(audience),
        }
    }

    /// Issue a signed session token for an account.
    ///
    /// `enterprise_id` must be present exactly when the role requires an
    /// enterprise; the claim serializes as an explicit null for MASTER.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
        enterprise_id: Option<Uuid>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(TOKEN_VALIDITY_SECS);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            enterprise: enterprise_id.map(|id| id.to_string()),
            iss: self.issuer.to_string(),
            aud: self.audience.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, self.keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))
    }

    /// Validate a token's signature, expiry, issuer, and audience, and
    /// return its claims. Fails loudly on any mismatch or malformed input.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_ref()]);
        validation.set_audience(&[self.audience.as_ref()]);

        let token_data = decode::<Claims>(token, self.keys.decoding(), &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const ISS: &str = "crm-platform-api";
    const AUD: &str = "crm-platform-clients";

    fn create_test_service() -> JwtService {
        JwtService::new(SECRET, ISS, AUD)
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let enterprise_id = Uuid::new_v4();

        let token = service
            .issue(user_id, "a@x.com", UserRole::ClientAdmin, Some(enterprise_id))
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, UserRole::ClientAdmin);
        assert_eq!(claims.enterprise, Some(enterprise_id.to_string()));
        assert_eq!(claims.iss, ISS);
        assert_eq!(claims.aud, AUD);
    }

    #[test]
    fn test_validity_window_is_one_week() {
        let service = create_test_service();
        let token = service
            .issue(Uuid::new_v4(), "a@x.com", UserRole::Master, None)
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, TOKEN_VALIDITY_SECS);
    }

    #[test]
    fn test_master_token_has_null_enterprise() {
        let service = create_test_service();
        let token = service
            .issue(Uuid::new_v4(), "root@platform.com", UserRole::Master, None)
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.role, UserRole::Master);
        assert!(claims.enterprise.is_none());
    }

    #[test]
    fn test_jti_is_fresh_per_issuance() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let a = service
            .issue(user_id, "a@x.com", UserRole::Master, None)
            .unwrap();
        let b = service
            .issue(user_id, "a@x.com", UserRole::Master, None)
            .unwrap();

        let jti_a = service.validate(&a).unwrap().jti;
        let jti_b = service.validate(&b).unwrap().jti;
        assert_ne!(jti_a, jti_b);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let service = create_test_service();
        let token = service
            .issue(Uuid::new_v4(), "a@x.com", UserRole::Master, None)
            .unwrap();

        // Flip the last signature byte
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(service.validate(&tampered).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = create_test_service();
        let now = Utc::now().timestamp();

        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@x.com".to_string(),
            role: UserRole::ClientViewer,
            enterprise: Some(Uuid::new_v4().to_string()),
            iss: ISS.to_string(),
            aud: AUD.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 2 * TOKEN_VALIDITY_SECS,
            exp: now - TOKEN_VALIDITY_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = JwtService::new(SECRET, "another-issuer", AUD);
        let service = create_test_service();

        let token = other
            .issue(Uuid::new_v4(), "a@x.com", UserRole::Master, None)
            .unwrap();
        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = create_test_service();
        assert!(service.validate("invalid.token.here").is_err());
        assert!(service.validate("").is_err());
    }
}
