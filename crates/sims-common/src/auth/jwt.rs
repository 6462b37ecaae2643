//! JWT utilities for session tokens
//!
//! Access and refresh tokens are HS256 JWTs whose subject is the identity id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token so two pairs minted in the same second never collide
    pub jti: Uuid,
    pub token_type: TokenType,
    /// Sign-in session the token belongs to
    pub session_id: String,
}

impl Claims {
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    #[must_use]
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }
}

/// Access/refresh pair handed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub session_id: String,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Lifetime of refresh tokens in seconds
    #[must_use]
    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    /// Mint a pair for a new sign-in session
    pub fn generate_token_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        self.generate_token_pair_for_session(user_id, Uuid::new_v4().to_string())
    }

    /// Mint a pair that continues an existing session
    pub fn generate_token_pair_for_session(
        &self,
        user_id: Uuid,
        session_id: String,
    ) -> Result<TokenPair, AppError> {
        let access_token = self.encode_token(user_id, TokenType::Access, &session_id)?;
        let refresh_token = self.encode_token(user_id, TokenType::Refresh, &session_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            session_id,
        })
    }

    fn encode_token(
        &self,
        user_id: Uuid,
        token_type: TokenType,
        session_id: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiry = match token_type {
            TokenType::Access => self.access_token_expiry,
            TokenType::Refresh => self.refresh_token_expiry,
        };

        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            jti: Uuid::new_v4(),
            token_type,
            session_id: session_id.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to encode JWT: {e}")))
    }

    /// Decode and validate signature and expiry
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if claims.is_access_token() {
            Ok(claims)
        } else {
            Err(AppError::InvalidToken)
        }
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if claims.is_refresh_token() {
            Ok(claims)
        } else {
            Err(AppError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough", 900, 604_800)
    }

    #[test]
    fn test_generate_token_pair() {
        let service = create_test_service();
        let pair = service.generate_token_pair(Uuid::new_v4()).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_token_types_are_enforced() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let pair = service.generate_token_pair(user_id).unwrap();

        let claims = service.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.session_id, pair.session_id);
        assert!(service.validate_access_token(&pair.refresh_token).is_err());

        let claims = service.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_pairs_in_same_session_are_distinct() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let first = service.generate_token_pair(user_id).unwrap();
        let second = service
            .generate_token_pair_for_session(user_id, first.session_id.clone())
            .unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        assert!(matches!(
            service.decode_token("invalid.token.here"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new("test-secret-key-that-is-long-enough", -120, -120);
        let pair = service.generate_token_pair(Uuid::new_v4()).unwrap();
        assert!(matches!(
            service.decode_token(&pair.access_token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = create_test_service().generate_token_pair(Uuid::new_v4()).unwrap();
        let other = JwtService::new("a-completely-different-secret-value", 900, 900);
        assert!(other.decode_token(&pair.access_token).is_err());
    }
}
