//! JWT claim inspection for session bookkeeping.
//!
//! The client never holds the signing secret, so tokens are decoded without
//! signature verification. The result is only used to decide whether a
//! stored token is worth sending; the backend remains the authority.

use crate::errors::{ApiError, ApiResult};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Claims the backend puts in its access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username
    #[serde(default)]
    pub sub: String,
    /// Token expiration timestamp
    pub exp: i64,
    /// Token issued at timestamp
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Decodes a token's payload without checking its signature or expiry.
    pub fn decode_unverified(token: &str) -> ApiResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ApiError::invalid_response(format!("Token decoding failed: {}", e)))
    }

    /// Check if token has expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

/// True when the token decodes and its expiry lies in the future.
pub fn is_token_valid(token: &str) -> bool {
    Claims::decode_unverified(token)
        .map(|claims| !claims.is_expired())
        .unwrap_or(false)
}
