use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub role: String,
    pub permissions: Vec<String>,
    pub kind: TokenKind,
    pub exp: usize, // Expiration timestamp
}

/// Identity carried by a token.
pub struct TokenSubject<'a> {
    pub user_id: i32,
    pub username: &'a str,
    pub role: &'a str,
    pub permissions: &'a [String],
}

/// Sign a token of the given kind, valid for `ttl_hours`.
pub fn sign(
    subject: &TokenSubject<'_>,
    kind: TokenKind,
    secret: &str,
    ttl_hours: i64,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| anyhow!("token lifetime out of range"))?
        .timestamp();

    let claims = Claims {
        sub: subject.username.to_owned(),
        uid: subject.user_id,
        role: subject.role.to_owned(),
        permissions: subject.permissions.to_vec(),
        kind,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
