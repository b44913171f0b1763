use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;

/// What a token may be used for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Auth,
}

impl TokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::Auth => "auth",
        }
    }
}

/// Token payload. There is no `exp`: a token lives until it is removed
/// from the owner's token list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,               // user ID
    pub purpose: TokenPurpose,
    pub iat: usize,              // issued at
    pub jti: Uuid,               // unique per issuance
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    pub fn issue(&self, user_id: Uuid, purpose: TokenPurpose) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            purpose,
            iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
            jti: Uuid::new_v4(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, purpose = ?purpose, "token issued");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, purpose = ?data.claims.purpose, "token validated");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str) -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: "test-aud".into(),
        })
    }

    /// Swaps one character inside the payload segment.
    fn flip_payload_char(token: &str) -> String {
        let at = token.find('.').expect("jwt has segments") + 5;
        let mut chars: Vec<char> = token.chars().collect();
        chars[at] = if chars[at] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let keys = make_keys("dev-secret", "test-issuer");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, TokenPurpose::Auth).expect("issue");
        let claims = keys.validate(&token).expect("validate");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.purpose, TokenPurpose::Auth);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn tokens_for_same_user_are_distinct() {
        let keys = make_keys("dev-secret", "iss");
        let user_id = Uuid::new_v4();
        let a = keys.issue(user_id, TokenPurpose::Auth).expect("issue a");
        let b = keys.issue(user_id, TokenPurpose::Auth).expect("issue b");
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = make_keys("dev-secret", "iss");
        let token = keys.issue(Uuid::new_v4(), TokenPurpose::Auth).expect("issue");
        let tampered = flip_payload_char(&token);
        assert_ne!(tampered, token);
        assert!(keys.validate(&tampered).is_err());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = make_keys("dev-secret", "iss");
        let token = keys.issue(Uuid::new_v4(), TokenPurpose::Auth).expect("issue");
        let sig_start = token.rfind('.').expect("signature segment") + 1;
        let mut chars: Vec<char> = token.chars().collect();
        chars[sig_start] = if chars[sig_start] == 'x' { 'y' } else { 'x' };
        let tampered: String = chars.into_iter().collect();
        assert!(keys.validate(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = make_keys("secret-one", "iss")
            .issue(Uuid::new_v4(), TokenPurpose::Auth)
            .expect("issue");
        assert!(make_keys("secret-two", "iss").validate(&token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let token = make_keys("same-secret", "good-iss")
            .issue(Uuid::new_v4(), TokenPurpose::Auth)
            .expect("issue");
        assert!(make_keys("same-secret", "bad-iss").validate(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = make_keys("dev-secret", "iss");
        for junk in ["", "091283oajdwi", "a.b.c", "not.a.jwt.at.all"] {
            assert!(keys.validate(junk).is_err(), "accepted {junk:?}");
        }
    }

    #[test]
    fn purpose_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenPurpose::Auth).unwrap(), "\"auth\"");
        assert_eq!(TokenPurpose::Auth.as_str(), "auth");
    }
}
