use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectOperation {
    Upload,
    Download,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedObjectClaims {
    pub key: String,
    pub op: ObjectOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
    pub exp: i64,
}

/// HS256 signatures for time-limited object URLs.
#[derive(Clone)]
pub struct UrlSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl UrlSigner {
    pub fn new(secret: &str) -> Self {
        let derived = format!("object-storage:{}", secret);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(derived.as_bytes()),
            decoding_key: DecodingKey::from_secret(derived.as_bytes()),
            validation,
        }
    }

    pub fn sign(
        &self,
        key: &str,
        op: ObjectOperation,
        content_type: Option<String>,
        max_bytes: Option<u64>,
        ttl_seconds: i64,
    ) -> Result<(String, i64), AppError> {
        let exp = (Utc::now() + Duration::seconds(ttl_seconds)).timestamp();
        let claims = SignedObjectClaims {
            key: key.to_string(),
            op,
            content_type,
            max_bytes,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Storage(format!("Failed to sign object URL: {}", e)))?;

        Ok((token, exp))
    }

    /// Decodes a token and checks that it grants `expected`.
    pub fn verify(&self, token: &str, expected: ObjectOperation) -> Result<SignedObjectClaims, AppError> {
        let data = decode::<SignedObjectClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Authorization("Invalid or expired signed URL".to_string()))?;

        if data.claims.op != expected {
            return Err(AppError::Authorization(
                "Signed URL does not permit this operation".to_string(),
            ));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_and_verify() {
        let signer = UrlSigner::new(SECRET);
        let (token, exp) = signer
            .sign("employees/a.png", ObjectOperation::Upload, Some("image/png".to_string()), Some(10), 60)
            .unwrap();

        let claims = signer.verify(&token, ObjectOperation::Upload).unwrap();
        assert_eq!(claims.key, "employees/a.png");
        assert_eq!(claims.content_type.as_deref(), Some("image/png"));
        assert_eq!(claims.max_bytes, Some(10));
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_operation_mismatch_is_rejected() {
        let signer = UrlSigner::new(SECRET);
        let (token, _) = signer.sign("a.png", ObjectOperation::Download, None, None, 60).unwrap();

        assert!(matches!(
            signer.verify(&token, ObjectOperation::Upload),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_expired_and_foreign_tokens_are_rejected() {
        let signer = UrlSigner::new(SECRET);
        let (expired, _) = signer.sign("a.png", ObjectOperation::Download, None, None, -30).unwrap();
        assert!(signer.verify(&expired, ObjectOperation::Download).is_err());

        let other = UrlSigner::new("another-secret-another-secret-0000");
        let (foreign, _) = other.sign("a.png", ObjectOperation::Download, None, None, 60).unwrap();
        assert!(signer.verify(&foreign, ObjectOperation::Download).is_err());
    }
}
