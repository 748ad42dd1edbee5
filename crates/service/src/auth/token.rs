//! Client-side reading of the access token.
//!
//! Only the `exp` claim is read. The signature is not verified here: the
//! server does that on every request, and a forged expiry only changes when
//! the console *thinks* the session ends.

use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;

use super::errors::TokenError;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Read the `exp` claim (unix seconds) from a JWT.
pub fn decode_expiry(token: &str) -> Result<i64, TokenError> {
    let header = decode_header(token)?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims.exp)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        id: String,
        role: String,
        exp: i64,
    }

    /// HS256 token with the given expiry, signed with a key the client never sees.
    pub(crate) fn token_expiring_at(exp: i64) -> String {
        let claims = Claims { id: "u1".into(), role: "admin".into(), exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-side-secret"))
            .expect("encode test token")
    }

    #[test]
    fn reads_exp_without_the_signing_key() {
        let token = token_expiring_at(1_900_000_000);
        assert_eq!(decode_expiry(&token), Ok(1_900_000_000));
    }

    #[test]
    fn expired_tokens_still_decode() {
        let token = token_expiring_at(1_000);
        assert_eq!(decode_expiry(&token), Ok(1_000));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_expiry("not-a-jwt").is_err());
        assert!(decode_expiry("").is_err());
    }

    #[test]
    fn token_without_exp_is_rejected() {
        #[derive(Serialize)]
        struct NoExp {
            sub: String,
        }
        let token = encode(&Header::default(), &NoExp { sub: "x".into() }, &EncodingKey::from_secret(b"k"))
            .expect("encode test token");
        assert!(decode_expiry(&token).is_err());
    }
}
