use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_access_token(
        config: &Config,
        user_id: &ObjectId,
        role: Role,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            role,
            exp: now + config.jwt_ttl_secs(),
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
    }

    pub fn verify_token(config: &Config, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::Figment;

    fn config(secret: &str, ttl: &str) -> Config {
        let figment = Figment::new()
            .merge(("mongo_uri", "mongodb://localhost:27017"))
            .merge(("mongo_db", "evently"))
            .merge(("jwt_secret", secret))
            .merge(("jwt_expires_in", ttl))
            .merge(("seed_admin_email", "admin@evently.local"))
            .merge(("seed_admin_password", "Admin@123456"))
            .merge(("seed_admin_name", "Evently Admin"));
        Config::from_figment(&figment).unwrap()
    }

    #[test]
    fn issued_tokens_verify() {
        let config = config("0123456789abcdef", "1h");
        let user_id = ObjectId::new();

        let token = JwtService::generate_access_token(&config, &user_id, Role::Vendor).unwrap();
        let claims = JwtService::verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.role, Role::Vendor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issuer = config("0123456789abcdef", "1h");
        let verifier = config("fedcba9876543210", "1h");

        let token = JwtService::generate_access_token(&issuer, &ObjectId::new(), Role::Admin).unwrap();
        assert!(JwtService::verify_token(&verifier, &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = config("0123456789abcdef", "1h");
        let past = chrono::Utc::now().timestamp() - 7200;
        let claims = Claims {
            sub: ObjectId::new().to_hex(),
            role: Role::Customer,
            exp: past,
            iat: past - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(JwtService::verify_token(&config, &token).is_err());
    }
}
