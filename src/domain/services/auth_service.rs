use crate::config::Config;
use crate::domain::models::auth::{Claims, IssuedToken, TOKEN_AUDIENCE};
use crate::domain::models::user::{User, UserRole};
use crate::error::AppError;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

pub struct AuthService {
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
            .expect("Invalid JWT Public Key PEM");

        Self { config, encoding_key, decoding_key }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<IssuedToken, AppError> {
        self.issue_with_ttl(user, Duration::minutes(ACCESS_TOKEN_TTL_MINUTES))
    }

    /// Signs a token valid for `ttl` from now. A negative `ttl` yields an already expired token.
    pub fn issue_with_ttl(&self, user: &User, ttl: Duration) -> Result<IssuedToken, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + ttl).timestamp().max(0) as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: user.role.as_str().to_string(),
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        Ok(IssuedToken { access_token, csrf_token })
    }

    /// Checks signature, audience, issuer and expiry. An expired token is reported as
    /// `SessionExpired` so clients can tell it apart from a missing login.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[self.config.auth_issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::SessionExpired,
                _ => {
                    tracing::debug!("rejected access token: {}", e);
                    AppError::Unauthorized
                }
            })
    }

    pub fn user_from_claims(claims: &Claims) -> Result<User, AppError> {
        let role: UserRole = claims.role.parse().map_err(|_| AppError::Unauthorized)?;
        Ok(User { id: claims.sub.clone(), role })
    }
}
