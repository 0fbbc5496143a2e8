use std::env;
use chrono_tz::Tz;
use crate::domain::services::availability::OverlapPolicy;
use crate::domain::services::recovery::DEFAULT_PENDING_TTL_SECS;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub receipt_dir: String,
    pub calendar_timezone: Tz,
    pub overlap_policy: OverlapPolicy,
    pub api_base_url: String,
    pub pending_booking_dir: Option<String>,
    pub pending_booking_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.wedding-booking.local".to_string()),
            receipt_dir: env::var("RECEIPT_DIR").unwrap_or_else(|_| "./receipts".to_string()),
            calendar_timezone: env::var("CALENDAR_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Manila".to_string())
                .parse()
                .expect("CALENDAR_TIMEZONE must be an IANA timezone"),
            overlap_policy: env::var("PREPARATION_OVERLAP_POLICY")
                .unwrap_or_else(|_| "capacity_first".to_string())
                .parse()
                .expect("PREPARATION_OVERLAP_POLICY must be capacity_first or preparation_first"),
            api_base_url: env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            pending_booking_dir: env::var("PENDING_BOOKING_DIR").ok().filter(|d| !d.is_empty()),
            pending_booking_ttl_secs: env::var("PENDING_BOOKING_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_PENDING_TTL_SECS.to_string())
                .parse()
                .expect("PENDING_BOOKING_TTL_SECS must be a number"),
        }
    }
}
