use serde::{Deserialize, Serialize};

pub const TOKEN_AUDIENCE: &str = "wedding-frontend";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://wedding-booking.local/claims/role")]
    pub role: String,

    #[serde(rename = "https://wedding-booking.local/claims/csrf")]
    pub csrf_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub csrf_token: String,
}
