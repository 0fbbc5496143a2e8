use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Planner,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Planner => "planner",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(UserRole::Client),
            "planner" => Ok(UserRole::Planner),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Caller identity as seen by the server after token verification.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub role: UserRole,
}

/// Signed-in user as held by a client session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub role: UserRole,
    pub access_token: String,
    pub csrf_token: String,
}
