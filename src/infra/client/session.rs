use std::sync::RwLock;
use crate::domain::models::user::SessionUser;
use crate::domain::ports::AuthContext;

/// Signed-in state of the booking client.
#[derive(Default)]
pub struct ClientSession {
    user: RwLock<Option<SessionUser>>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user: SessionUser) {
        if let Ok(mut current) = self.user.write() {
            *current = Some(user);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut current) = self.user.write() {
            *current = None;
        }
    }
}

impl AuthContext for ClientSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.read().ok().and_then(|u| u.clone())
    }
}
