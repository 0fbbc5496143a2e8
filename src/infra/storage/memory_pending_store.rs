use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use crate::domain::ports::PendingBookingStore;
use crate::error::BookingError;

/// Process-local snapshot storage. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryPendingBookingStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPendingBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, BookingError> {
        self.entries.lock().map_err(|_| BookingError::Storage("pending booking store lock poisoned".into()))
    }
}

#[async_trait]
impl PendingBookingStore for MemoryPendingBookingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BookingError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BookingError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BookingError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
