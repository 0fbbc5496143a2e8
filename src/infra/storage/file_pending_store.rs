use std::io::ErrorKind;
use std::path::PathBuf;
use async_trait::async_trait;
use tokio::fs;
use crate::domain::ports::PendingBookingStore;
use crate::error::BookingError;

/// One file per key under a directory, surviving restarts of the client process.
pub struct FilePendingBookingStore {
    dir: PathBuf,
}

impl FilePendingBookingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

fn storage_error(action: &str, e: std::io::Error) -> BookingError {
    BookingError::Storage(format!("Failed to {} pending booking: {}", action, e))
}

#[async_trait]
impl PendingBookingStore for FilePendingBookingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BookingError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BookingError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| storage_error("prepare", e))?;
        fs::write(self.path_for(key), value).await.map_err(|e| storage_error("write", e))
    }

    async fn delete(&self, key: &str) -> Result<(), BookingError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("delete", e)),
        }
    }
}
