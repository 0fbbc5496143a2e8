use std::path::PathBuf;
use async_trait::async_trait;
use tokio::fs;
use tracing::{error, info};
use uuid::Uuid;
use crate::domain::ports::ReceiptStore;
use crate::error::AppError;

/// Writes receipts to a local directory. The reference handed back is the stored file name.
pub struct LocalReceiptStore {
    dir: PathBuf,
}

impl LocalReceiptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn extension_for(file_name: &str, content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => match file_name.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("png") => "png",
            Some("jpg") | Some("jpeg") => "jpg",
            Some("webp") => "webp",
            Some("pdf") => "pdf",
            _ => "bin",
        },
    }
}

#[async_trait]
impl ReceiptStore for LocalReceiptStore {
    async fn save(&self, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Receipt file is empty".into()));
        }

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!("Failed to create receipt directory {:?}: {}", self.dir, e);
            AppError::InternalWithMsg(format!("Receipt storage unavailable: {}", e))
        })?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension_for(file_name, content_type));
        fs::write(self.dir.join(&stored_name), bytes).await.map_err(|e| {
            AppError::InternalWithMsg(format!("Failed to store receipt: {}", e))
        })?;

        info!(receipt = %stored_name, size = bytes.len(), "receipt stored");
        Ok(stored_name)
    }
}
