pub mod local_receipt_store;
pub mod file_pending_store;
pub mod memory_pending_store;
