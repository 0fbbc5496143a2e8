pub mod availability;
pub mod booking;
pub mod health;
pub mod package;
pub mod package_override;
