pub mod auth;
pub mod availability;
pub mod booking;
pub mod booking_form;
pub mod package;
pub mod package_override;
pub mod pending_booking;
pub mod user;
