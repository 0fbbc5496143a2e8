pub mod sqlite_booking_repo;
pub mod sqlite_package_repo;
pub mod sqlite_package_override_repo;

pub mod postgres_booking_repo;
pub mod postgres_package_repo;
pub mod postgres_package_override_repo;
