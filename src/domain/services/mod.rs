pub mod auth_service;
pub mod availability;
pub mod availability_service;
pub mod booking_flow;
pub mod calendar;
pub mod calendar_controller;
pub mod recovery;
pub mod submission;
pub mod wizard;
