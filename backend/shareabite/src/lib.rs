//! ShareABite backend: surplus-food listings moving from request to
//! volunteer pickup to distribution, plus verified monetary donations.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive [`api::build_router`] directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod lifecycle;
pub mod mailer;
pub mod models;
pub mod notify;
pub mod payments;
pub mod relay;
pub mod workflow;
