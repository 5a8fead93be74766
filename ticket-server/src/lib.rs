//! The ticketing HTTP API the load generator targets.
//!
//! Events are created with `POST /api/v1/events`, listed with
//! `GET /api/v1/events` and booked with
//! `POST /api/v1/events/{id}/book?tickets=N`. State is kept in memory only.
pub mod app;
pub mod error;
pub mod service;

pub use crate::app::{router, serve, AppState, DEFAULT_MAX_CONCURRENCY};
pub use crate::service::TicketService;
