//! Simulated users creating events against the ticketing API.
//!
//! Every user repeatedly runs a [`CreateEventTask`], which posts a fixed
//! event ten times in a row and prints `Failed to create event: <body>` for
//! every response that is not `200 OK`. Between two executions a user pauses
//! for a [`WaitTime`] sampled uniformly between one and three seconds.
pub mod cli;
pub mod client;
pub mod logging;
pub mod runner;
pub mod statistics;
pub mod task;
pub mod wait;

mod user;

pub use crate::client::HttpClient;
pub use crate::runner::{RunConfig, Runner};
pub use crate::statistics::{RunSummary, Statistics};
pub use crate::task::{CreateEventTask, TaskReport, UserBehavior};
pub use crate::wait::WaitTime;
