//! Spawns simulated users at a fixed rate and aggregates their statistics.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::HttpClient;
use crate::statistics::{RunSummary, Statistics};
use crate::task::{stdout_sink, DiagnosticSink, UserBehavior};
use crate::user::{wait_for_stop, SimulatedUser};
use crate::wait::WaitTime;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one user is required")]
    NoUsers,
    #[error("spawn rate must be a positive number of users per second, got {0}")]
    InvalidSpawnRate(f64),
    #[error("iteration count must be at least one")]
    NoIterations,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub users: usize,
    /// Users started per second.
    pub spawn_rate: f64,
    /// Stop after this long, measured from the start of the run.
    pub run_time: Option<Duration>,
    /// Task executions per user.
    pub iterations: Option<usize>,
    pub wait_time: WaitTime,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            users: 1,
            spawn_rate: 1.0,
            run_time: None,
            iterations: None,
            wait_time: WaitTime::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        self.spawn_interval()?;
        if self.iterations == Some(0) {
            return Err(ConfigError::NoIterations);
        }
        Ok(())
    }

    /// Delay between two user spawns; rates too small to express as a `Duration` are rejected.
    fn spawn_interval(&self) -> Result<Duration, ConfigError> {
        if !self.spawn_rate.is_finite() || self.spawn_rate <= 0.0 {
            return Err(ConfigError::InvalidSpawnRate(self.spawn_rate));
        }
        Duration::try_from_secs_f64(1.0 / self.spawn_rate)
            .map_err(|_| ConfigError::InvalidSpawnRate(self.spawn_rate))
    }
}

pub struct Runner<B> {
    client: HttpClient,
    behavior: Arc<B>,
    config: RunConfig,
    diagnostics: DiagnosticSink,
}

impl<B: UserBehavior> Runner<B> {
    pub fn new(client: HttpClient, behavior: B, config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            behavior: Arc::new(behavior),
            config,
            diagnostics: stdout_sink(),
        })
    }

    /// Redirects diagnostic lines, stdout by default.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Drives the run to completion, or until `true` is sent on `shutdown`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<RunSummary> {
        let start = Instant::now();
        // A run time past the end of the clock means no deadline.
        let deadline = self
            .config
            .run_time
            .and_then(|run_time| start.checked_add(run_time));
        let interval = self.config.spawn_interval()?;
        tracing::info!(
            host = self.client.host(),
            users = self.config.users,
            spawn_rate = self.config.spawn_rate,
            "starting load run"
        );

        let mut tasks = Vec::with_capacity(self.config.users);
        for id in 0..self.config.users {
            if id > 0 {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = wait_for_stop(&mut shutdown, deadline) => {
                        tracing::info!(spawned = id, "run stopped during ramp-up");
                        break;
                    }
                }
            }
            let user = SimulatedUser {
                id,
                client: self.client.clone(),
                behavior: Arc::clone(&self.behavior),
                wait_time: self.config.wait_time,
                iterations: self.config.iterations,
                deadline,
                shutdown: shutdown.clone(),
                diagnostics: Arc::clone(&self.diagnostics),
                rng: SmallRng::seed_from_u64(rand::random()),
            };
            tasks.push(tokio::spawn(user.run()));
            tracing::debug!(user = id, "spawned user");
        }
        let users = tasks.len();
        if users == self.config.users {
            tracing::info!(users, "all users spawned");
        }

        let mut statistics = Statistics::default();
        for t in tasks {
            let user_statistics = t.await.context("Failed to join user task")?;
            statistics.merge(user_statistics)?;
        }
        let elapsed = start.elapsed();
        tracing::info!(
            tasks = statistics.tasks(),
            requests = statistics.total_requests(),
            failures = statistics.total_failures(),
            "load run finished in {elapsed:.2?}"
        );
        Ok(RunSummary {
            users,
            elapsed,
            statistics,
        })
    }
}
