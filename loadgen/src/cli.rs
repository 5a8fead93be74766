//! Command line and environment configuration of the `loadgen` binary.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use crate::runner::RunConfig;
use crate::task::REQUESTS_PER_TASK;
use crate::wait::WaitTime;

pub const DEFAULT_HOST: &str = "http://localhost:8000";

/// Simulates users creating events against the ticketing API.
#[derive(Debug, Parser)]
#[command(name = "loadgen", version)]
pub struct Cli {
    /// Base URI of the target service
    #[arg(long, env = "LOADGEN_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Number of simulated users
    #[arg(short, long, env = "LOADGEN_USERS", default_value_t = 1)]
    pub users: usize,

    /// Users started per second
    #[arg(short = 'r', long, env = "LOADGEN_SPAWN_RATE", default_value_t = 1.0)]
    pub spawn_rate: f64,

    /// Stop after this long, e.g. `90s` or `5m`; runs until Ctrl-C when absent
    #[arg(short = 't', long, env = "LOADGEN_RUN_TIME", value_parser = humantime::parse_duration)]
    pub run_time: Option<Duration>,

    /// Task executions per user
    #[arg(long, env = "LOADGEN_ITERATIONS")]
    pub iterations: Option<usize>,

    /// Shortest pause between two tasks of a user, in seconds
    #[arg(long, default_value_t = WaitTime::DEFAULT_MIN_SECS)]
    pub wait_min: f64,

    /// Longest pause between two tasks of a user, in seconds
    #[arg(long, default_value_t = WaitTime::DEFAULT_MAX_SECS)]
    pub wait_max: f64,

    /// Requests sent by one task execution
    #[arg(long, default_value_t = REQUESTS_PER_TASK)]
    pub requests_per_task: usize,

    /// Per-request timeout, e.g. `30s`
    #[arg(long, value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,
}

impl Cli {
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        let wait_time =
            WaitTime::between(self.wait_min, self.wait_max).context("Invalid wait time")?;
        let config = RunConfig {
            users: self.users,
            spawn_rate: self.spawn_rate,
            run_time: self.run_time,
            iterations: self.iterations,
            wait_time,
        };
        config.validate().context("Invalid run configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_setup() {
        let cli = Cli::try_parse_from(["loadgen"]).unwrap();
        assert_eq!(cli.host, DEFAULT_HOST);
        assert_eq!(cli.requests_per_task, 10);
        let config = cli.run_config().unwrap();
        assert_eq!(config.users, 1);
        assert_eq!(config.wait_time, WaitTime::default());
        assert_eq!(config.run_time, None);
    }

    #[test]
    fn parses_durations_and_counts() {
        let cli = Cli::try_parse_from([
            "loadgen",
            "--host",
            "http://127.0.0.1:9000",
            "-u",
            "50",
            "-r",
            "5",
            "-t",
            "2m",
            "--wait-min",
            "0.5",
            "--wait-max",
            "1.5",
            "--request-timeout",
            "10s",
        ])
        .unwrap();
        let config = cli.run_config().unwrap();
        assert_eq!(config.users, 50);
        assert_eq!(config.run_time, Some(Duration::from_secs(120)));
        assert_eq!(config.wait_time.max(), Duration::from_millis(1500));
        assert_eq!(cli.request_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn rejects_inverted_wait_time() {
        let cli = Cli::try_parse_from(["loadgen", "--wait-min", "3", "--wait-max", "1"]).unwrap();
        assert!(cli.run_config().is_err());
        let cli = Cli::try_parse_from(["loadgen", "-u", "0"]).unwrap();
        assert!(cli.run_config().is_err());
    }

    #[test]
    fn rejects_values_too_large_for_a_duration() {
        let cli =
            Cli::try_parse_from(["loadgen", "--wait-min", "1e20", "--wait-max", "1e20"]).unwrap();
        assert!(cli.run_config().is_err());
        let cli = Cli::try_parse_from(["loadgen", "-u", "2", "-r", "1e-300"]).unwrap();
        assert!(cli.run_config().is_err());
    }
}
