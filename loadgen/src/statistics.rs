use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use sketches_ddsketch::DDSketch;

use crate::task::{Outcome, TaskReport};

/// Why a request counted as failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    Status(u16),
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Status(code) => write!(f, "{code}"),
            FailureKind::Transport => f.write_str("transport"),
        }
    }
}

/// Round trip times and failures of all requests sharing a name.
#[derive(Default)]
pub struct RequestStatistics {
    pub requests: u64,
    pub failures: u64,
    pub failures_by_kind: BTreeMap<FailureKind, u64>,
    min_rtt: Option<u128>,
    max_rtt: u128,
    total_rtt: u128,
    sketch: DDSketch,
}

impl RequestStatistics {
    fn record(&mut self, rtt: Duration, outcome: &Outcome) {
        self.requests += 1;
        let kind = match outcome {
            Outcome::Success => None,
            Outcome::Rejected { status, .. } => Some(FailureKind::Status(status.as_u16())),
            Outcome::Transport(_) => Some(FailureKind::Transport),
        };
        if let Some(kind) = kind {
            self.failures += 1;
            *self.failures_by_kind.entry(kind).or_default() += 1;
        }
        let cur = rtt.as_micros();
        update_stats(cur, &mut self.min_rtt, &mut self.max_rtt, &mut self.total_rtt);
        self.sketch.add(cur as f64);
    }

    fn merge(&mut self, other: &RequestStatistics) -> anyhow::Result<()> {
        self.requests += other.requests;
        self.failures += other.failures;
        for (kind, count) in &other.failures_by_kind {
            *self.failures_by_kind.entry(*kind).or_default() += count;
        }
        if let Some(min) = other.min_rtt {
            self.min_rtt = Some(self.min_rtt.map_or(min, |m| m.min(min)));
        }
        self.max_rtt = self.max_rtt.max(other.max_rtt);
        self.total_rtt += other.total_rtt;
        self.sketch
            .merge(&other.sketch)
            .map_err(|e| anyhow!("Failed to merge latency sketches: {e:?}"))
    }

    /// Round trip minimum in microseconds, `None` before the first request.
    #[must_use]
    pub fn min_rtt(&self) -> Option<u128> {
        self.min_rtt
    }

    #[must_use]
    pub fn max_rtt(&self) -> u128 {
        self.max_rtt
    }

    #[must_use]
    pub fn mean_rtt(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_rtt as f64 / self.requests as f64
    }

    /// Estimated round trip quantile in microseconds, clamped to the observed range.
    #[must_use]
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let min = self.min_rtt? as f64;
        let estimate = self.sketch.quantile(q).ok()??;
        Some(estimate.clamp(min, self.max_rtt as f64))
    }
}

fn update_stats(cur: u128, min: &mut Option<u128>, max: &mut u128, total: &mut u128) {
    if min.map_or(true, |m| cur < m) {
        *min = Some(cur);
    }
    if cur > *max {
        *max = cur;
    }
    *total += cur;
}

/// Aggregated results of task executions, keyed by request name.
#[derive(Default)]
pub struct Statistics {
    tasks: u64,
    entries: BTreeMap<&'static str, RequestStatistics>,
}

impl Statistics {
    pub fn record_report(&mut self, report: &TaskReport) {
        self.tasks += 1;
        for record in &report.requests {
            self.entries
                .entry(record.name)
                .or_default()
                .record(record.rtt, &record.outcome);
        }
    }

    pub fn merge(&mut self, other: Statistics) -> anyhow::Result<()> {
        self.tasks += other.tasks;
        for (name, stats) in other.entries {
            match self.entries.get_mut(name) {
                Some(existing) => existing.merge(&stats)?,
                None => {
                    self.entries.insert(name, stats);
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn tasks(&self) -> u64 {
        self.tasks
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RequestStatistics> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RequestStatistics)> {
        self.entries.iter().map(|(name, stats)| (*name, stats))
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.entries.values().map(|s| s.requests).sum()
    }

    #[must_use]
    pub fn total_failures(&self) -> u64 {
        self.entries.values().map(|s| s.failures).sum()
    }
}

/// Outcome of a whole load run.
pub struct RunSummary {
    pub users: usize,
    pub elapsed: Duration,
    pub statistics: Statistics,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.statistics;
        let secs = self.elapsed.as_secs_f64();
        writeln!(
            f,
            "Results ({} users, {} tasks, {:.2?}):",
            self.users,
            stats.tasks(),
            self.elapsed
        )?;
        for (name, req) in stats.iter() {
            let rps = if secs > 0.0 {
                req.requests as f64 / secs
            } else {
                0.0
            };
            write!(
                f,
                "    {name}  requests: {}, failures: {}, {rps:.2} req/s",
                req.requests, req.failures
            )?;
            if !req.failures_by_kind.is_empty() {
                let kinds: Vec<String> = req
                    .failures_by_kind
                    .iter()
                    .map(|(kind, count)| format!("{kind}: {count}"))
                    .collect();
                write!(f, " ({})", kinds.join(", "))?;
            }
            writeln!(f)?;
            let Some(min) = req.min_rtt() else {
                continue;
            };
            writeln!(
                f,
                "        rtt µs [min, mean, max] = [{}, {:.2}, {}]",
                min,
                req.mean_rtt(),
                req.max_rtt()
            )?;
            let p = |q| req.quantile(q).unwrap_or_default();
            writeln!(
                f,
                "        rtt µs [p50, p90, p99]  = [{:.0}, {:.0}, {:.0}]",
                p(0.5),
                p(0.9),
                p(0.99)
            )?;
        }
        Ok(())
    }
}
