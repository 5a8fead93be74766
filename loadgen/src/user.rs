use std::sync::Arc;

use rand::rngs::SmallRng;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::client::HttpClient;
use crate::statistics::Statistics;
use crate::task::{DiagnosticSink, UserBehavior};
use crate::wait::WaitTime;

/// One independently paced actor repeating a [`UserBehavior`].
pub(crate) struct SimulatedUser<B> {
    pub(crate) id: usize,
    pub(crate) client: HttpClient,
    pub(crate) behavior: Arc<B>,
    pub(crate) wait_time: WaitTime,
    pub(crate) iterations: Option<usize>,
    pub(crate) deadline: Option<Instant>,
    pub(crate) shutdown: watch::Receiver<bool>,
    pub(crate) diagnostics: DiagnosticSink,
    pub(crate) rng: SmallRng,
}

impl<B: UserBehavior> SimulatedUser<B> {
    /// Runs until the iteration budget is spent, the deadline passes or shutdown is signalled.
    ///
    /// A task still in flight when the run stops is abandoned and not counted, though the
    /// diagnostics it already wrote stay written.
    pub(crate) async fn run(mut self) -> Statistics {
        let mut statistics = Statistics::default();
        let mut completed = 0usize;
        loop {
            let report = tokio::select! {
                report = self.behavior.run(&self.client, &self.diagnostics) => report,
                () = wait_for_stop(&mut self.shutdown, self.deadline) => break,
            };
            statistics.record_report(&report);
            completed += 1;
            if self.iterations.is_some_and(|n| completed >= n) {
                break;
            }

            let wait = self.wait_time.sample(&mut self.rng);
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = wait_for_stop(&mut self.shutdown, self.deadline) => break,
            }
        }
        tracing::debug!(user = self.id, tasks = completed, "user stopped");
        statistics
    }
}

/// Resolves once shutdown is signalled or `deadline` passes.
pub(crate) async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>, deadline: Option<Instant>) {
    let deadline_passed = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    let signalled = async {
        // A dropped sender can never signal.
        let closed = shutdown.wait_for(|stop| *stop).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        () = deadline_passed => {}
        () = signalled => {}
    }
}
