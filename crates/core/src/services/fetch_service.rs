use std::future::Future;

use tokio::sync::watch;

/// Result of a coordinated fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// This fetch was the newest when it finished; apply its result.
    Applied(T),
    /// A newer fetch (or an explicit cancel) started before this one
    /// finished; its result was dropped.
    Superseded,
}

impl<T> FetchOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied(_))
    }

    pub fn into_applied(self) -> Option<T> {
        match self {
            FetchOutcome::Applied(value) => Some(value),
            FetchOutcome::Superseded => None,
        }
    }
}

/// "Last request wins" coordination for view refreshes.
///
/// Every [`run`](Self::run) takes a new generation number. Starting a run
/// supersedes all older ones: an older run that is still awaiting is
/// dropped at its next await point, and one that already finished its
/// future reports [`FetchOutcome::Superseded`] instead of a value.
pub struct FetchCoordinator {
    current: watch::Sender<u64>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        let (current, _) = watch::channel(0);
        Self { current }
    }

    /// Generation of the newest run (or cancel).
    pub fn generation(&self) -> u64 {
        *self.current.borrow()
    }

    /// Supersede whatever is in flight without starting anything new.
    pub fn cancel(&self) -> u64 {
        let generation = self.advance();
        tracing::debug!(generation, "in-flight fetch cancelled");
        generation
    }

    /// Drive `fetch` to completion unless a newer run supersedes it.
    pub async fn run<T, F>(&self, fetch: F) -> FetchOutcome<T>
    where
        F: Future<Output = T>,
    {
        let generation = self.advance();
        let mut current = self.current.subscribe();

        tokio::select! {
            value = fetch => {
                if self.generation() == generation {
                    FetchOutcome::Applied(value)
                } else {
                    tracing::debug!(generation, "fetch finished after being superseded; result dropped");
                    FetchOutcome::Superseded
                }
            }
            _ = current.wait_for(|latest| *latest != generation) => {
                tracing::debug!(generation, "fetch superseded while in flight");
                FetchOutcome::Superseded
            }
        }
    }

    fn advance(&self) -> u64 {
        // Increment under the channel's write lock so concurrent runs can
        // never publish generations out of order.
        let mut generation = 0;
        self.current.send_modify(|latest| {
            *latest += 1;
            generation = *latest;
        });
        generation
    }
}

impl Default for FetchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
