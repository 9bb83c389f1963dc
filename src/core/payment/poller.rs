//! Finite-state payment status poller.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::TransactionStatus;

/// Poller state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending { attempt: u32 },
    Succeeded,
    Failed(Option<String>),
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending { .. })
    }
}

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed(Option<String>),
    TimedOut,
    Cancelled,
}

/// Tracks payment status across a bounded number of poll attempts.
#[derive(Debug, Clone)]
pub struct PaymentPoller {
    state: PollState,
    max_attempts: u32,
}

impl PaymentPoller {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: PollState::Pending { attempt: 0 },
            max_attempts: max_attempts.max(1),
        }
    }

    /// Feed the result of one poll. A failed request counts as an attempt that saw
    /// no terminal status.
    pub fn observe(&mut self, result: Option<(TransactionStatus, Option<String>)>) -> &PollState {
        let PollState::Pending { attempt } = self.state else {
            return &self.state;
        };
        let attempt = attempt + 1;
        self.state = match result {
            Some((status, _)) if status.is_success() => PollState::Succeeded,
            Some((status, message)) if status.is_failure() => PollState::Failed(message),
            _ if attempt >= self.max_attempts => PollState::TimedOut,
            _ => PollState::Pending { attempt },
        };
        &self.state
    }

    /// Poll until a terminal state, waiting `interval` between attempts. The run stops
    /// early with `Cancelled` when `cancel` fires.
    pub async fn run<F, Fut, E>(
        mut self,
        interval: Duration,
        cancel: CancellationToken,
        mut fetch: F,
    ) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(TransactionStatus, Option<String>), E>>,
        E: std::fmt::Display,
    {
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                r = fetch() => r,
            };
            let observed = match result {
                Ok(status) => Some(status),
                Err(e) => {
                    log::warn!("Payment status poll failed: {}", e);
                    None
                }
            };
            let state = self.observe(observed);
            if state.is_terminal() {
                return match state {
                    PollState::Succeeded => PollOutcome::Succeeded,
                    PollState::Failed(message) => PollOutcome::Failed(message.clone()),
                    _ => PollOutcome::TimedOut,
                };
            }
            log::debug!("Payment still pending: {:?}", state);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn success_and_approved_succeed() {
        let mut p = PaymentPoller::new(3);
        assert_eq!(
            p.observe(Some((TransactionStatus::Approved, None))),
            &PollState::Succeeded
        );
        let mut p = PaymentPoller::new(3);
        assert!(
            p.observe(Some((TransactionStatus::Success, None)))
                .is_terminal()
        );
    }

    #[test]
    fn failure_keeps_message() {
        let mut p = PaymentPoller::new(3);
        let state = p.observe(Some((TransactionStatus::Failed, Some("declined".to_string()))));
        assert_eq!(state, &PollState::Failed(Some("declined".to_string())));
    }

    #[test]
    fn times_out_after_max_attempts() {
        let mut p = PaymentPoller::new(2);
        assert_eq!(
            p.observe(Some((TransactionStatus::Pending, None))),
            &PollState::Pending { attempt: 1 }
        );
        assert_eq!(p.observe(None), &PollState::TimedOut);
    }

    #[test]
    fn terminal_state_is_sticky() {
        let mut p = PaymentPoller::new(5);
        p.observe(Some((TransactionStatus::Success, None)));
        assert_eq!(
            p.observe(Some((TransactionStatus::Failed, None))),
            &PollState::Succeeded
        );
    }

    #[tokio::test]
    async fn run_polls_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let outcome = PaymentPoller::new(10)
            .run(TICK, CancellationToken::new(), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Ok::<_, String>((TransactionStatus::Pending, None))
                    } else {
                        Ok((TransactionStatus::Approved, None))
                    }
                }
            })
            .await;
        assert_eq!(outcome, PollOutcome::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_gives_up_when_requests_keep_failing() {
        let outcome = PaymentPoller::new(3)
            .run(TICK, CancellationToken::new(), || async {
                Err::<(TransactionStatus, Option<String>), _>("connection refused")
            })
            .await;
        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = PaymentPoller::new(3)
            .run(TICK, cancel, || async {
                Ok::<_, String>((TransactionStatus::Pending, None))
            })
            .await;
        assert_eq!(outcome, PollOutcome::Cancelled);
    }
}
