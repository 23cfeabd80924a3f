use super::{Prober, tcp};
use crate::config::WaitPolicy;
use crate::error::BootstrapError;
use crate::types::{ConnectionTarget, ReadinessState, ServiceTarget};
use backon::{ConstantBuilder, Retryable};
use std::cell::Cell;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

/// Failed attempts between two warn-level progress lines.
const WARN_EVERY: u32 = 5;

/// Poll the data store until the prober succeeds or the policy's timeout passes.
pub async fn wait_for_store(
    prober: &dyn Prober,
    target: &ConnectionTarget,
    policy: WaitPolicy,
) -> ReadinessState {
    info!(
        target = %target,
        probe = prober.name(),
        timeout_secs = policy.timeout.as_secs(),
        interval_secs = policy.interval.as_secs(),
        "waiting for data store"
    );
    poll_until_ready("data store", policy, || prober.probe(target)).await
}

/// Poll a plain TCP dependency (broker, cache, sibling service).
pub async fn wait_for_service(endpoint: &ServiceTarget, policy: WaitPolicy) -> ReadinessState {
    info!(
        service = %endpoint,
        timeout_secs = policy.timeout.as_secs(),
        "waiting for service"
    );
    let label = endpoint.to_string();
    poll_until_ready(&label, policy, || tcp::connect(endpoint)).await
}

/// Fixed-interval polling: no backoff growth, every attempt bounded by the
/// interval. Attempts keep starting until the deadline, the last sleep is cut
/// short so one attempt lands on it, and a dependency that never answers is
/// reported within `timeout + interval`.
async fn poll_until_ready<F, Fut>(what: &str, policy: WaitPolicy, mut attempt: F) -> ReadinessState
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), BootstrapError>>,
{
    let started = Instant::now();
    let attempts = Cell::new(0u32);
    let backoff = ConstantBuilder::default()
        .with_delay(policy.interval)
        .with_max_times(max_retries(policy));

    debug!(dependency = what, state = ?ReadinessState::Waiting);

    let result = (|| {
        attempts.set(attempts.get() + 1);
        let fut = attempt();
        async move {
            timeout(policy.interval, fut)
                .await
                .map_err(|_| BootstrapError::ProbeTimeout(policy.interval))?
        }
    })
    .retry(backoff)
    .when(|_: &BootstrapError| started.elapsed() < policy.timeout)
    .adjust(|_: &BootstrapError, delay: Option<Duration>| {
        let remaining = policy.timeout.checked_sub(started.elapsed())?;
        delay.map(|d| d.min(remaining))
    })
    .notify(|err: &BootstrapError, dur: Duration| {
        let n = attempts.get();
        if n % WARN_EVERY == 0 {
            warn!(
                dependency = what,
                attempt = n,
                elapsed = ?started.elapsed(),
                error = %err,
                "still waiting"
            );
        } else {
            debug!(
                dependency = what,
                attempt = n,
                error = %err,
                "not ready, retrying in {:?}",
                dur
            );
        }
    })
    .await;

    match result {
        Ok(()) => {
            info!(
                dependency = what,
                attempts = attempts.get(),
                elapsed = ?started.elapsed(),
                state = ?ReadinessState::Ready,
                "{what} ready"
            );
            ReadinessState::Ready
        }
        Err(e) => {
            warn!(
                dependency = what,
                attempts = attempts.get(),
                elapsed = ?started.elapsed(),
                last_error = %e,
                state = ?ReadinessState::TimedOut,
                "{what} did not become ready"
            );
            ReadinessState::TimedOut
        }
    }
}

/// Upper bound on retries, including the shortened one at the deadline; the
/// deadline check in `when` usually stops earlier.
fn max_retries(policy: WaitPolicy) -> usize {
    let interval = policy.interval.as_millis().max(1);
    (policy.timeout.as_millis() / interval) as usize + 2
}
