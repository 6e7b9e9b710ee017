//! Worker task driving one agent's cycles.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;

const AGENTS_RUNNING: &str = "autoloop_agents_running";
const CYCLES_TOTAL: &str = "autoloop_cycles_total";

/// Keeps the running-agents gauge accurate even when the worker is aborted.
struct RunningGuard;

impl RunningGuard {
    fn new() -> Self {
        metrics::gauge!(AGENTS_RUNNING).increment(1.0);
        Self
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        metrics::gauge!(AGENTS_RUNNING).decrement(1.0);
    }
}

/// Run cycles until `cancel` fires.
///
/// The agent lock is held for one cycle at a time and released while sleeping.
/// Cancellation interrupts the sleep but never an in-flight cycle. A panicking
/// cycle counts as a failed one and the loop carries on.
pub(crate) async fn run_worker(agent: Arc<Mutex<Agent>>, cancel: CancellationToken) {
    let _running = RunningGuard::new();
    let (id, delay) = {
        let agent = agent.lock().await;
        (agent.id().to_string(), agent.loop_delay())
    };
    tracing::info!(agent_id = %id, delay_secs = delay.as_secs_f64(), "Agent worker started");

    while !cancel.is_cancelled() {
        let succeeded = {
            let mut agent = agent.lock().await;
            let outcome = AssertUnwindSafe(agent.run_cycle()).catch_unwind().await;
            match outcome {
                Ok(result) => result.is_ok(),
                Err(payload) => {
                    agent.record_panic(&panic_message(payload.as_ref()));
                    false
                }
            }
        };
        let label = if succeeded { "ok" } else { "error" };
        metrics::counter!(CYCLES_TOTAL, "outcome" => label).increment(1);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!(agent_id = %id, "Agent worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
