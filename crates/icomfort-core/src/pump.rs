// ── Message pump ──
//
// The recurring poll-and-route loop that keeps the data model current.
// One pump per controller; cycles run strictly sequentially. Errors are
// absorbed at this boundary: below the failure threshold a cycle failure
// is logged and counted, an unauthorized response short-circuits into
// reconnection, and the loop itself only ever stops on explicit
// shutdown via the cancellation token.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::controller::ControllerInner;
use crate::error::ClientError;

/// Data paths subscribed per system right after auth.
pub(crate) const PRIMARY_TOPICS: &str = "1;/system;/zones;/schedules;/occupancy;";
/// Secondary home/interfaces topic set.
pub(crate) const HOME_TOPICS: &str = "1;/homes;/interfaces;";

/// Pump lifecycle, observable through
/// [`CloudController::pump_state`](crate::controller::CloudController::pump_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PumpState {
    Disconnected,
    Authenticating,
    Polling,
    Reconnecting,
}

/// Callback invoked with every absorbed or terminal-cycle error.
pub type PumpErrorHandler = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// The background pump loop. Runs until the controller's cancellation
/// token fires; never exits because of errors.
pub(crate) async fn run(inner: Arc<ControllerInner>, on_error: Option<PumpErrorHandler>) {
    info!("message pump started");
    let cancel = inner.cancel.clone();
    let mut consecutive_failures: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match run_cycle(&inner).await {
            Ok(routed) => {
                if routed > 0 {
                    debug!(messages = routed, "poll cycle routed updates");
                }
                consecutive_failures = 0;
            }
            Err(err) => {
                notify_error(&on_error, &err);
                if err.is_unauthorized() {
                    warn!("authorization rejected; reconnecting");
                    reconnect(&inner, &on_error).await;
                    consecutive_failures = 0;
                } else {
                    consecutive_failures += 1;
                    warn!(
                        error = %err,
                        failures = consecutive_failures,
                        "poll cycle failed"
                    );
                    if consecutive_failures >= inner.config.failure_threshold {
                        warn!(
                            threshold = inner.config.failure_threshold,
                            "consecutive failure threshold reached; reconnecting"
                        );
                        reconnect(&inner, &on_error).await;
                        consecutive_failures = 0;
                    }
                }
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(inner.config.poll_interval) => {}
        }
    }

    info!("message pump stopped");
}

/// One poll cycle: proactive refresh if due, then a bounded fetch of
/// queued messages routed into the store. Zero messages is success.
pub(crate) async fn run_cycle(inner: &ControllerInner) -> Result<usize, ClientError> {
    if inner.cloud.needs_refresh() {
        info!("bearer token within refresh buffer; re-running handshake");
        let login = inner
            .cloud
            .force_refresh(&inner.config.email, &inner.config.password)
            .await?;
        inner.store.register_systems(login.systems());
    }

    let batch = inner.cloud.retrieve_messages().await?;
    let routed = batch.messages.len();
    for message in &batch.messages {
        inner.store.apply_message(message);
    }
    Ok(routed)
}

/// Subscribe one system to its data paths: the primary topic set, then
/// the home/interfaces set.
pub(crate) async fn subscribe_system(
    inner: &ControllerInner,
    sys_id: &str,
) -> Result<(), ClientError> {
    inner.cloud.request_data(sys_id, PRIMARY_TOPICS).await?;
    inner.cloud.request_data(sys_id, HOME_TOPICS).await?;
    Ok(())
}

/// Subscribe every known system.
pub(crate) async fn subscribe_all(inner: &ControllerInner) -> Result<(), ClientError> {
    for sys_id in inner.store.system_ids() {
        subscribe_system(inner, &sys_id).await?;
    }
    Ok(())
}

/// Reconnection loop: full re-handshake plus re-subscription, retried on
/// the normal cycle cadence until it succeeds or the pump is shut down.
async fn reconnect(inner: &ControllerInner, on_error: &Option<PumpErrorHandler>) {
    inner.set_pump_state(PumpState::Reconnecting);

    loop {
        if inner.cancel.is_cancelled() {
            return;
        }

        match try_reconnect(inner).await {
            Ok(()) => {
                info!("reconnected; resuming polling");
                inner.set_pump_state(PumpState::Polling);
                return;
            }
            Err(err) => {
                warn!(error = %err, "reconnect attempt failed; will retry");
                notify_error(on_error, &err);
            }
        }

        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => return,
            () = tokio::time::sleep(inner.config.poll_interval) => {}
        }
    }
}

async fn try_reconnect(inner: &ControllerInner) -> Result<(), ClientError> {
    let login = inner
        .cloud
        .force_refresh(&inner.config.email, &inner.config.password)
        .await?;
    inner.store.register_systems(login.systems());
    subscribe_all(inner).await
}

fn notify_error(on_error: &Option<PumpErrorHandler>, err: &ClientError) {
    if let Some(handler) = on_error {
        handler(err);
    }
}
