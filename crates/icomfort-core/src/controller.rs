// ── Cloud controller ──
//
// Full lifecycle management for one account's cloud connection:
// handshake, system discovery, subscriptions, the background message
// pump, command publishes, and shutdown.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use icomfort_api::messages::{FanMode, HvacMode};
use icomfort_api::{CloudClient, Error};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::{SetpointChange, fan_mode_payload, hvac_mode_payload, setpoint_payload};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::model::{System, Zone, ZoneKey};
use crate::pump::{self, PumpErrorHandler, PumpState};
use crate::store::{AccountStore, UpdateObserver};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. One instance manages
/// exactly one account's systems for the lifetime of the process.
#[derive(Clone)]
pub struct CloudController {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    pub(crate) config: ClientConfig,
    pub(crate) cloud: CloudClient,
    pub(crate) store: AccountStore,
    pub(crate) cancel: CancellationToken,
    pump_state: watch::Sender<PumpState>,
    pump_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ControllerInner {
    pub(crate) fn set_pump_state(&self, state: PumpState) {
        let previous = self.pump_state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "pump state changed");
        }
    }
}

impl CloudController {
    /// Create a controller from configuration. Does NOT connect — call
    /// [`server_connect`](Self::server_connect) to run the handshake.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let cloud = CloudClient::new(config.cloud.clone()).map_err(ClientError::from)?;
        let (pump_state, _) = watch::channel(PumpState::Disconnected);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                cloud,
                store: AccountStore::new(),
                cancel: CancellationToken::new(),
                pump_state,
                pump_handle: Mutex::new(None),
            }),
        })
    }

    /// The controller configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Run the two-step handshake, populate the system collection from
    /// the login enumeration, and subscribe every discovered system to
    /// its data paths.
    ///
    /// Failures here surface synchronously; once the pump is running,
    /// equivalent failures are absorbed by its reconnect machinery.
    pub async fn server_connect(&self) -> Result<(), ClientError> {
        let inner = &self.inner;
        inner.set_pump_state(PumpState::Authenticating);

        let connected: Result<(), ClientError> = async {
            inner.cloud.authenticate().await?;
            let login = inner
                .cloud
                .login(&inner.config.email, &inner.config.password)
                .await?;
            inner.store.register_systems(login.systems());
            pump::subscribe_all(inner).await?;
            Ok(())
        }
        .await;

        match connected {
            Ok(()) => {
                inner.set_pump_state(PumpState::Polling);
                info!(systems = inner.store.system_ids().len(), "connected");
                Ok(())
            }
            Err(err) => {
                inner.set_pump_state(PumpState::Disconnected);
                Err(err)
            }
        }
    }

    /// Best-effort wait for first data: re-issue subscriptions, then
    /// pump inline until every known system has at least one active
    /// zone. Elapsing the timeout logs a warning and still succeeds.
    pub async fn initialize(&self) -> Result<(), ClientError> {
        let inner = &self.inner;
        pump::subscribe_all(inner).await?;

        let deadline = Instant::now() + inner.config.init_timeout;
        loop {
            if inner.store.all_systems_reporting() {
                info!("all systems reporting; initialization complete");
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = inner.config.init_timeout.as_secs(),
                    "initialization timed out before every system reported; continuing"
                );
                return Ok(());
            }

            if let Err(err) = pump::run_cycle(inner).await {
                // Absorbed: initialization is best-effort by contract.
                warn!(error = %err, "initialization poll failed; retrying");
            }
            tokio::time::sleep(inner.config.poll_interval).await;
        }
    }

    /// Start the background message pump. Returns immediately; all
    /// further work happens on the pump's own schedule. Starting an
    /// already-running pump is a no-op.
    pub fn start_message_pump(&self, on_error: Option<PumpErrorHandler>) {
        let mut handle = self
            .inner
            .pump_handle
            .lock()
            .expect("pump handle lock poisoned");
        if handle.is_some() {
            debug!("message pump already running");
            return;
        }
        *handle = Some(tokio::spawn(pump::run(Arc::clone(&self.inner), on_error)));
    }

    /// Stop the pump and clear all in-memory auth and system state.
    /// Idempotent.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self
            .inner
            .pump_handle
            .lock()
            .expect("pump handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.inner.cloud.clear_session();
        self.inner.store.clear();
        self.inner.set_pump_state(PumpState::Disconnected);
        debug!("shutdown complete");
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to pump state changes.
    pub fn pump_state(&self) -> watch::Receiver<PumpState> {
        self.pump_state_sender().subscribe()
    }

    fn pump_state_sender(&self) -> &watch::Sender<PumpState> {
        &self.inner.pump_state
    }

    /// Register an observer invoked per updated active zone.
    pub fn on_update(&self, observer: UpdateObserver) {
        self.inner.store.on_update(observer);
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Currently-known active zones across all systems.
    pub fn get_zones(&self) -> Vec<Zone> {
        self.inner.store.active_zones()
    }

    /// Snapshot of every known system.
    pub fn system_list(&self) -> Vec<System> {
        self.inner.store.systems_snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change a zone's operating mode.
    pub async fn set_hvac_mode(&self, zone: &ZoneKey, mode: HvacMode) -> Result<(), ClientError> {
        self.ensure_known(zone)?;
        let payload = hvac_mode_payload(self.inner.config.manual_schedule_base, zone.index, mode);
        info!(zone = %zone, %mode, "publishing HVAC mode change");
        self.publish(zone, payload).await
    }

    /// Change a zone's heating/cooling setpoints (°F; the °C mirror is
    /// computed here, on write).
    pub async fn set_temperature(
        &self,
        zone: &ZoneKey,
        change: SetpointChange,
    ) -> Result<(), ClientError> {
        self.ensure_known(zone)?;
        let payload =
            setpoint_payload(self.inner.config.manual_schedule_base, zone.index, &change)?;
        info!(zone = %zone, hsp = ?change.hsp, csp = ?change.csp, "publishing setpoint change");
        self.publish(zone, payload).await
    }

    /// Change a zone's fan mode.
    pub async fn set_fan_mode(&self, zone: &ZoneKey, mode: FanMode) -> Result<(), ClientError> {
        self.ensure_known(zone)?;
        let payload = fan_mode_payload(self.inner.config.manual_schedule_base, zone.index, mode);
        info!(zone = %zone, %mode, "publishing fan mode change");
        self.publish(zone, payload).await
    }

    async fn publish(&self, zone: &ZoneKey, payload: serde_json::Value) -> Result<(), ClientError> {
        self.inner
            .cloud
            .publish(&zone.system_id, payload)
            .await
            .map_err(|err: Error| err.into())
    }

    fn ensure_known(&self, zone: &ZoneKey) -> Result<(), ClientError> {
        if self.inner.store.zone(zone).is_none() {
            return Err(ClientError::UnknownZone {
                id: zone.to_string(),
            });
        }
        Ok(())
    }
}
