// ── Abstract client contract ──
//
// The capability set a device-family client must provide. The cloud
// messaging family (this crate's `CloudController`) and the older
// request/response polling family implement this independently — the
// auth handshakes, polling cadences, and message shapes share nothing,
// so there is no base implementation to inherit from.

use icomfort_api::messages::{FanMode, HvacMode};

use crate::commands::SetpointChange;
use crate::controller::CloudController;
use crate::error::ClientError;
use crate::model::{System, Zone, ZoneKey};
use crate::pump::PumpErrorHandler;
use crate::store::UpdateObserver;

/// Capability set shared by every device-family client.
#[allow(async_fn_in_trait)]
pub trait ComfortClient {
    /// Authenticate and discover systems. Failures surface to the caller.
    async fn server_connect(&self) -> Result<(), ClientError>;

    /// Best-effort wait for first data; never fails on timeout.
    async fn initialize(&self) -> Result<(), ClientError>;

    /// Snapshot of currently-known active zones.
    fn get_zones(&self) -> Vec<Zone>;

    /// Snapshot of every known system.
    fn system_list(&self) -> Vec<System>;

    /// Register an observer invoked per updated active zone.
    fn on_update(&self, observer: UpdateObserver);

    /// Begin the background update loop; returns immediately.
    fn start_message_pump(&self, on_error: Option<PumpErrorHandler>);

    /// Change a zone's operating mode.
    async fn set_hvac_mode(&self, zone: &ZoneKey, mode: HvacMode) -> Result<(), ClientError>;

    /// Change a zone's setpoints, given in Fahrenheit.
    async fn set_temperature(
        &self,
        zone: &ZoneKey,
        change: SetpointChange,
    ) -> Result<(), ClientError>;

    /// Change a zone's fan mode.
    async fn set_fan_mode(&self, zone: &ZoneKey, mode: FanMode) -> Result<(), ClientError>;

    /// Stop background work and clear in-memory state. Idempotent.
    async fn shutdown(&self);
}

impl ComfortClient for crate::controller::CloudController {
    async fn server_connect(&self) -> Result<(), ClientError> {
        CloudController::server_connect(self).await
    }

    async fn initialize(&self) -> Result<(), ClientError> {
        CloudController::initialize(self).await
    }

    fn get_zones(&self) -> Vec<Zone> {
        CloudController::get_zones(self)
    }

    fn system_list(&self) -> Vec<System> {
        CloudController::system_list(self)
    }

    fn on_update(&self, observer: UpdateObserver) {
        CloudController::on_update(self, observer);
    }

    fn start_message_pump(&self, on_error: Option<PumpErrorHandler>) {
        CloudController::start_message_pump(self, on_error);
    }

    async fn set_hvac_mode(&self, zone: &ZoneKey, mode: HvacMode) -> Result<(), ClientError> {
        CloudController::set_hvac_mode(self, zone, mode).await
    }

    async fn set_temperature(
        &self,
        zone: &ZoneKey,
        change: SetpointChange,
    ) -> Result<(), ClientError> {
        CloudController::set_temperature(self, zone, change).await
    }

    async fn set_fan_mode(&self, zone: &ZoneKey, mode: FanMode) -> Result<(), ClientError> {
        CloudController::set_fan_mode(self, zone, mode).await
    }

    async fn shutdown(&self) {
        CloudController::shutdown(self).await;
    }
}
