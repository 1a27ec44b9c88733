// One controllable thermostat-like unit within a system.
//
// A zone's state arrives in three independent groups (capability/config,
// live status, active schedule period), each delivered as sparse
// fragments. Merging overlays only the fields a fragment actually
// carries; everything else keeps its previous value, which is also what
// makes a zone's activation permanent once the first temperature lands.

use std::fmt;

use icomfort_api::messages::{
    FanMode, HvacMode, PeriodFragment, ReadingQuality, ZoneConfigFragment, ZoneFragment,
    ZoneStatusFragment,
};
use serde::Serialize;

/// Identity of a zone: the owning system plus the zone index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ZoneKey {
    pub system_id: String,
    pub index: u32,
}

impl ZoneKey {
    pub fn new(system_id: impl Into<String>, index: u32) -> Self {
        Self {
            system_id: system_id.into(),
            index,
        }
    }
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.system_id, self.index)
    }
}

/// Capability/config fields. Setpoint bounds are tracked in both scales
/// exactly as the service reports them; neither scale is ever derived
/// from the other here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneConfig {
    pub name: Option<String>,
    pub min_hsp: Option<f64>,
    pub max_hsp: Option<f64>,
    pub min_hsp_c: Option<f64>,
    pub max_hsp_c: Option<f64>,
    pub min_csp: Option<f64>,
    pub max_csp: Option<f64>,
    pub min_csp_c: Option<f64>,
    pub max_csp_c: Option<f64>,
    pub heating: Option<bool>,
    pub cooling: Option<bool>,
    pub emergency_heating: Option<bool>,
    pub humidification: Option<bool>,
    pub enabled: Option<bool>,
}

/// Live readings and equipment activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub temperature: Option<f64>,
    pub temperature_c: Option<f64>,
    pub temperature_status: Option<ReadingQuality>,
    pub humidity: Option<f64>,
    pub humidity_status: Option<ReadingQuality>,
    pub fan: Option<bool>,
    pub defrost: Option<bool>,
    pub aux_heat: Option<bool>,
    pub damper: Option<u32>,
    pub demand: Option<f64>,
}

/// The presently-in-effect schedule slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZonePeriod {
    pub system_mode: Option<HvacMode>,
    pub fan_mode: Option<FanMode>,
    pub hsp: Option<f64>,
    pub hsp_c: Option<f64>,
    pub csp: Option<f64>,
    pub csp_c: Option<f64>,
    pub sp: Option<f64>,
    pub sp_c: Option<f64>,
    pub husp: Option<f64>,
    pub desp: Option<f64>,
}

/// One zone's merged state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub system_id: String,
    pub index: u32,
    pub config: ZoneConfig,
    pub status: ZoneStatus,
    pub period: ZonePeriod,
}

impl Zone {
    /// Placeholder created on first reference, before any update has
    /// arrived. Deterministic: every field absent.
    pub(crate) fn placeholder(system_id: impl Into<String>, index: u32) -> Self {
        Self {
            system_id: system_id.into(),
            index,
            config: ZoneConfig::default(),
            status: ZoneStatus::default(),
            period: ZonePeriod::default(),
        }
    }

    pub fn key(&self) -> ZoneKey {
        ZoneKey::new(self.system_id.clone(), self.index)
    }

    /// The single external-facing identifier derived from the
    /// (system id, zone index) pair.
    pub fn unique_id(&self) -> String {
        self.key().to_string()
    }

    /// A zone is eligible for consumers once a status update has ever
    /// delivered a temperature. Merges never un-set fields, so
    /// activation is permanent.
    pub fn is_active(&self) -> bool {
        self.status.temperature.is_some()
    }

    /// Overlay a fragment onto this zone: only fields present in the
    /// fragment overwrite; everything else is untouched.
    pub(crate) fn apply(&mut self, fragment: &ZoneFragment) {
        if let Some(config) = &fragment.config {
            self.apply_config(config);
        }
        if let Some(status) = &fragment.status {
            self.apply_status(status);
        }
        if let Some(period) = &fragment.period {
            self.apply_period(period);
        }
    }

    fn apply_config(&mut self, fragment: &ZoneConfigFragment) {
        let config = &mut self.config;
        overlay(&mut config.name, &fragment.name);
        overlay(&mut config.min_hsp, &fragment.min_hsp);
        overlay(&mut config.max_hsp, &fragment.max_hsp);
        overlay(&mut config.min_hsp_c, &fragment.min_hsp_c);
        overlay(&mut config.max_hsp_c, &fragment.max_hsp_c);
        overlay(&mut config.min_csp, &fragment.min_csp);
        overlay(&mut config.max_csp, &fragment.max_csp);
        overlay(&mut config.min_csp_c, &fragment.min_csp_c);
        overlay(&mut config.max_csp_c, &fragment.max_csp_c);
        overlay(&mut config.heating, &fragment.heating_option);
        overlay(&mut config.cooling, &fragment.cooling_option);
        overlay(&mut config.emergency_heating, &fragment.emergency_heating_option);
        overlay(&mut config.humidification, &fragment.humidification_option);
        overlay(&mut config.enabled, &fragment.enabled);
    }

    fn apply_status(&mut self, fragment: &ZoneStatusFragment) {
        let status = &mut self.status;
        overlay(&mut status.temperature, &fragment.temperature);
        overlay(&mut status.temperature_c, &fragment.temperature_c);
        overlay(&mut status.temperature_status, &fragment.temperature_status);
        overlay(&mut status.humidity, &fragment.humidity);
        overlay(&mut status.humidity_status, &fragment.humidity_status);
        overlay(&mut status.fan, &fragment.fan);
        overlay(&mut status.defrost, &fragment.defrost);
        overlay(&mut status.aux_heat, &fragment.aux_heat);
        overlay(&mut status.damper, &fragment.damper);
        overlay(&mut status.demand, &fragment.demand);
    }

    fn apply_period(&mut self, fragment: &PeriodFragment) {
        let period = &mut self.period;
        overlay(&mut period.system_mode, &fragment.system_mode);
        overlay(&mut period.fan_mode, &fragment.fan_mode);
        overlay(&mut period.hsp, &fragment.hsp);
        overlay(&mut period.hsp_c, &fragment.hsp_c);
        overlay(&mut period.csp, &fragment.csp);
        overlay(&mut period.csp_c, &fragment.csp_c);
        overlay(&mut period.sp, &fragment.sp);
        overlay(&mut period.sp_c, &fragment.sp_c);
        overlay(&mut period.husp, &fragment.husp);
        overlay(&mut period.desp, &fragment.desp);
    }
}

/// Present-field-wins merge primitive: absent source fields leave the
/// destination untouched.
fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if let Some(value) = src {
        *dst = Some(value.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zone() -> Zone {
        Zone::placeholder("sys-1", 0)
    }

    fn fragment(value: serde_json::Value) -> ZoneFragment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn placeholder_is_inactive() {
        assert!(!zone().is_active());
    }

    #[test]
    fn temperature_update_activates_permanently() {
        let mut z = zone();
        z.apply(&fragment(json!({ "id": 0, "status": { "temperature": 70.0 } })));
        assert!(z.is_active());

        // A later fragment without a temperature must not deactivate.
        z.apply(&fragment(json!({ "id": 0, "status": { "humidity": 45.0 } })));
        assert!(z.is_active());
        assert_eq!(z.status.temperature, Some(70.0));
        assert_eq!(z.status.humidity, Some(45.0));
    }

    #[test]
    fn status_only_fragment_leaves_config_and_period_untouched() {
        let mut z = zone();
        z.apply(&fragment(json!({
            "id": 0,
            "config": { "name": "Living Room", "maxHsp": 90.0 },
            "period": { "systemMode": "heat", "hsp": 68.0 }
        })));

        z.apply(&fragment(json!({ "id": 0, "status": { "temperature": 72.0 } })));

        assert_eq!(z.config.name.as_deref(), Some("Living Room"));
        assert_eq!(z.config.max_hsp, Some(90.0));
        assert_eq!(z.period.system_mode, Some(HvacMode::Heat));
        assert_eq!(z.period.hsp, Some(68.0));
        assert_eq!(z.status.temperature, Some(72.0));
    }

    #[test]
    fn merge_is_idempotent() {
        let frag = fragment(json!({
            "id": 0,
            "config": { "name": "Den", "minCsp": 60.0 },
            "status": { "temperature": 71.5, "fan": true },
            "period": { "fanMode": "circulate", "csp": 74.0 }
        }));

        let mut once = zone();
        once.apply(&frag);

        let mut twice = zone();
        twice.apply(&frag);
        twice.apply(&frag);

        assert_eq!(once, twice);
    }

    #[test]
    fn later_fragments_overwrite_only_present_fields() {
        let mut z = zone();
        z.apply(&fragment(json!({
            "id": 0,
            "status": { "temperature": 70.0, "temperatureStatus": "good", "humidity": 40.0 }
        })));
        z.apply(&fragment(json!({
            "id": 0,
            "status": { "temperature": 68.0, "temperatureStatus": "not_exist" }
        })));

        assert_eq!(z.status.temperature, Some(68.0));
        assert_eq!(z.status.temperature_status, Some(ReadingQuality::Degraded));
        assert_eq!(z.status.humidity, Some(40.0));
    }

    #[test]
    fn unique_id_is_deterministic_per_system_and_index() {
        assert_eq!(Zone::placeholder("sys-1", 0).unique_id(), "sys-1_0");
        assert_eq!(Zone::placeholder("sys-1", 3).unique_id(), "sys-1_3");
        assert_eq!(Zone::placeholder("sys-2", 3).unique_id(), "sys-2_3");
    }
}
