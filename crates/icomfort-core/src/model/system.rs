// One physical controller/gateway and the zones it owns.

use std::collections::BTreeMap;

use icomfort_api::messages::{
    ReadingQuality, SystemConfigFragment, SystemFragment, SystemStatusFragment,
    SystemTimeFragment, TemperatureUnit, ZoneFragment,
};
use serde::Serialize;

use super::zone::Zone;

/// One controller, identified by its stable external `sys_id`.
///
/// Created at login enumeration (or defensively on first fragment
/// reference) and never pruned during a session — a system that stops
/// reporting simply stops receiving updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    pub sys_id: String,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub outdoor_temperature: Option<f64>,
    pub outdoor_temperature_c: Option<f64>,
    pub outdoor_temperature_status: Option<ReadingQuality>,
    pub zone_count: Option<u32>,
    pub cloud_status: Option<String>,
    pub controller_time: Option<String>,
    zones: BTreeMap<u32, Zone>,
}

impl System {
    pub(crate) fn new(sys_id: impl Into<String>) -> Self {
        Self {
            sys_id: sys_id.into(),
            name: None,
            product_type: None,
            temperature_unit: None,
            outdoor_temperature: None,
            outdoor_temperature_c: None,
            outdoor_temperature_status: None,
            zone_count: None,
            cloud_status: None,
            controller_time: None,
            zones: BTreeMap::new(),
        }
    }

    /// All zones, placeholders included, in index order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn zone(&self, index: u32) -> Option<&Zone> {
        self.zones.get(&index)
    }

    /// Zones eligible for consumers, in index order.
    pub fn active_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values().filter(|z| z.is_active())
    }

    pub fn has_active_zone(&self) -> bool {
        self.zones.values().any(Zone::is_active)
    }

    /// Idempotent: returns the existing zone or creates a placeholder.
    pub(crate) fn get_or_create_zone(&mut self, index: u32) -> &mut Zone {
        let sys_id = self.sys_id.clone();
        self.zones
            .entry(index)
            .or_insert_with(|| Zone::placeholder(sys_id, index))
    }

    /// Overlay a system-level fragment.
    pub(crate) fn apply(&mut self, fragment: &SystemFragment) {
        if let Some(config) = &fragment.config {
            self.apply_config(config);
        }
        if let Some(status) = &fragment.status {
            self.apply_status(status);
        }
        if let Some(time) = &fragment.time {
            self.apply_time(time);
        }
    }

    /// Overlay a zone fragment, returning a snapshot of the zone if it
    /// is active after the merge.
    pub(crate) fn apply_zone(&mut self, fragment: &ZoneFragment) -> Option<Zone> {
        let zone = self.get_or_create_zone(fragment.id);
        zone.apply(fragment);
        zone.is_active().then(|| zone.clone())
    }

    fn apply_config(&mut self, fragment: &SystemConfigFragment) {
        overlay(&mut self.name, &fragment.name);
        overlay(&mut self.product_type, &fragment.product_type);
        overlay(&mut self.temperature_unit, &fragment.temperature_unit);
        overlay(&mut self.zone_count, &fragment.number_of_zones);
    }

    fn apply_status(&mut self, fragment: &SystemStatusFragment) {
        overlay(&mut self.outdoor_temperature, &fragment.outdoor_temperature);
        overlay(
            &mut self.outdoor_temperature_c,
            &fragment.outdoor_temperature_c,
        );
        overlay(
            &mut self.outdoor_temperature_status,
            &fragment.outdoor_temperature_status,
        );
        overlay(&mut self.cloud_status, &fragment.cloud_status);
    }

    fn apply_time(&mut self, fragment: &SystemTimeFragment) {
        overlay(&mut self.controller_time, &fragment.sys_time);
    }
}

fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if let Some(value) = src {
        *dst = Some(value.clone());
    }
}
