// ── Account-level state store ──
//
// The systems map for one account, with merge routing and observer
// notification. DashMap's per-shard locking makes each system's merge
// atomic: a reader never sees a half-applied fragment. Observers are an
// explicit collection owned by this instance — no statics.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use icomfort_api::messages::{InboundMessage, SystemEntry};
use tracing::{debug, warn};

use crate::model::{System, Zone, ZoneKey};

/// Callback invoked with a snapshot of each active zone after an update.
pub type UpdateObserver = Arc<dyn Fn(&Zone) + Send + Sync>;

/// In-memory tree for one account: `sys_id -> System -> zones`.
pub struct AccountStore {
    systems: DashMap<String, System>,
    observers: RwLock<Vec<UpdateObserver>>,
}

impl AccountStore {
    pub(crate) fn new() -> Self {
        Self {
            systems: DashMap::new(),
            observers: RwLock::new(Vec::new()),
        }
    }

    // ── Population ───────────────────────────────────────────────────

    /// Register systems from a login enumeration. Existing entries keep
    /// their merged state; systems are never pruned mid-session.
    pub(crate) fn register_systems<'a>(
        &self,
        entries: impl Iterator<Item = &'a SystemEntry>,
    ) {
        for entry in entries {
            if !self.systems.contains_key(&entry.sys_id) {
                debug!(sys_id = %entry.sys_id, "discovered system");
                self.systems
                    .insert(entry.sys_id.clone(), System::new(entry.sys_id.clone()));
            }
        }
    }

    /// Route one inbound message's fragments into the model, then notify
    /// observers for every zone left active by the merge.
    pub(crate) fn apply_message(&self, message: &InboundMessage) {
        let mut updated: Vec<Zone> = Vec::new();

        {
            // Shard lock held for the whole merge: per-system atomicity.
            let mut system = self
                .systems
                .entry(message.sender_id.clone())
                .or_insert_with(|| System::new(message.sender_id.clone()));

            if let Some(fragment) = &message.data.system {
                system.apply(fragment);
            }
            if let Some(zones) = &message.data.zones {
                for fragment in zones {
                    if let Some(snapshot) = system.apply_zone(fragment) {
                        updated.push(snapshot);
                    }
                }
            }
        }

        for zone in &updated {
            self.notify(zone);
        }
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Register an update observer for the lifetime of this client.
    pub fn on_update(&self, observer: UpdateObserver) {
        self.observers
            .write()
            .expect("observer lock poisoned")
            .push(observer);
    }

    /// Invoke every observer with the updated zone. A panicking observer
    /// is isolated so it cannot block the others or the pump.
    fn notify(&self, zone: &Zone) {
        let observers = self.observers.read().expect("observer lock poisoned");
        for observer in observers.iter() {
            if catch_unwind(AssertUnwindSafe(|| observer(zone))).is_err() {
                warn!(zone = %zone.unique_id(), "update observer panicked; continuing");
            }
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Clone of every known system (zones included).
    pub fn systems_snapshot(&self) -> Vec<System> {
        self.systems.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Every currently-active zone across all systems.
    pub fn active_zones(&self) -> Vec<Zone> {
        self.systems
            .iter()
            .flat_map(|entry| entry.value().active_zones().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// Snapshot of one zone, if it has ever been referenced.
    pub fn zone(&self, key: &ZoneKey) -> Option<Zone> {
        self.systems
            .get(&key.system_id)
            .and_then(|system| system.zone(key.index).cloned())
    }

    pub(crate) fn system_ids(&self) -> Vec<String> {
        self.systems.iter().map(|entry| entry.key().clone()).collect()
    }

    /// True once every known system has at least one active zone.
    /// Vacuously true with no systems.
    pub(crate) fn all_systems_reporting(&self) -> bool {
        self.systems.iter().all(|entry| entry.value().has_active_zone())
    }

    /// Drop all state (shutdown path).
    pub(crate) fn clear(&self) {
        self.systems.clear();
        self.observers
            .write()
            .expect("observer lock poisoned")
            .clear();
    }
}
