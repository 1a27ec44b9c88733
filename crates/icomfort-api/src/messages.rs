// Wire types for the cloud messaging protocol.
//
// Inbound update fragments are deliberately sparse: every field is
// `Option` because the service sends only what changed, and an absent
// field must never be confused with an explicit zero/false. Fragments
// are applied by `icomfort-core` and then discarded — nothing here is
// a storage type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Enumerations ────────────────────────────────────────────────────

/// Operating mode of a zone. Wire strings are fixed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum HvacMode {
    #[serde(rename = "off")]
    #[strum(serialize = "off")]
    Off,
    #[serde(rename = "heat")]
    #[strum(serialize = "heat")]
    Heat,
    #[serde(rename = "cool")]
    #[strum(serialize = "cool")]
    Cool,
    #[serde(rename = "heat and cool")]
    #[strum(serialize = "heat and cool")]
    HeatAndCool,
    #[serde(rename = "emergency heat")]
    #[strum(serialize = "emergency heat")]
    EmergencyHeat,
}

/// Fan mode of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum FanMode {
    #[serde(rename = "auto")]
    #[strum(serialize = "auto")]
    Auto,
    #[serde(rename = "on")]
    #[strum(serialize = "on")]
    On,
    #[serde(rename = "circulate")]
    #[strum(serialize = "circulate")]
    Circulate,
}

/// Display-unit preference reported at the system level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum TemperatureUnit {
    #[serde(rename = "F")]
    #[strum(serialize = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    #[strum(serialize = "C")]
    Celsius,
}

/// Quality flag attached to sensor readings.
///
/// The service reports a handful of degraded states; consumers only care
/// whether a reading is trustworthy, so everything that isn't `good`
/// collapses into `Degraded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum ReadingQuality {
    #[strum(serialize = "good")]
    Good,
    #[serde(other)]
    #[strum(serialize = "degraded")]
    Degraded,
}

// ── Authenticate / login responses ──────────────────────────────────

/// Body returned by the certificate exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateResponse {
    #[serde(rename = "certificateToken", default)]
    pub certificate_token: Option<String>,
}

/// Body returned by the credential login: the bearer token plus the
/// account's home/system enumeration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "ServerAssignedRoot", default)]
    pub server_assigned_root: Option<ServerAssignedRoot>,
    #[serde(rename = "readyHomes", default)]
    pub ready_homes: Option<ReadyHomes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAssignedRoot {
    #[serde(rename = "serverAssigned", default)]
    pub server_assigned: Option<ServerAssigned>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAssigned {
    #[serde(default)]
    pub security: Option<Security>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Security {
    #[serde(rename = "userToken", default)]
    pub user_token: Option<UserToken>,
}

/// The bearer token and its absolute expiry.
#[derive(Debug, Clone, Deserialize)]
pub struct UserToken {
    pub encoded: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadyHomes {
    #[serde(default)]
    pub homes: Vec<HomeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeEntry {
    #[serde(rename = "homeId", default)]
    pub home_id: Option<i64>,
    #[serde(default)]
    pub systems: Vec<SystemEntry>,
}

/// One controller discovered during login enumeration.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemEntry {
    #[serde(rename = "sysId")]
    pub sys_id: String,
    #[serde(default)]
    pub id: Option<u32>,
}

impl LoginResponse {
    /// The bearer token, if the response carried one.
    pub fn user_token(&self) -> Option<&UserToken> {
        self.server_assigned_root
            .as_ref()?
            .server_assigned
            .as_ref()?
            .security
            .as_ref()?
            .user_token
            .as_ref()
    }

    /// All systems across all homes, in enumeration order.
    pub fn systems(&self) -> impl Iterator<Item = &SystemEntry> {
        self.ready_homes
            .iter()
            .flat_map(|r| r.homes.iter())
            .flat_map(|h| h.systems.iter())
    }
}

// ── Inbound update messages ─────────────────────────────────────────

/// Body returned by the retrieve-messages call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

/// One queued message. `SenderID` names the system the update came from.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "SenderID", alias = "SenderId")]
    pub sender_id: String,
    #[serde(rename = "MessageType", default)]
    pub message_type: Option<String>,
    #[serde(rename = "Data", default)]
    pub data: UpdateData,
}

/// The fragment payload of one message: at most one system-level fragment
/// and zero or more zone fragments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateData {
    #[serde(default)]
    pub system: Option<SystemFragment>,
    #[serde(default)]
    pub zones: Option<Vec<ZoneFragment>>,
}

/// Partial update for system-level attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemFragment {
    #[serde(default)]
    pub config: Option<SystemConfigFragment>,
    #[serde(default)]
    pub status: Option<SystemStatusFragment>,
    #[serde(default)]
    pub time: Option<SystemTimeFragment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfigFragment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "productType", default)]
    pub product_type: Option<String>,
    #[serde(rename = "temperatureUnit", default)]
    pub temperature_unit: Option<TemperatureUnit>,
    #[serde(rename = "numberOfZones", default)]
    pub number_of_zones: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemStatusFragment {
    #[serde(rename = "outdoorTemperature", default)]
    pub outdoor_temperature: Option<f64>,
    #[serde(rename = "outdoorTemperatureC", default)]
    pub outdoor_temperature_c: Option<f64>,
    #[serde(rename = "outdoorTemperatureStatus", default)]
    pub outdoor_temperature_status: Option<ReadingQuality>,
    #[serde(rename = "cloudStatus", default)]
    pub cloud_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemTimeFragment {
    #[serde(rename = "sysTime", default)]
    pub sys_time: Option<String>,
}

/// Partial update for one zone, addressed by zone index.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneFragment {
    pub id: u32,
    #[serde(default)]
    pub config: Option<ZoneConfigFragment>,
    #[serde(default)]
    pub status: Option<ZoneStatusFragment>,
    #[serde(default)]
    pub period: Option<PeriodFragment>,
}

/// Capability/config fields. Setpoint bounds arrive in both scales.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneConfigFragment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "minHsp", default)]
    pub min_hsp: Option<f64>,
    #[serde(rename = "maxHsp", default)]
    pub max_hsp: Option<f64>,
    #[serde(rename = "minHspC", default)]
    pub min_hsp_c: Option<f64>,
    #[serde(rename = "maxHspC", default)]
    pub max_hsp_c: Option<f64>,
    #[serde(rename = "minCsp", default)]
    pub min_csp: Option<f64>,
    #[serde(rename = "maxCsp", default)]
    pub max_csp: Option<f64>,
    #[serde(rename = "minCspC", default)]
    pub min_csp_c: Option<f64>,
    #[serde(rename = "maxCspC", default)]
    pub max_csp_c: Option<f64>,
    #[serde(rename = "heatingOption", default)]
    pub heating_option: Option<bool>,
    #[serde(rename = "coolingOption", default)]
    pub cooling_option: Option<bool>,
    #[serde(rename = "emergencyHeatingOption", default)]
    pub emergency_heating_option: Option<bool>,
    #[serde(rename = "humidificationOption", default)]
    pub humidification_option: Option<bool>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Live readings and equipment activity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneStatusFragment {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(rename = "temperatureC", default)]
    pub temperature_c: Option<f64>,
    #[serde(rename = "temperatureStatus", default)]
    pub temperature_status: Option<ReadingQuality>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(rename = "humidityStatus", default)]
    pub humidity_status: Option<ReadingQuality>,
    #[serde(default)]
    pub fan: Option<bool>,
    #[serde(default)]
    pub defrost: Option<bool>,
    #[serde(rename = "auxHeat", default)]
    pub aux_heat: Option<bool>,
    #[serde(default)]
    pub damper: Option<u32>,
    #[serde(default)]
    pub demand: Option<f64>,
}

/// The presently-in-effect schedule slot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodFragment {
    #[serde(rename = "systemMode", default)]
    pub system_mode: Option<HvacMode>,
    #[serde(rename = "fanMode", default)]
    pub fan_mode: Option<FanMode>,
    #[serde(default)]
    pub hsp: Option<f64>,
    #[serde(rename = "hspC", default)]
    pub hsp_c: Option<f64>,
    #[serde(default)]
    pub csp: Option<f64>,
    #[serde(rename = "cspC", default)]
    pub csp_c: Option<f64>,
    #[serde(default)]
    pub sp: Option<f64>,
    #[serde(rename = "spC", default)]
    pub sp_c: Option<f64>,
    #[serde(default)]
    pub husp: Option<f64>,
    #[serde(default)]
    pub desp: Option<f64>,
}

// ── Outbound envelopes ──────────────────────────────────────────────

/// Envelope for a data-path subscription request.
#[derive(Debug, Serialize)]
pub struct RequestDataMessage<'a> {
    #[serde(rename = "MessageType")]
    pub message_type: &'static str,
    #[serde(rename = "SenderID")]
    pub sender_id: &'a str,
    #[serde(rename = "MessageId")]
    pub message_id: Uuid,
    #[serde(rename = "TargetID")]
    pub target_id: &'a str,
    #[serde(rename = "AdditionalParameters")]
    pub additional_parameters: AdditionalParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct AdditionalParameters<'a> {
    #[serde(rename = "JSONPath")]
    pub json_path: &'a str,
}

impl<'a> RequestDataMessage<'a> {
    /// Build a request-data envelope with a fresh correlation id.
    pub fn new(sender_id: &'a str, target_id: &'a str, json_path: &'a str) -> Self {
        Self {
            message_type: "RequestData",
            sender_id,
            message_id: Uuid::new_v4(),
            target_id,
            additional_parameters: AdditionalParameters { json_path },
        }
    }
}

/// Envelope for a command publish.
#[derive(Debug, Serialize)]
pub struct CommandMessage<'a> {
    #[serde(rename = "MessageType")]
    pub message_type: &'static str,
    #[serde(rename = "SenderID")]
    pub sender_id: &'a str,
    #[serde(rename = "MessageId")]
    pub message_id: Uuid,
    #[serde(rename = "TargetID")]
    pub target_id: &'a str,
    #[serde(rename = "Data")]
    pub data: serde_json::Value,
}

impl<'a> CommandMessage<'a> {
    /// Build a command envelope with a fresh correlation id.
    pub fn new(sender_id: &'a str, target_id: &'a str, data: serde_json::Value) -> Self {
        Self {
            message_type: "Command",
            sender_id,
            message_id: Uuid::new_v4(),
            target_id,
            data,
        }
    }
}
