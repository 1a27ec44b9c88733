// ── Command payload builders ──
//
// Setpoint/mode/fan writes are never direct field writes: the service's
// write model is a schedule-period write against the zone's manual-mode
// schedule slot, and the payloads here mirror that exactly. This is
// also where the Celsius mirror of a Fahrenheit setpoint is computed —
// the data model itself never converts between scales.

use icomfort_api::messages::{FanMode, HvacMode};
use serde_json::{Value, json};

use crate::error::ClientError;

/// Requested setpoint changes, in Fahrenheit. At least one must be set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetpointChange {
    pub hsp: Option<f64>,
    pub csp: Option<f64>,
}

/// The manual-mode schedule id for a zone: the manual block starts at a
/// fixed base id and each zone owns the slot at `base + index`.
pub fn manual_schedule_id(base: u32, zone_index: u32) -> u32 {
    base + zone_index
}

/// Fahrenheit to Celsius, rounded to one decimal the way the service
/// reports Celsius values.
pub fn fahrenheit_to_celsius(degrees: f64) -> f64 {
    ((degrees - 32.0) * 5.0 / 9.0 * 10.0).round() / 10.0
}

/// Period write that switches a zone's operating mode.
pub(crate) fn hvac_mode_payload(base: u32, zone_index: u32, mode: HvacMode) -> Value {
    schedule_write(
        manual_schedule_id(base, zone_index),
        json!({ "systemMode": mode }),
    )
}

/// Period write that switches a zone's fan mode.
pub(crate) fn fan_mode_payload(base: u32, zone_index: u32, mode: FanMode) -> Value {
    schedule_write(
        manual_schedule_id(base, zone_index),
        json!({ "fanMode": mode }),
    )
}

/// Period write that changes heating/cooling setpoints, mirroring each
/// into Celsius.
pub(crate) fn setpoint_payload(
    base: u32,
    zone_index: u32,
    change: &SetpointChange,
) -> Result<Value, ClientError> {
    if change.hsp.is_none() && change.csp.is_none() {
        return Err(ClientError::BadParameters {
            message: "setpoint change requires at least one of hsp/csp".into(),
        });
    }

    let mut period = serde_json::Map::new();
    if let Some(hsp) = change.hsp {
        period.insert("hsp".into(), json!(hsp));
        period.insert("hspC".into(), json!(fahrenheit_to_celsius(hsp)));
    }
    if let Some(csp) = change.csp {
        period.insert("csp".into(), json!(csp));
        period.insert("cspC".into(), json!(fahrenheit_to_celsius(csp)));
    }

    Ok(schedule_write(
        manual_schedule_id(base, zone_index),
        Value::Object(period),
    ))
}

/// Wrap a period object in the schedule-write envelope the service
/// expects: one schedule, one period, period id 0.
fn schedule_write(schedule_id: u32, period: Value) -> Value {
    json!({
        "schedules": [
            {
                "id": schedule_id,
                "schedule": {
                    "periods": [
                        { "id": 0, "period": period }
                    ]
                }
            }
        ]
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn manual_schedule_ids_step_with_zone_index() {
        assert_eq!(manual_schedule_id(16, 0), 16);
        assert_eq!(manual_schedule_id(16, 1), 17);
        assert_eq!(manual_schedule_id(16, 2), 18);
    }

    #[test]
    fn celsius_mirror_rounds_to_one_decimal() {
        assert_eq!(fahrenheit_to_celsius(68.0), 20.0);
        assert_eq!(fahrenheit_to_celsius(72.0), 22.2);
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
    }

    #[test]
    fn heating_setpoint_writes_manual_schedule_slot() {
        let payload = setpoint_payload(
            16,
            1,
            &SetpointChange {
                hsp: Some(68.0),
                csp: None,
            },
        )
        .unwrap();

        assert_eq!(
            payload,
            serde_json::json!({
                "schedules": [
                    {
                        "id": 17,
                        "schedule": {
                            "periods": [
                                { "id": 0, "period": { "hsp": 68.0, "hspC": 20.0 } }
                            ]
                        }
                    }
                ]
            })
        );
    }

    #[test]
    fn empty_setpoint_change_is_rejected() {
        let result = setpoint_payload(16, 0, &SetpointChange::default());
        assert!(matches!(result, Err(ClientError::BadParameters { .. })));
    }

    #[test]
    fn mode_payload_targets_period_zero() {
        let payload = hvac_mode_payload(16, 0, HvacMode::HeatAndCool);
        assert_eq!(
            payload["schedules"][0]["schedule"]["periods"][0]["period"]["systemMode"],
            "heat and cool"
        );
        assert_eq!(payload["schedules"][0]["id"], 16);
    }
}
