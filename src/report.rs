//! Per-cycle reporting over the shuttle link
//!
//! Each digitisation cycle produces one [CycleSummary]: the battery voltage
//! and the post-processed readings. Every non-empty field of every reading
//! goes out as its own key/value publish, the key being the reading name with
//! a fixed suffix appended. A failed publish is counted and the cycle carries
//! on with the remaining fields.

use crate::config::report::{FIELD_LEN, KEY_LEN, MAX_READINGS, NAME_LEN};
use crate::meter::TimeUnit;
use crate::shuttle::traits::{ShuttleError, ShuttleLink};
use core::fmt::Write;
use heapless::{String, Vec};
use log::{info, warn};

/// Copy `value` into a bounded string, truncating at a character boundary
/// when it does not fit.
pub fn bounded<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// One post-processed reading. Empty fields are not published.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlowReport {
    pub name: String<NAME_LEN>,
    /// Latest accepted value
    pub value: String<FIELD_LEN>,
    /// Diagnostic from the digitisation pipeline
    pub error: String<FIELD_LEN>,
    /// Rate as rendered by the pipeline, always per minute
    pub rate: String<FIELD_LEN>,
    /// Numeric per-minute rate, used for the per-hour conversion
    pub rate_per_minute: f32,
    /// Change since the previous digitisation round
    pub change_absolute: String<FIELD_LEN>,
    /// Raw recognition result before post-processing
    pub raw: String<FIELD_LEN>,
    /// Timestamp of the reading
    pub timestamp: String<FIELD_LEN>,
}

impl FlowReport {
    /// Empty report carrying only a name; fill the fields that exist.
    pub fn named(name: &str) -> Self {
        Self {
            name: bounded(name),
            ..Self::default()
        }
    }
}

/// Everything one cycle publishes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleSummary {
    /// Battery voltage in millivolts, absent when the ADC read failed
    pub battery_millivolts: Option<u32>,
    pub readings: Vec<FlowReport, MAX_READINGS>,
}

/// Publish one cycle over the link. Returns the number of failed publishes;
/// zero means the whole cycle went out.
pub async fn publish_cycle<L: ShuttleLink>(link: &mut L, summary: &CycleSummary) -> u32 {
    info!("Report: publishing cycle data");

    let mut failures = 0;

    if let Some(millivolts) = summary.battery_millivolts {
        let mut text: String<FIELD_LEN> = String::new();
        let _ = write!(text, "{}", millivolts);
        if link
            .publish("battery_voltage_value_mV", &text)
            .await
            .is_err()
        {
            failures += 1;
        }
    }

    for reading in &summary.readings {
        failures += publish_reading(link, reading).await;
    }

    if failures > 0 {
        warn!("Report: {} values failed to publish", failures);
    }
    failures
}

async fn publish_reading<L: ShuttleLink>(link: &mut L, reading: &FlowReport) -> u32 {
    let mut failures = 0;
    let name = reading.name.as_str();

    if !reading.value.is_empty() && publish_field(link, name, "value", &reading.value).await.is_err()
    {
        failures += 1;
    }
    if !reading.error.is_empty() && publish_field(link, name, "error", &reading.error).await.is_err()
    {
        failures += 1;
    }

    if !reading.rate.is_empty() {
        if publish_field(link, name, "rate", &reading.rate).await.is_err() {
            failures += 1;
        }

        // The stored rate is per minute; hour-based meters get it scaled up
        let sent = if link.time_unit() == TimeUnit::Hours {
            let mut converted: String<FIELD_LEN> = String::new();
            let _ = write!(converted, "{}", reading.rate_per_minute * 60.0);
            publish_field(link, name, "rate_per_time_unit", &converted).await
        } else {
            publish_field(link, name, "rate_per_time_unit", &reading.rate).await
        };
        if sent.is_err() {
            failures += 1;
        }
    }

    if !reading.change_absolute.is_empty() {
        // "changeabsolut" is the original key, kept next to the renamed one
        if publish_field(link, name, "changeabsolut", &reading.change_absolute)
            .await
            .is_err()
        {
            failures += 1;
        }
        if publish_field(
            link,
            name,
            "rate_per_digitization_round",
            &reading.change_absolute,
        )
        .await
        .is_err()
        {
            failures += 1;
        }
    }

    if !reading.raw.is_empty() && publish_field(link, name, "raw", &reading.raw).await.is_err() {
        failures += 1;
    }
    if !reading.timestamp.is_empty()
        && publish_field(link, name, "timestamp", &reading.timestamp)
            .await
            .is_err()
    {
        failures += 1;
    }

    failures
}

async fn publish_field<L: ShuttleLink>(
    link: &mut L,
    name: &str,
    suffix: &str,
    value: &str,
) -> Result<(), ShuttleError> {
    let mut key: String<KEY_LEN> = String::new();
    let _ = key.push_str(name);
    let _ = key.push_str(suffix);
    link.publish(&key, value).await
}
