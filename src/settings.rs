//! LoRaWAN provisioning settings
//!
//! Application layer for the `[LORAWAN]` configuration section. Credentials
//! are parsed from hex strings with per-field validation; a rejected value
//! leaves the field as it was, so one typo cannot wipe the rest of the
//! provisioning data. Reading the section text from storage happens
//! elsewhere.

use crate::meter::{MeterClass, MeterUnits, TimeUnit};
use core::fmt;
use log::error;

/// Errors raised while applying configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Value does not have the required number of hex digits
    WrongLength,
    /// Value contains a character outside 0-9, a-f
    InvalidHexDigit,
    /// Meter type keyword is not in the supported set
    UnknownMeterType,
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn decode_hex<const N: usize>(value: &str) -> Result<[u8; N], SettingsError> {
    let digits = value.as_bytes();
    if digits.len() != N * 2 {
        return Err(SettingsError::WrongLength);
    }

    let mut out = [0u8; N];
    for (index, pair) in digits.chunks_exact(2).enumerate() {
        let hi = hex_nibble(pair[0]).ok_or(SettingsError::InvalidHexDigit)?;
        let lo = hex_nibble(pair[1]).ok_or(SettingsError::InvalidHexDigit)?;
        out[index] = (hi << 4) | lo;
    }
    Ok(out)
}

fn encode_hex(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X}", byte)?;
    }
    Ok(())
}

/// Device EUI, parsed from exactly 16 hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevEui([u8; 8]);

impl DevEui {
    pub fn from_hex(value: &str) -> Result<Self, SettingsError> {
        Ok(Self(decode_hex(value)?))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for DevEui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_hex(&self.0, f)
    }
}

/// Application EUI, parsed from exactly 16 hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppEui([u8; 8]);

impl AppEui {
    pub fn from_hex(value: &str) -> Result<Self, SettingsError> {
        Ok(Self(decode_hex(value)?))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for AppEui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_hex(&self.0, f)
    }
}

/// Application key, parsed from exactly 32 hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppKey([u8; 16]);

impl AppKey {
    pub fn from_hex(value: &str) -> Result<Self, SettingsError> {
        Ok(Self(decode_hex(value)?))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_hex(&self.0, f)
    }
}

/// Confirmed-uplink mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedMode {
    pub enabled: bool,
    /// Retry count, forwarded to the shuttle as-is
    pub retries: u8,
}

/// Optional network parameters pushed during provisioning.
///
/// Whatever is present is written to the shuttle after the credentials and
/// before the start command; absent values leave the shuttle's defaults
/// untouched. Values are set programmatically, not from the config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkConfig {
    /// Region code as the shuttle defines it
    pub region: Option<u8>,
    pub channel_mask: Option<[u16; 6]>,
    pub default_data_rate: Option<u8>,
    pub adr: Option<bool>,
    pub confirmed: Option<ConfirmedMode>,
}

/// Everything the session needs to provision the shuttle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LorawanSettings {
    pub dev_eui: Option<DevEui>,
    pub app_eui: Option<AppEui>,
    pub app_key: Option<AppKey>,
    pub meter: Option<MeterUnits>,
    pub network: NetworkConfig,
}

impl LorawanSettings {
    /// True once every credential register can be provisioned
    pub fn has_credentials(&self) -> bool {
        self.dev_eui.is_some() && self.app_eui.is_some() && self.app_key.is_some()
    }

    /// Time unit of the configured preset, minutes when none is set
    pub fn time_unit(&self) -> TimeUnit {
        self.meter.map(|units| units.time_unit).unwrap_or(TimeUnit::Minutes)
    }

    /// Override the metering units outside the keyword presets
    pub fn set_meter_units(
        &mut self,
        class: MeterClass,
        value_unit: &'static str,
        time_unit: TimeUnit,
        rate_unit: &'static str,
    ) {
        self.meter = Some(MeterUnits {
            class,
            value_unit,
            time_unit,
            rate_unit,
        });
    }

    /// Apply one configuration value.
    ///
    /// Keys are matched case-insensitively; keys that belong to other
    /// sections of the configuration file are ignored. A rejected value
    /// leaves the field unchanged.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        if key.eq_ignore_ascii_case("METERTYPE") {
            match MeterUnits::from_key(value) {
                Some(units) => {
                    self.meter = Some(units);
                    Ok(())
                }
                None => Err(SettingsError::UnknownMeterType),
            }
        } else if key.eq_ignore_ascii_case("DEVEUI") {
            self.dev_eui = Some(DevEui::from_hex(value)?);
            Ok(())
        } else if key.eq_ignore_ascii_case("APPEUI") {
            self.app_eui = Some(AppEui::from_hex(value)?);
            Ok(())
        } else if key.eq_ignore_ascii_case("APPKEY") {
            self.app_key = Some(AppKey::from_hex(value)?);
            Ok(())
        } else {
            Ok(())
        }
    }

    /// Apply every `Key = Value` line of a `[LORAWAN]` section.
    ///
    /// Blank lines, `;` comments and the section header are skipped.
    /// Rejected values are logged and parsing continues with the next line.
    pub fn apply_section(&mut self, section: &str) {
        for line in section.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('[') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if let Err(err) = self.apply(key, value) {
                error!("LORAWAN: rejected value for {}: {:?}", key, err);
            }
        }
    }
}
