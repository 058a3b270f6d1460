//! Metering unit presets
//!
//! Maps the configured meter type keyword to the unit descriptor the
//! reporting layer publishes with. The keyword set mirrors the device
//! classes a typical home automation consumer understands.

/// Kind of quantity the meter counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterClass {
    Water,
    Gas,
    Energy,
    Temperature,
}

impl MeterClass {
    pub fn as_str(self) -> &'static str {
        match self {
            MeterClass::Water => "water",
            MeterClass::Gas => "gas",
            MeterClass::Energy => "energy",
            MeterClass::Temperature => "temperature",
        }
    }
}

/// Time base of the preset's rate unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hours,
    Minutes,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Hours => "h",
            TimeUnit::Minutes => "min",
        }
    }
}

/// Unit descriptor of one metering preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterUnits {
    pub class: MeterClass,
    pub value_unit: &'static str,
    pub time_unit: TimeUnit,
    pub rate_unit: &'static str,
}

impl MeterUnits {
    const fn new(
        class: MeterClass,
        value_unit: &'static str,
        time_unit: TimeUnit,
        rate_unit: &'static str,
    ) -> Self {
        Self {
            class,
            value_unit,
            time_unit,
            rate_unit,
        }
    }

    /// Look up a preset by its configuration keyword, case-insensitively.
    ///
    /// Returns None for keywords outside the supported set.
    pub fn from_key(key: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(name, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, units)| *units)
    }
}

/// Supported meter type keywords and their units
const PRESETS: &[(&str, MeterUnits)] = &[
    (
        "WATER_M3",
        MeterUnits::new(MeterClass::Water, "m³", TimeUnit::Hours, "m³/h"),
    ),
    (
        "WATER_L",
        MeterUnits::new(MeterClass::Water, "L", TimeUnit::Hours, "L/h"),
    ),
    (
        "WATER_FT3",
        MeterUnits::new(MeterClass::Water, "ft³", TimeUnit::Minutes, "ft³/min"),
    ),
    (
        "WATER_GAL",
        MeterUnits::new(MeterClass::Water, "gal", TimeUnit::Hours, "gal/h"),
    ),
    (
        "GAS_M3",
        MeterUnits::new(MeterClass::Gas, "m³", TimeUnit::Hours, "m³/h"),
    ),
    (
        "GAS_FT3",
        MeterUnits::new(MeterClass::Gas, "ft³", TimeUnit::Minutes, "ft³/min"),
    ),
    (
        "ENERGY_WH",
        MeterUnits::new(MeterClass::Energy, "Wh", TimeUnit::Hours, "W"),
    ),
    (
        "ENERGY_KWH",
        MeterUnits::new(MeterClass::Energy, "kWh", TimeUnit::Hours, "kW"),
    ),
    (
        "ENERGY_MWH",
        MeterUnits::new(MeterClass::Energy, "MWh", TimeUnit::Hours, "MW"),
    ),
    (
        "ENERGY_GJ",
        MeterUnits::new(MeterClass::Energy, "GJ", TimeUnit::Hours, "GJ/h"),
    ),
    (
        "TEMPERATURE_C",
        MeterUnits::new(MeterClass::Temperature, "°C", TimeUnit::Minutes, "°C/min"),
    ),
    (
        "TEMPERATURE_F",
        MeterUnits::new(MeterClass::Temperature, "°F", TimeUnit::Minutes, "°F/min"),
    ),
    (
        "TEMPERATURE_K",
        MeterUnits::new(MeterClass::Temperature, "K", TimeUnit::Minutes, "K/m"),
    ),
];
