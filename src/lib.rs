#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod meter;
pub mod payload;
pub mod report;
pub mod settings;
pub mod shuttle;

// These modules depend on embassy features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
