//! Register map of the shuttle module
//!
//! Every register is write-only except STATUS, which is read-only.
//! A write frames the register id followed by the payload bytes; the status
//! read writes the one-byte selector and reads one byte back in the same
//! transaction.

/// Register ids
pub mod reg {
    /// Device EUI, 8 bytes
    pub const DEV_EUI: u8 = 0x01;
    /// Application EUI, 8 bytes
    pub const APP_EUI: u8 = 0x02;
    /// Application key, 16 bytes
    pub const APP_KEY: u8 = 0x03;
    /// Region code, 1 byte
    pub const REGION: u8 = 0x04;
    /// Channel mask, 6 little-endian u16 words
    pub const CHANNEL_MASK: u8 = 0x05;
    /// Default data rate, 1 byte
    pub const DEFAULT_DR: u8 = 0x06;
    /// Adaptive data rate flag, 1 byte
    pub const ADR: u8 = 0x07;
    /// Confirmed mode flag and retry count, 2 bytes
    pub const CONFIRMED: u8 = 0x08;
    /// Start LoRaWAN operation, no payload
    pub const START: u8 = 0x10;
    /// Uplink payload, up to 222 bytes
    pub const PAYLOAD: u8 = 0x11;
    /// Status register, read-only, 1 byte
    pub const STATUS: u8 = 0x12;
    /// Trigger transmission of the loaded payload, no payload
    pub const TRANSMIT: u8 = 0x13;
    /// Clear the transaction finished bit, no payload
    pub const CLEAR_FINISHED: u8 = 0x14;
}

/// Status register bit masks
pub mod status {
    /// Last transaction finished
    pub const DONE: u8 = 0x01;
    /// Last transaction succeeded
    pub const SUCCESS: u8 = 0x02;
    /// Network join completed
    pub const JOINED: u8 = 0x04;
    /// Send in progress
    pub const SEND: u8 = 0x08;
}

/// One snapshot of the status register.
///
/// Read fresh for every check; the shuttle updates the bits asynchronously,
/// so a snapshot is stale the moment it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// True when any bit of `mask` is set
    pub fn contains(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    pub fn is_done(self) -> bool {
        self.contains(status::DONE)
    }

    pub fn is_success(self) -> bool {
        self.contains(status::SUCCESS)
    }

    pub fn is_joined(self) -> bool {
        self.contains(status::JOINED)
    }

    pub fn is_send_pending(self) -> bool {
        self.contains(status::SEND)
    }
}
