//! Hardware configuration constants for the ESP32-S3 camera board with the
//! LoRaWAN shuttle module

/// Shuttle module on the I2C bus
pub mod shuttle {
    /// 7-bit bus address of the shuttle
    pub const ADDRESS: u8 = 0x55;

    /// Largest register payload the shuttle accepts in one frame.
    /// Longer payloads are truncated, never rejected.
    pub const MAX_REGISTER_PAYLOAD: usize = 222;

    /// One frame: register id byte plus the payload
    pub const MAX_FRAME_SIZE: usize = MAX_REGISTER_PAYLOAD + 1;

    /// Per-transaction bound, enforced by the platform bus driver
    pub const TRANSACTION_TIMEOUT_MS: u32 = 1000;
}

/// I2C pins (the camera SCCB bus, shared with the shuttle)
pub mod i2c {
    pub const SDA: u8 = 4;
    pub const SCL: u8 = 5;
    pub const FREQUENCY_KHZ: u32 = 100;
}

/// Status polling budgets
pub mod poll {
    /// Attempts while waiting for the joined flag after start
    pub const JOIN_ATTEMPTS: u32 = 100;

    /// Attempts while waiting for the success flag after a transmit trigger
    pub const SEND_ATTEMPTS: u32 = 300;

    /// Delay between status reads in milliseconds
    pub const INTERVAL_MS: u32 = 100;
}

/// Payload rendering
pub mod payload {
    /// Render buffer size. Larger than one frame so escaping never cuts a
    /// message short; the final clamp happens at the register codec.
    pub const RENDER_CAPACITY: usize = 512;
}

/// Per-cycle reporting
pub mod report {
    /// Most readings one cycle can carry
    pub const MAX_READINGS: usize = 8;

    /// Capacity of a reading name
    pub const NAME_LEN: usize = 32;

    /// Capacity of one rendered field value
    pub const FIELD_LEN: usize = 64;

    /// Capacity of an assembled report key, name plus the longest suffix
    pub const KEY_LEN: usize = 64;
}
