//! Shuttle register codec
//!
//! Frames typed register accesses into bus transactions. A write carries the
//! register id followed by the payload in one transaction; the status read
//! writes the one-byte selector and reads the reply in a single
//! write-then-read transaction. Per-transaction deadlines are the platform
//! bus driver's responsibility.

use crate::config::shuttle::{ADDRESS, MAX_FRAME_SIZE, MAX_REGISTER_PAYLOAD};
use crate::shuttle::registers::{reg, Status};
use crate::shuttle::traits::ShuttleError;
use embedded_hal_async::i2c::{Error, I2c};

/// Register codec for the shuttle at its fixed bus address
pub struct ShuttleClient<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> ShuttleClient<I2C> {
    /// Create a client on the shared bus
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: ADDRESS,
        }
    }

    /// Release the bus handle
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Write one register frame.
    ///
    /// The payload is silently clamped to the frame capacity. Truncation is
    /// part of the contract, not an error.
    async fn write_register(&mut self, register: u8, payload: &[u8]) -> Result<(), ShuttleError> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        buf[0] = register;
        let len = payload.len().min(MAX_REGISTER_PAYLOAD);
        buf[1..1 + len].copy_from_slice(&payload[..len]);

        self.i2c
            .write(self.address, &buf[..1 + len])
            .await
            .map_err(|e| ShuttleError::Bus(e.kind()))
    }

    /// Read one register in a single write-then-read transaction
    async fn read_register(&mut self, register: u8, reply: &mut [u8]) -> Result<(), ShuttleError> {
        self.i2c
            .write_read(self.address, &[register], reply)
            .await
            .map_err(|e| ShuttleError::Bus(e.kind()))
    }

    /// Set the device EUI
    pub async fn set_dev_eui(&mut self, eui: &[u8; 8]) -> Result<(), ShuttleError> {
        self.write_register(reg::DEV_EUI, eui).await
    }

    /// Set the application EUI
    pub async fn set_app_eui(&mut self, eui: &[u8; 8]) -> Result<(), ShuttleError> {
        self.write_register(reg::APP_EUI, eui).await
    }

    /// Set the application key
    pub async fn set_app_key(&mut self, key: &[u8; 16]) -> Result<(), ShuttleError> {
        self.write_register(reg::APP_KEY, key).await
    }

    /// Set the LoRaWAN region code
    pub async fn set_region(&mut self, region: u8) -> Result<(), ShuttleError> {
        self.write_register(reg::REGION, &[region]).await
    }

    /// Set the channel mask, encoded as six little-endian words
    pub async fn set_channel_mask(&mut self, mask: &[u16; 6]) -> Result<(), ShuttleError> {
        let mut buf = [0u8; 12];
        for (chunk, word) in buf.chunks_exact_mut(2).zip(mask.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        self.write_register(reg::CHANNEL_MASK, &buf).await
    }

    /// Set the default data rate
    pub async fn set_default_data_rate(&mut self, dr: u8) -> Result<(), ShuttleError> {
        self.write_register(reg::DEFAULT_DR, &[dr]).await
    }

    /// Enable or disable adaptive data rate
    pub async fn set_adr(&mut self, enabled: bool) -> Result<(), ShuttleError> {
        self.write_register(reg::ADR, &[enabled as u8]).await
    }

    /// Set confirmed/unconfirmed mode and the retry count.
    ///
    /// The retry byte is forwarded as-is; its interpretation belongs to the
    /// shuttle.
    pub async fn set_confirmed(&mut self, enabled: bool, retries: u8) -> Result<(), ShuttleError> {
        self.write_register(reg::CONFIRMED, &[enabled as u8, retries])
            .await
    }

    /// Start LoRaWAN operation
    pub async fn start(&mut self) -> Result<(), ShuttleError> {
        self.write_register(reg::START, &[]).await
    }

    /// Load an uplink payload
    pub async fn send_payload(&mut self, payload: &[u8]) -> Result<(), ShuttleError> {
        self.write_register(reg::PAYLOAD, payload).await
    }

    /// Read the status register
    pub async fn status(&mut self) -> Result<Status, ShuttleError> {
        let mut reply = [0u8; 1];
        self.read_register(reg::STATUS, &mut reply).await?;
        Ok(Status(reply[0]))
    }

    /// Trigger transmission of the loaded payload
    pub async fn trigger_send(&mut self) -> Result<(), ShuttleError> {
        self.write_register(reg::TRANSMIT, &[]).await
    }

    /// Clear the transaction finished bit
    pub async fn clear_finished(&mut self) -> Result<(), ShuttleError> {
        self.write_register(reg::CLEAR_FINISHED, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuttle::registers::status;
    use crate::shuttle::traits::mock::MockShuttleBus;
    use embedded_hal_async::i2c::ErrorKind;

    #[test]
    fn test_credential_frames() {
        let mut client = ShuttleClient::new(MockShuttleBus::new());

        futures::executor::block_on(async {
            client.set_dev_eui(&[1, 2, 3, 4, 5, 6, 7, 8]).await.unwrap();
            client.set_app_eui(&[9, 10, 11, 12, 13, 14, 15, 16]).await.unwrap();
            client.set_app_key(&[0xAA; 16]).await.unwrap();
        });

        let bus = client.release();
        let writes = bus.get_writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].address, ADDRESS);
        assert_eq!(writes[0].bytes.as_slice(), &[0x01, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(writes[1].bytes.as_slice(), &[0x02, 9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(writes[2].bytes[0], 0x03);
        assert_eq!(&writes[2].bytes[1..], &[0xAA; 16]);
    }

    #[test]
    fn test_channel_mask_little_endian() {
        let mut client = ShuttleClient::new(MockShuttleBus::new());

        futures::executor::block_on(async {
            client.set_channel_mask(&[1, 2, 3, 4, 5, 6]).await.unwrap();
        });

        let bus = client.release();
        let writes = bus.get_writes();
        assert_eq!(
            writes[0].bytes.as_slice(),
            &[0x05, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]
        );
    }

    #[test]
    fn test_oversized_payload_is_clamped() {
        let mut client = ShuttleClient::new(MockShuttleBus::new());
        let payload = [0x41u8; 300];

        futures::executor::block_on(async {
            client.send_payload(&payload).await.unwrap();
        });

        let bus = client.release();
        let writes = bus.get_writes();
        assert_eq!(writes[0].bytes.len(), 1 + MAX_REGISTER_PAYLOAD);
        assert_eq!(writes[0].bytes[0], 0x11);
        assert_eq!(&writes[0].bytes[1..], &payload[..MAX_REGISTER_PAYLOAD]);
    }

    #[test]
    fn test_commands_without_payload() {
        let mut client = ShuttleClient::new(MockShuttleBus::new());

        futures::executor::block_on(async {
            client.start().await.unwrap();
            client.trigger_send().await.unwrap();
            client.clear_finished().await.unwrap();
        });

        let bus = client.release();
        let writes = bus.get_writes();
        assert_eq!(writes[0].bytes.as_slice(), &[0x10]);
        assert_eq!(writes[1].bytes.as_slice(), &[0x13]);
        assert_eq!(writes[2].bytes.as_slice(), &[0x14]);
    }

    #[test]
    fn test_status_read() {
        let bus = MockShuttleBus::new();
        bus.push_status(status::DONE | status::SUCCESS | status::JOINED);
        let mut client = ShuttleClient::new(bus);

        futures::executor::block_on(async {
            let reading = client.status().await.unwrap();
            assert!(reading.is_done());
            assert!(reading.is_success());
            assert!(reading.is_joined());
            assert!(!reading.is_send_pending());
        });

        let bus = client.release();
        assert_eq!(bus.get_status_reads(), 1);
        // The selector write is part of the read transaction, not a register write
        assert!(bus.get_writes().is_empty());
    }

    #[test]
    fn test_bus_error_carries_kind() {
        let bus = MockShuttleBus::new();
        bus.set_next_write_error(0x07, ErrorKind::Other);
        let mut client = ShuttleClient::new(bus);

        futures::executor::block_on(async {
            let result = client.set_adr(true).await;
            assert_eq!(result, Err(ShuttleError::Bus(ErrorKind::Other)));
        });
    }
}
