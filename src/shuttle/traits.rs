//! Shuttle link trait for abstraction and testability
//!
//! This trait defines the interface the reporting layer drives, allowing the
//! real bus-backed session to be swapped with a mock for testing.

use crate::meter::TimeUnit;
use core::future::Future;
use embedded_hal_async::i2c::ErrorKind;

/// Errors that can occur while driving the shuttle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuttleError {
    /// Bus transaction failed
    Bus(ErrorKind),
    /// Session used before being enabled
    Disabled,
    /// A required credential has not been configured
    MissingCredentials,
    /// Joined flag not reported within the poll budget
    JoinTimeout,
    /// Uplink not acknowledged within the poll budget
    SendTimeout,
}

/// Abstract shuttle link interface for testability
///
/// This trait allows the reporting layer to work with either the real
/// bus-backed session or a mock implementation for testing.
pub trait ShuttleLink {
    /// Provision the shuttle and join the network.
    ///
    /// Idempotent: returns immediately once joined.
    fn init(&mut self) -> impl Future<Output = Result<(), ShuttleError>>;

    /// Publish one key/content pair as a single uplink.
    ///
    /// Joins first if the link is not up yet. Blocks until the shuttle
    /// acknowledges the uplink or the poll budget runs out.
    fn publish(&mut self, key: &str, content: &str)
        -> impl Future<Output = Result<(), ShuttleError>>;

    /// Time unit of the configured metering preset
    fn time_unit(&self) -> TimeUnit;
}

#[cfg(test)]
pub mod mock {
    //! Mock bus, delay and link for testing

    use super::*;
    use crate::config::shuttle::MAX_FRAME_SIZE;
    use core::cell::{Cell, RefCell};
    use embedded_hal_async::delay::DelayNs;
    use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
    use heapless::{String, Vec};

    /// One recorded write transaction
    #[derive(Debug, Clone)]
    pub struct WriteFrame {
        /// Bus address the frame targeted
        pub address: u8,
        /// Frame bytes, register id first
        pub bytes: Vec<u8, MAX_FRAME_SIZE>,
    }

    impl WriteFrame {
        /// Register id of the frame (first byte)
        pub fn register(&self) -> u8 {
            self.bytes[0]
        }
    }

    /// Mock I2C bus playing the shuttle's part
    ///
    /// Records every write frame, including ones that fail by injection, and
    /// serves a scripted sequence of status replies to reads. Once the script
    /// is exhausted the fallback status is repeated.
    pub struct MockShuttleBus {
        /// Record of write frames
        writes: RefCell<Vec<WriteFrame, 32>>,
        /// Scripted status replies, served front to back
        status_script: RefCell<Vec<Result<u8, ErrorKind>, 512>>,
        /// Reply once the script is exhausted
        fallback_status: Cell<u8>,
        /// Error to return on the next write to a given register
        next_write_error: RefCell<Option<(u8, ErrorKind)>>,
        /// Number of status reads served
        status_reads: Cell<u32>,
    }

    impl MockShuttleBus {
        /// Create a new mock bus
        pub fn new() -> Self {
            Self {
                writes: RefCell::new(Vec::new()),
                status_script: RefCell::new(Vec::new()),
                fallback_status: Cell::new(0x00),
                next_write_error: RefCell::new(None),
                status_reads: Cell::new(0),
            }
        }

        /// Queue one status reply
        pub fn push_status(&self, status: u8) {
            let _ = self.status_script.borrow_mut().push(Ok(status));
        }

        /// Queue one failing status read
        pub fn push_status_error(&self, kind: ErrorKind) {
            let _ = self.status_script.borrow_mut().push(Err(kind));
        }

        /// Set the reply served once the script is exhausted
        pub fn set_fallback_status(&self, status: u8) {
            self.fallback_status.set(status);
        }

        /// Fail the next write whose register id matches
        pub fn set_next_write_error(&self, register: u8, kind: ErrorKind) {
            *self.next_write_error.borrow_mut() = Some((register, kind));
        }

        /// Get all recorded write frames
        pub fn get_writes(&self) -> Vec<WriteFrame, 32> {
            self.writes.borrow().clone()
        }

        /// Count recorded writes to one register
        pub fn writes_to(&self, register: u8) -> usize {
            self.writes
                .borrow()
                .iter()
                .filter(|frame| frame.register() == register)
                .count()
        }

        /// Number of status reads served so far
        pub fn get_status_reads(&self) -> u32 {
            self.status_reads.get()
        }
    }

    impl Default for MockShuttleBus {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ErrorType for MockShuttleBus {
        type Error = ErrorKind;
    }

    impl I2c for MockShuttleBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            // A transaction containing a read is a register read; its
            // selector write is not recorded as a register write.
            let has_read = operations
                .iter()
                .any(|op| matches!(op, Operation::Read(_)));

            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        if has_read {
                            continue;
                        }
                        let data: &[u8] = bytes;

                        let mut frame = Vec::new();
                        let _ = frame.extend_from_slice(data);
                        let _ = self.writes.borrow_mut().push(WriteFrame {
                            address,
                            bytes: frame,
                        });

                        let mut pending = self.next_write_error.borrow_mut();
                        if let Some((register, kind)) = *pending {
                            if data.first() == Some(&register) {
                                *pending = None;
                                return Err(kind);
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        self.status_reads.set(self.status_reads.get() + 1);

                        let reply = {
                            let mut script = self.status_script.borrow_mut();
                            if script.is_empty() {
                                Ok(self.fallback_status.get())
                            } else {
                                script.remove(0)
                            }
                        };

                        match reply {
                            Ok(status) => {
                                if let Some(slot) = buf.first_mut() {
                                    *slot = status;
                                }
                            }
                            Err(kind) => return Err(kind),
                        }
                    }
                }
            }

            Ok(())
        }
    }

    /// Delay that completes immediately so poll loops run at full speed
    pub struct MockDelay;

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Mock shuttle link for testing the reporting layer
    pub struct MockShuttleLink {
        /// Record of published key/content pairs
        published: RefCell<Vec<(String<64>, String<256>), 32>>,
        /// Fail publishes whose key matches
        fail_key: RefCell<Option<(String<64>, ShuttleError)>>,
        /// Error to return on the next init() call
        next_init_error: RefCell<Option<ShuttleError>>,
        /// Number of init() calls
        init_calls: Cell<u32>,
        /// Time unit reported to the conversion logic
        time_unit: Cell<TimeUnit>,
    }

    impl MockShuttleLink {
        /// Create a new mock link
        pub fn new() -> Self {
            Self {
                published: RefCell::new(Vec::new()),
                fail_key: RefCell::new(None),
                next_init_error: RefCell::new(None),
                init_calls: Cell::new(0),
                time_unit: Cell::new(TimeUnit::Minutes),
            }
        }

        /// Fail every publish for the given key
        pub fn set_fail_key(&self, key: &str, error: ShuttleError) {
            let mut stored = String::new();
            let _ = stored.push_str(key);
            *self.fail_key.borrow_mut() = Some((stored, error));
        }

        /// Set an error to be returned by the next init() call
        pub fn set_next_init_error(&self, error: ShuttleError) {
            *self.next_init_error.borrow_mut() = Some(error);
        }

        /// Set the reported time unit
        pub fn set_time_unit(&self, unit: TimeUnit) {
            self.time_unit.set(unit);
        }

        /// Get all published key/content pairs
        pub fn get_published(&self) -> Vec<(String<64>, String<256>), 32> {
            self.published.borrow().clone()
        }

        /// Number of init() calls seen
        pub fn get_init_calls(&self) -> u32 {
            self.init_calls.get()
        }
    }

    impl Default for MockShuttleLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ShuttleLink for MockShuttleLink {
        async fn init(&mut self) -> Result<(), ShuttleError> {
            self.init_calls.set(self.init_calls.get() + 1);
            if let Some(error) = self.next_init_error.borrow_mut().take() {
                return Err(error);
            }
            Ok(())
        }

        async fn publish(&mut self, key: &str, content: &str) -> Result<(), ShuttleError> {
            if let Some((ref fail, error)) = *self.fail_key.borrow() {
                if fail.as_str() == key {
                    return Err(error);
                }
            }

            let mut stored_key = String::new();
            let _ = stored_key.push_str(key);
            let mut stored_content = String::new();
            let _ = stored_content.push_str(content);
            let _ = self
                .published
                .borrow_mut()
                .push((stored_key, stored_content));

            Ok(())
        }

        fn time_unit(&self) -> TimeUnit {
            self.time_unit.get()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::shuttle::registers::reg;

        #[test]
        fn test_mock_bus_records_writes() {
            let mut bus = MockShuttleBus::new();

            futures::executor::block_on(async {
                bus.write(0x55, &[reg::START]).await.unwrap();
                bus.write(0x55, &[reg::ADR, 0x01]).await.unwrap();
            });

            let writes = bus.get_writes();
            assert_eq!(writes.len(), 2);
            assert_eq!(writes[0].address, 0x55);
            assert_eq!(writes[0].bytes.as_slice(), &[reg::START]);
            assert_eq!(writes[1].bytes.as_slice(), &[reg::ADR, 0x01]);
        }

        #[test]
        fn test_mock_bus_serves_status_script_then_fallback() {
            let mut bus = MockShuttleBus::new();
            bus.push_status(0x04);
            bus.set_fallback_status(0x06);

            futures::executor::block_on(async {
                let mut reply = [0u8; 1];
                bus.write_read(0x55, &[reg::STATUS], &mut reply).await.unwrap();
                assert_eq!(reply[0], 0x04);

                bus.write_read(0x55, &[reg::STATUS], &mut reply).await.unwrap();
                assert_eq!(reply[0], 0x06);
            });

            // Selector writes of the reads are not recorded as register writes
            assert!(bus.get_writes().is_empty());
            assert_eq!(bus.get_status_reads(), 2);
        }

        #[test]
        fn test_mock_bus_write_error_is_one_shot() {
            let mut bus = MockShuttleBus::new();
            bus.set_next_write_error(reg::START, ErrorKind::Other);

            futures::executor::block_on(async {
                let result = bus.write(0x55, &[reg::START]).await;
                assert_eq!(result, Err(ErrorKind::Other));

                // Error cleared, next write succeeds
                bus.write(0x55, &[reg::START]).await.unwrap();
            });

            // Failed attempts are recorded as well
            assert_eq!(bus.writes_to(reg::START), 2);
        }

        #[test]
        fn test_mock_link_records_and_fails() {
            let mut link = MockShuttleLink::new();
            link.set_fail_key("badkey", ShuttleError::SendTimeout);

            futures::executor::block_on(async {
                link.publish("goodkey", "1").await.unwrap();
                let result = link.publish("badkey", "2").await;
                assert_eq!(result, Err(ShuttleError::SendTimeout));
            });

            let published = link.get_published();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].0.as_str(), "goodkey");
            assert_eq!(published[0].1.as_str(), "1");
        }
    }
}
