//! Shuttle session: provisioning, join and publish state machines
//!
//! Owns the register client, the provisioning settings and the join state.
//! All entry points take `&mut self`, so a join or publish sequence can never
//! be interleaved with another one.

use crate::config::poll;
use crate::meter::TimeUnit;
use crate::payload;
use crate::settings::LorawanSettings;
use crate::shuttle::client::ShuttleClient;
use crate::shuttle::registers::status;
use crate::shuttle::traits::{ShuttleError, ShuttleLink};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{info, warn};

/// Session with the shuttle module on the shared bus
pub struct ShuttleSession<I2C, D> {
    client: ShuttleClient<I2C>,
    delay: D,
    settings: LorawanSettings,
    enabled: bool,
    joined: bool,
}

impl<I2C, D> ShuttleSession<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a session. It stays inert until enable() is called.
    pub fn new(i2c: I2C, delay: D, settings: LorawanSettings) -> Self {
        Self {
            client: ShuttleClient::new(i2c),
            delay,
            settings,
            enabled: false,
            joined: false,
        }
    }

    /// Release the bus handle
    pub fn release(self) -> I2C {
        self.client.release()
    }

    /// Allow the session to touch the bus.
    ///
    /// Nothing is written until the first init() or publish() call.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while the last join is believed to still hold
    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn settings(&self) -> &LorawanSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut LorawanSettings {
        &mut self.settings
    }

    /// Write the credentials and whatever network parameters are present, in
    /// register order. The first failed write aborts the sequence; earlier
    /// writes are not rolled back, the next attempt rewrites everything.
    async fn push_provisioning(&mut self) -> Result<(), ShuttleError> {
        let (Some(dev_eui), Some(app_eui), Some(app_key)) = (
            self.settings.dev_eui,
            self.settings.app_eui,
            self.settings.app_key,
        ) else {
            warn!("Shuttle: credentials incomplete, cannot provision");
            return Err(ShuttleError::MissingCredentials);
        };

        if let Err(err) = self.client.set_dev_eui(dev_eui.as_bytes()).await {
            warn!("Shuttle: device EUI write failed: {:?}", err);
            return Err(err);
        }
        if let Err(err) = self.client.set_app_eui(app_eui.as_bytes()).await {
            warn!("Shuttle: application EUI write failed: {:?}", err);
            return Err(err);
        }
        if let Err(err) = self.client.set_app_key(app_key.as_bytes()).await {
            warn!("Shuttle: application key write failed: {:?}", err);
            return Err(err);
        }

        let network = self.settings.network;
        if let Some(region) = network.region {
            if let Err(err) = self.client.set_region(region).await {
                warn!("Shuttle: region write failed: {:?}", err);
                return Err(err);
            }
        }
        if let Some(mask) = network.channel_mask {
            if let Err(err) = self.client.set_channel_mask(&mask).await {
                warn!("Shuttle: channel mask write failed: {:?}", err);
                return Err(err);
            }
        }
        if let Some(dr) = network.default_data_rate {
            if let Err(err) = self.client.set_default_data_rate(dr).await {
                warn!("Shuttle: data rate write failed: {:?}", err);
                return Err(err);
            }
        }
        if let Some(adr) = network.adr {
            if let Err(err) = self.client.set_adr(adr).await {
                warn!("Shuttle: ADR write failed: {:?}", err);
                return Err(err);
            }
        }
        if let Some(confirmed) = network.confirmed {
            if let Err(err) = self
                .client
                .set_confirmed(confirmed.enabled, confirmed.retries)
                .await
            {
                warn!("Shuttle: confirmed mode write failed: {:?}", err);
                return Err(err);
            }
        }

        Ok(())
    }

    /// Poll the status register until any bit of `mask` is set.
    ///
    /// Failed reads count as "not yet" and the loop keeps going; only the
    /// attempt budget ends it. Returns false on exhaustion.
    async fn poll_status(&mut self, mask: u8, attempts: u32) -> bool {
        for _ in 0..attempts {
            match self.client.status().await {
                Ok(current) if current.contains(mask) => return true,
                Ok(_) => {}
                Err(err) => warn!("Shuttle: status read failed: {:?}", err),
            }
            self.delay.delay_ms(poll::INTERVAL_MS).await;
        }
        false
    }
}

impl<I2C, D> ShuttleLink for ShuttleSession<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    async fn init(&mut self) -> Result<(), ShuttleError> {
        if !self.enabled {
            return Err(ShuttleError::Disabled);
        }
        if self.joined {
            return Ok(());
        }

        self.push_provisioning().await?;

        if let Err(err) = self.client.start().await {
            warn!("Shuttle: start command failed: {:?}", err);
            return Err(err);
        }

        if !self.poll_status(status::JOINED, poll::JOIN_ATTEMPTS).await {
            warn!("Shuttle: network join timed out");
            self.joined = false;
            return Err(ShuttleError::JoinTimeout);
        }

        info!("Shuttle: network joined");
        self.joined = true;
        Ok(())
    }

    async fn publish(&mut self, key: &str, content: &str) -> Result<(), ShuttleError> {
        self.init().await?;

        let message = payload::render(key, content);
        if let Ok(text) = core::str::from_utf8(&message) {
            info!("Shuttle TX: {}", text);
        }

        if let Err(err) = self.client.send_payload(&message).await {
            warn!("Shuttle: payload write failed: {:?}", err);
            return Err(err);
        }
        if let Err(err) = self.client.trigger_send().await {
            warn!("Shuttle: transmit trigger failed: {:?}", err);
            return Err(err);
        }

        if !self.poll_status(status::SUCCESS, poll::SEND_ATTEMPTS).await {
            warn!("Shuttle: uplink not acknowledged, dropping join state");
            self.joined = false;
            return Err(ShuttleError::SendTimeout);
        }

        // Acknowledged at this point; a failed flag clear is logged only
        if let Err(err) = self.client.clear_finished().await {
            warn!("Shuttle: clear finished bit failed: {:?}", err);
        }

        Ok(())
    }

    fn time_unit(&self) -> TimeUnit {
        self.settings.time_unit()
    }
}
