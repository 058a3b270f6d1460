//! Report task feeding cycle summaries to the shuttle link
//!
//! Receives one [CycleSummary] per digitisation cycle over the report channel
//! and publishes it. The channel sender is the integration point for the
//! measurement pipeline.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use log::{info, warn};

use crate::report::{publish_cycle, CycleSummary};
use crate::shuttle::traits::ShuttleLink;

/// Queue depth for pending cycle summaries
const REPORT_QUEUE_DEPTH: usize = 4;

/// Channel carrying one summary per digitisation cycle
pub static REPORT_CHANNEL: Channel<CriticalSectionRawMutex, CycleSummary, REPORT_QUEUE_DEPTH> =
    Channel::new();

/// Type alias for the report channel sender
pub type ReportSender = Sender<'static, CriticalSectionRawMutex, CycleSummary, REPORT_QUEUE_DEPTH>;

/// Type alias for the report channel receiver
pub type ReportReceiver =
    Receiver<'static, CriticalSectionRawMutex, CycleSummary, REPORT_QUEUE_DEPTH>;

/// Task that owns the shuttle session and publishes incoming summaries
///
/// Joins the network once at startup. A failed join here is not fatal, every
/// publish re-establishes the session on demand.
pub async fn report_task<L: ShuttleLink>(mut link: L, receiver: ReportReceiver) {
    info!("Report: bringing up the shuttle link");
    match link.init().await {
        Ok(()) => info!("Report: shuttle link ready"),
        Err(err) => warn!("Report: initial join failed: {:?}", err),
    }

    loop {
        let summary = receiver.receive().await;
        let failures = publish_cycle(&mut link, &summary).await;
        if failures == 0 {
            info!("Report: cycle published");
        }
    }
}
