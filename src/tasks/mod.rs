//! Embassy tasks module
//!
//! Contains the async tasks for the firmware, organised by functionality.

pub mod report;

pub use report::{report_task, ReportReceiver, ReportSender, REPORT_CHANNEL};
