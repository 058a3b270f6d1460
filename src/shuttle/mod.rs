pub mod client;
pub mod registers;
pub mod session;
pub mod traits;

pub use client::ShuttleClient;
pub use registers::Status;
pub use session::ShuttleSession;
pub use traits::{ShuttleError, ShuttleLink};
