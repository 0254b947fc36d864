//! `hmi-bus` – The Simulator Message Bus
//!
//! Routes asynchronous traffic between the simulated robot firmware, the
//! HMI panel bridge, and external surfaces without caring about the
//! data's meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, topic-based publish/subscribe bus built on Tokio
//!   broadcast channels, keyed by runtime-composed topic strings.
//! - [`adapter`] – The trait every external-surface adapter implements.

pub mod adapter;
pub mod bus;

pub use adapter::BusAdapter;
pub use bus::{MessageBus, Publisher, Subscription};
