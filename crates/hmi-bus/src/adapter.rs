//! The adapter seam between the bus and the outside world.
//!
//! The panel never draws pixels and the simulator never opens sockets:
//! both publish to the internal [`MessageBus`][crate::bus::MessageBus].
//! Adapters listen to that bus (directly or through the panel's event
//! channel) and translate traffic into the protocol of an external
//! surface.
//!
//! # Implementors
//!
//! * the cockpit web server – bridges panel events to browsers over a
//!   WebSocket and injects button presses back.
//! * the simulated robot – plays the firmware side, driving the display
//!   and LED topics and consuming button presses.

use async_trait::async_trait;
use hmi_types::HmiError;

/// Anything that bridges the message bus to an external surface.
#[async_trait]
pub trait BusAdapter: Send + Sync {
    /// Short name used in diagnostics and boot-sequence logs.
    fn name(&self) -> &str;

    /// Drive the adapter until its transport closes or the hosting task
    /// is aborted.
    async fn run(&self) -> Result<(), HmiError>;
}
