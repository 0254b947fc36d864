//! `hmi-panel` – The HMI Panel Bridge
//!
//! Mirrors a simulated robot's human-machine interface – four face
//! buttons, seven status LEDs, and a 6-line character display – between
//! the simulator's publish/subscribe bus and GUI-bindable state.
//!
//! # Modules
//!
//! - [`panel`] – [`HmiPanel`]: namespace property, topic rebinding,
//!   button publishing, LED/display callbacks, GUI notifications.
//! - [`display`] – the fixed-size [`DisplayBuffer`] behind the display
//!   widget.
//! - [`topics`] – topic string composition from the robot namespace.

pub mod display;
pub mod panel;
pub mod topics;

pub use display::DisplayBuffer;
pub use panel::{DEFAULT_NAMESPACE, HmiPanel, PanelEvent};
pub use topics::TopicSet;
