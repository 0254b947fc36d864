//! `hmi-cockpit` – The Panel Web UI Server
//!
//! Boots a lightweight HTTP + WebSocket server (default port `8080`)
//! that:
//!
//! 1. **Serves** the static panel single-page application (HTML/CSS/JS)
//!    at every non-WebSocket HTTP path.
//!
//! 2. **Bridges** the [`HmiPanel`]'s notification channel to every
//!    connected browser tab over a persistent WebSocket connection so
//!    that LED, display, and namespace changes render in real time.
//!
//! 3. **Accepts** upstream messages from the browser:
//!    - `{"op":"press","target":"hmi"|"create3","button":N}` → publishes
//!      the button code on the matching outbound topic.
//!    - `{"op":"set_namespace","value":"..."}` → rebinds all ten topics
//!      to the new robot namespace.
//!
//! [`HmiPanel`]: hmi_panel::HmiPanel

pub mod server;

pub use server::{CockpitServer, DEFAULT_PORT};
