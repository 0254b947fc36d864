//! `hmi-sim` – Simulated Robot Firmware
//!
//! In-process stand-in for the robot side of the HMI topics, for CI and
//! demos without physical hardware. [`SimRobot`] publishes display and
//! LED state the way the firmware would and consumes button presses from
//! the panel, recording them for test assertions.

pub mod robot;

pub use robot::{ButtonSource, SimRobot};
