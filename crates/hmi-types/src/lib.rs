use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unified envelope for every message routed over the simulator bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Full topic string, e.g. "/model/turtlebot4/hmi/led/power"
    pub topic: String,
    pub payload: Payload,
}

impl Event {
    /// Wrap `payload` in a fresh envelope stamped with `topic` and now.
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic: topic.into(),
            payload,
        }
    }
}

/// The two payload kinds the HMI topics carry: integer codes (button
/// presses, LED states, line indices) and raw display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Int(i32),
    Text(String),
}

impl Payload {
    /// The integer value, if this is an [`Payload::Int`].
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Payload::Int(v) => Some(*v),
            Payload::Text(_) => None,
        }
    }

    /// The text value, if this is a [`Payload::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Int(_) => None,
            Payload::Text(s) => Some(s),
        }
    }
}

/// The seven status LEDs on the physical HMI board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Led {
    Power,
    Motors,
    Comms,
    Wifi,
    Battery,
    User1,
    User2,
}

impl Led {
    /// All LEDs in board order, top to bottom.
    pub const ALL: [Led; 7] = [
        Led::Power,
        Led::Motors,
        Led::Comms,
        Led::Wifi,
        Led::Battery,
        Led::User1,
        Led::User2,
    ];

    /// Last segment of this LED's topic name (e.g. "power").
    pub fn topic_name(&self) -> &'static str {
        match self {
            Led::Power => "power",
            Led::Motors => "motors",
            Led::Comms => "comms",
            Led::Wifi => "wifi",
            Led::Battery => "battery",
            Led::User1 => "user1",
            Led::User2 => "user2",
        }
    }

    /// The color this LED lights up with when its state is nonzero.
    /// User 2 is the only yellow LED on the board; an LED that is off is
    /// always [`LedColor::Grey`].
    pub fn on_color(&self) -> LedColor {
        match self {
            Led::User2 => LedColor::Yellow,
            _ => LedColor::Green,
        }
    }

    /// Parse a topic-name segment back into a LED.
    pub fn from_topic_name(name: &str) -> Option<Led> {
        Led::ALL.iter().copied().find(|l| l.topic_name() == name)
    }
}

/// Render colors for an LED, as lowercase CSS color names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColor {
    Grey,
    Green,
    Yellow,
}

impl std::fmt::Display for LedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedColor::Grey => write!(f, "grey"),
            LedColor::Green => write!(f, "green"),
            LedColor::Yellow => write!(f, "yellow"),
        }
    }
}

/// Integer codes published when one of the four HMI face buttons is
/// pressed.
pub mod hmi_button {
    pub const BUTTON_1: i32 = 1;
    pub const BUTTON_2: i32 = 2;
    pub const BUTTON_3: i32 = 3;
    pub const BUTTON_4: i32 = 4;
}

/// Integer codes published when one of the Create3 base buttons is
/// pressed.
pub mod create3_button {
    pub const BUTTON_1: i32 = 1;
    pub const BUTTON_2: i32 = 2;
    pub const POWER: i32 = 3;
}

/// Global error type spanning bus delivery, configuration, and I/O
/// failures.
#[derive(Error, Debug)]
pub enum HmiError {
    #[error("Bus channel error: {0}")]
    Channel(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
