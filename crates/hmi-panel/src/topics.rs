//! Topic string composition.
//!
//! Every topic the panel touches is derived from the robot namespace by
//! plain string substitution; no other contract with the simulator is
//! assumed.

use hmi_types::Led;

/// The ten topics bound to one robot namespace: two outbound button
/// topics and nine inbound display/LED topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    /// HMI face button presses (outbound).
    pub hmi_buttons: String,
    /// Create3 base button presses (outbound).
    pub create3_buttons: String,
    /// Raw display text (inbound).
    pub display_raw: String,
    /// Selected display line index (inbound).
    pub display_selected: String,
    /// One state topic per status LED (inbound), in board order.
    pub leds: Vec<(Led, String)>,
}

impl TopicSet {
    /// Compose all ten topic strings for `namespace`.
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            hmi_buttons: format!("/model/{namespace}/hmi/buttons"),
            create3_buttons: format!("/model/{namespace}/buttons"),
            display_raw: format!("/model/{namespace}/hmi/display/raw"),
            display_selected: format!("/model/{namespace}/hmi/display/selected"),
            leds: Led::ALL
                .iter()
                .map(|led| {
                    (
                        *led,
                        format!("/model/{namespace}/hmi/led/{}", led.topic_name()),
                    )
                })
                .collect(),
        }
    }

    /// The nine inbound topic strings the panel subscribes to.
    pub fn subscribed(&self) -> Vec<&str> {
        let mut topics = vec![self.display_raw.as_str(), self.display_selected.as_str()];
        topics.extend(self.leds.iter().map(|(_, t)| t.as_str()));
        topics
    }

    /// All ten topic strings, outbound first.
    pub fn all(&self) -> Vec<&str> {
        let mut topics = vec![self.hmi_buttons.as_str(), self.create3_buttons.as_str()];
        topics.extend(self.subscribed());
        topics
    }
}
