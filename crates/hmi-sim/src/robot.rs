//! [`SimRobot`] – a stub robot firmware that plays the other side of the
//! HMI topics. It records every button press it receives and always
//! succeeds, so the full stack can run in headless tests and demos
//! without physical hardware.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use hmi_bus::{BusAdapter, MessageBus, Publisher};
use hmi_panel::TopicSet;
use hmi_types::{HmiError, Led, Payload, hmi_button};
use tracing::{debug, info};

/// Which of the two button topics a recorded press arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSource {
    Hmi,
    Create3,
}

/// Simulated robot HMI firmware bound to one namespace.
///
/// Owns publishers for the nine topics the panel subscribes to and holds
/// a small scrollable menu. Face button 1 scrolls the selection, face
/// button 2 "activates" the selected entry by toggling the User 1 LED;
/// every press is recorded for test assertions.
pub struct SimRobot {
    bus: MessageBus,
    topics: TopicSet,
    display_pub: Publisher,
    selected_pub: Publisher,
    led_pubs: HashMap<Led, Publisher>,
    menu: Mutex<Menu>,
    led_states: Mutex<HashMap<Led, i32>>,
    pressed: Mutex<Vec<(ButtonSource, i32)>>,
}

#[derive(Debug)]
struct Menu {
    header: String,
    entries: Vec<String>,
    selected: usize,
}

impl Menu {
    fn raw_text(&self) -> String {
        let mut text = self.header.clone();
        for entry in &self.entries {
            text.push('\n');
            text.push_str(entry);
        }
        text
    }
}

impl SimRobot {
    /// Create the firmware side for `namespace` and advertise its nine
    /// outbound topics.
    pub fn new(bus: MessageBus, namespace: &str) -> Self {
        let topics = TopicSet::for_namespace(namespace);
        let display_pub = bus.advertise(&topics.display_raw);
        let selected_pub = bus.advertise(&topics.display_selected);
        let led_pubs = topics
            .leds
            .iter()
            .map(|(led, topic)| (*led, bus.advertise(topic)))
            .collect();
        Self {
            bus,
            topics,
            display_pub,
            selected_pub,
            led_pubs,
            menu: Mutex::new(Menu {
                header: "* TURTLEBOT4 *".to_string(),
                entries: vec![
                    "Battery".to_string(),
                    "Wi-Fi".to_string(),
                    "Motors".to_string(),
                    "Comms".to_string(),
                    "Help".to_string(),
                ],
                selected: 0,
            }),
            led_states: Mutex::new(HashMap::new()),
            pressed: Mutex::new(Vec::new()),
        }
    }

    /// Publish the initial panel state: power and comms LEDs on, the rest
    /// off, and the menu on the display.
    pub fn power_on(&self) {
        for led in Led::ALL {
            let state = match led {
                Led::Power | Led::Comms => 1,
                _ => 0,
            };
            self.set_led(led, state);
        }
        self.publish_display();
    }

    /// Publish `state` on the LED topic and remember it. Fire-and-forget:
    /// a topic nobody listens on is a routine condition for firmware.
    pub fn set_led(&self, led: Led, state: i32) {
        self.led_states
            .lock()
            .expect("led state map poisoned")
            .insert(led, state);
        let publisher = self
            .led_pubs
            .get(&led)
            .expect("publisher exists for every LED");
        if let Err(e) = publisher.publish(Payload::Int(state)) {
            debug!(led = led.topic_name(), state, "LED publish dropped: {e}");
        }
    }

    /// Last state published for `led` (0 when never set).
    pub fn led_state(&self, led: Led) -> i32 {
        *self
            .led_states
            .lock()
            .expect("led state map poisoned")
            .get(&led)
            .unwrap_or(&0)
    }

    /// Every button press received so far, in arrival order.
    pub fn pressed_buttons(&self) -> Vec<(ButtonSource, i32)> {
        self.pressed
            .lock()
            .expect("pressed button log poisoned")
            .clone()
    }

    /// Publish the current menu text and selection.
    pub fn publish_display(&self) {
        let (raw, selected) = {
            let menu = self.menu.lock().expect("menu poisoned");
            // Line 0 is the header; entry i sits on display line i + 1.
            (menu.raw_text(), menu.selected as i32 + 1)
        };
        if let Err(e) = self.display_pub.publish(Payload::Text(raw)) {
            debug!("display publish dropped: {e}");
        }
        if let Err(e) = self.selected_pub.publish(Payload::Int(selected)) {
            debug!("selection publish dropped: {e}");
        }
    }

    fn on_button(&self, source: ButtonSource, code: i32) {
        debug!(?source, code, "button press received");
        self.pressed
            .lock()
            .expect("pressed button log poisoned")
            .push((source, code));

        if source != ButtonSource::Hmi {
            return;
        }
        match code {
            hmi_button::BUTTON_1 => {
                {
                    let mut menu = self.menu.lock().expect("menu poisoned");
                    menu.selected = (menu.selected + 1) % menu.entries.len();
                }
                self.publish_display();
            }
            hmi_button::BUTTON_2 => {
                let toggled = 1 - self.led_state(Led::User1).min(1);
                self.set_led(Led::User1, toggled);
            }
            _ => {}
        }
    }
}

#[async_trait]
impl BusAdapter for SimRobot {
    fn name(&self) -> &str {
        "sim-robot"
    }

    /// Consume button presses from both outbound panel topics until the
    /// bus shuts down.
    async fn run(&self) -> Result<(), HmiError> {
        let mut hmi_sub = self.bus.subscribe(&self.topics.hmi_buttons);
        let mut create3_sub = self.bus.subscribe(&self.topics.create3_buttons);
        info!(namespace_topics = ?self.topics.hmi_buttons, "sim robot listening");

        loop {
            tokio::select! {
                event = hmi_sub.recv() => match event {
                    Some(event) => {
                        if let Some(code) = event.payload.as_int() {
                            self.on_button(ButtonSource::Hmi, code);
                        }
                    }
                    None => break,
                },
                event = create3_sub.recv() => match event {
                    Some(event) => {
                        if let Some(code) = event.payload.as_int() {
                            self.on_button(ButtonSource::Create3, code);
                        }
                    }
                    None => break,
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmi_panel::HmiPanel;
    use std::sync::Arc;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn power_on_publishes_all_leds_and_menu() {
        let bus = MessageBus::default();
        let robot = SimRobot::new(bus.clone(), "turtlebot4");

        let mut power = bus.subscribe("/model/turtlebot4/hmi/led/power");
        let mut motors = bus.subscribe("/model/turtlebot4/hmi/led/motors");
        let mut raw = bus.subscribe("/model/turtlebot4/hmi/display/raw");

        robot.power_on();

        assert_eq!(power.recv().await.unwrap().payload.as_int(), Some(1));
        assert_eq!(motors.recv().await.unwrap().payload.as_int(), Some(0));
        let text = raw.recv().await.unwrap();
        assert!(text.payload.as_text().unwrap().starts_with("* TURTLEBOT4 *"));
    }

    #[tokio::test]
    async fn scroll_button_advances_the_selection() {
        let bus = MessageBus::default();
        let robot = Arc::new(SimRobot::new(bus.clone(), "turtlebot4"));
        let runner = Arc::clone(&robot);
        let task = tokio::spawn(async move { runner.run().await });
        settle().await;

        let mut selected = bus.subscribe("/model/turtlebot4/hmi/display/selected");
        bus.advertise("/model/turtlebot4/hmi/buttons")
            .publish(Payload::Int(hmi_button::BUTTON_1))
            .unwrap();

        // Header occupies line 0, so the second entry sits on line 2.
        assert_eq!(selected.recv().await.unwrap().payload.as_int(), Some(2));
        assert_eq!(
            robot.pressed_buttons(),
            vec![(ButtonSource::Hmi, hmi_button::BUTTON_1)]
        );
        task.abort();
    }

    #[tokio::test]
    async fn select_button_toggles_user1_led() {
        let bus = MessageBus::default();
        let robot = Arc::new(SimRobot::new(bus.clone(), "turtlebot4"));
        let runner = Arc::clone(&robot);
        let task = tokio::spawn(async move { runner.run().await });
        settle().await;

        let mut user1 = bus.subscribe("/model/turtlebot4/hmi/led/user1");
        let buttons = bus.advertise("/model/turtlebot4/hmi/buttons");

        buttons.publish(Payload::Int(hmi_button::BUTTON_2)).unwrap();
        assert_eq!(user1.recv().await.unwrap().payload.as_int(), Some(1));

        buttons.publish(Payload::Int(hmi_button::BUTTON_2)).unwrap();
        assert_eq!(user1.recv().await.unwrap().payload.as_int(), Some(0));
        task.abort();
    }

    #[tokio::test]
    async fn create3_presses_are_recorded_without_menu_effect() {
        let bus = MessageBus::default();
        let robot = Arc::new(SimRobot::new(bus.clone(), "turtlebot4"));
        let runner = Arc::clone(&robot);
        let task = tokio::spawn(async move { runner.run().await });
        settle().await;

        bus.advertise("/model/turtlebot4/buttons")
            .publish(Payload::Int(3))
            .unwrap();
        settle().await;

        assert_eq!(robot.pressed_buttons(), vec![(ButtonSource::Create3, 3)]);
        task.abort();
    }

    /// End-to-end: panel and sim robot wired to the same bus.
    #[tokio::test]
    async fn panel_and_robot_round_trip() {
        let bus = MessageBus::default();
        let robot = Arc::new(SimRobot::new(bus.clone(), "turtlebot4"));
        let panel = Arc::new(HmiPanel::new(bus.clone()));
        panel.load_config(None);
        settle().await;

        let runner = Arc::clone(&robot);
        let task = tokio::spawn(async move { runner.run().await });
        settle().await;

        robot.power_on();
        settle().await;
        assert!(panel.display_text().contains("TURTLEBOT4"));
        assert_eq!(panel.selected_line(), 1);

        // Scrolling from the panel moves the marker on the display.
        panel.press_hmi_button(hmi_button::BUTTON_1);
        settle().await;
        assert_eq!(panel.selected_line(), 2);
        assert!(panel.display_text().contains(">Wi-Fi"));
        task.abort();
    }
}
