//! [`HmiPanel`] – the bridge between the simulator bus and GUI surfaces.
//!
//! The panel subscribes to the nine inbound display/LED topics of one
//! robot namespace, mirrors their state into GUI-bindable form, and
//! republishes button presses onto the two outbound topics. Front ends
//! (cockpit browser tabs, the REPL) never touch the bus; they listen on
//! the panel's [`PanelEvent`] broadcast channel and call the `press_*`
//! methods.
//!
//! # Concurrency
//!
//! Subscriber callbacks run on the bus's tokio tasks, possibly
//! concurrently with GUI-side accessors. The two mutable buffers – the
//! display text and the selected line index – are each behind their own
//! lock, held only for the read-modify-emit step. The [`PanelEvent`]
//! channel is the sole cross-thread handoff.

use std::sync::{Arc, Mutex, RwLock};

use hmi_bus::{MessageBus, Publisher};
use hmi_types::{Led, LedColor, Payload};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::display::DisplayBuffer;
use crate::topics::TopicSet;

/// Namespace used when the configuration supplies none.
pub const DEFAULT_NAMESPACE: &str = "turtlebot4";

/// Capacity of the GUI notification channel.
const EVENT_CAPACITY: usize = 64;

/// Notifications the panel raises for GUI surfaces. The host surface
/// marshals these onto its own render thread.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelEvent {
    /// The robot namespace changed; all topics were rebound.
    NamespaceChanged { namespace: String },
    /// A status LED changed state.
    Led { led: Led, on: bool, color: LedColor },
    /// The display contents or selection changed; `text` is the combined
    /// render with the selected line marked.
    Display { text: String, selected: i32 },
}

/// The HMI panel bridge. Construct once per robot, wrap in an [`Arc`],
/// and call [`load_config`][HmiPanel::load_config] from inside a tokio
/// runtime to bind the topics.
pub struct HmiPanel {
    bus: MessageBus,
    namespace: RwLock<String>,
    /// Serializes whole rebinds; the namespace is re-read under this
    /// guard so concurrent changes cannot bind a stale prefix.
    rebind_lock: Mutex<()>,
    hmi_button_pub: Mutex<Option<Publisher>>,
    create3_button_pub: Mutex<Option<Publisher>>,
    subscriber_tasks: Mutex<Vec<JoinHandle<()>>>,
    display: Mutex<DisplayBuffer>,
    selected_line: Mutex<i32>,
    events: broadcast::Sender<PanelEvent>,
}

impl HmiPanel {
    /// Create an unbound panel on `bus`. No topics are touched until
    /// [`load_config`][Self::load_config] or
    /// [`set_namespace`][Self::set_namespace] runs.
    pub fn new(bus: MessageBus) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            bus,
            namespace: RwLock::new(DEFAULT_NAMESPACE.to_string()),
            rebind_lock: Mutex::new(()),
            hmi_button_pub: Mutex::new(None),
            create3_button_pub: Mutex::new(None),
            subscriber_tasks: Mutex::new(Vec::new()),
            display: Mutex::new(DisplayBuffer::new()),
            selected_line: Mutex::new(0),
            events,
        }
    }

    /// Apply the configured namespace and bind all topics. An absent or
    /// blank namespace falls back to [`DEFAULT_NAMESPACE`].
    pub fn load_config(self: &Arc<Self>, configured_namespace: Option<&str>) {
        let ns = match configured_namespace {
            Some(ns) if !ns.trim().is_empty() => ns.trim().to_string(),
            _ => {
                debug!("no namespace configured, using default '{DEFAULT_NAMESPACE}'");
                DEFAULT_NAMESPACE.to_string()
            }
        };
        *self.namespace.write().expect("namespace lock poisoned") = ns;
        self.update_topics();
    }

    /// The current robot namespace.
    pub fn namespace(&self) -> String {
        self.namespace
            .read()
            .expect("namespace lock poisoned")
            .clone()
    }

    /// Change the robot namespace. A no-op when `ns` matches the current
    /// value; otherwise stores it, notifies
    /// [`PanelEvent::NamespaceChanged`], and rebinds all ten topics.
    pub fn set_namespace(self: &Arc<Self>, ns: &str) {
        {
            let mut current = self.namespace.write().expect("namespace lock poisoned");
            if *current == ns {
                return;
            }
            *current = ns.to_string();
        }
        self.emit(PanelEvent::NamespaceChanged {
            namespace: ns.to_string(),
        });
        self.update_topics();
    }

    /// Drop every binding and re-create it from the current namespace:
    /// aborts the nine inbound subscriber tasks, releases both outbound
    /// publishers, recomposes the topic strings, and resubscribes /
    /// re-advertises. Rebinds are serialized, and the namespace is read
    /// under the same guard, so overlapping calls settle on the most
    /// recently stored value.
    pub fn update_topics(self: &Arc<Self>) {
        let _rebind = self.rebind_lock.lock().expect("rebind lock poisoned");
        let topics = TopicSet::for_namespace(&self.namespace());

        {
            let mut tasks = self
                .subscriber_tasks
                .lock()
                .expect("subscriber task list poisoned");
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        *self
            .hmi_button_pub
            .lock()
            .expect("hmi button publisher poisoned") = Some(self.bus.advertise(&topics.hmi_buttons));
        *self
            .create3_button_pub
            .lock()
            .expect("create3 button publisher poisoned") =
            Some(self.bus.advertise(&topics.create3_buttons));

        let mut tasks = self
            .subscriber_tasks
            .lock()
            .expect("subscriber task list poisoned");

        // Tasks hold the panel weakly so they cannot keep it alive past
        // the last external handle; `Drop` stays reachable and aborts
        // them.
        let panel = Arc::downgrade(self);
        let mut raw_sub = self.bus.subscribe(&topics.display_raw);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = raw_sub.recv().await {
                let Some(panel) = panel.upgrade() else { break };
                if let Some(text) = event.payload.as_text() {
                    panel.on_raw_message(text);
                }
            }
        }));

        let panel = Arc::downgrade(self);
        let mut selected_sub = self.bus.subscribe(&topics.display_selected);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = selected_sub.recv().await {
                let Some(panel) = panel.upgrade() else { break };
                if let Some(index) = event.payload.as_int() {
                    panel.on_selected_message(index);
                }
            }
        }));

        for (led, topic) in &topics.leds {
            let led = *led;
            let panel = Arc::downgrade(self);
            let mut led_sub = self.bus.subscribe(topic);
            tasks.push(tokio::spawn(async move {
                while let Some(event) = led_sub.recv().await {
                    let Some(panel) = panel.upgrade() else { break };
                    if let Some(state) = event.payload.as_int() {
                        panel.on_led_message(led, state);
                    }
                }
            }));
        }
    }

    /// Publish an HMI face button code. Fire-and-forget: a missing
    /// binding or a topic nobody listens on is logged, never surfaced.
    pub fn press_hmi_button(&self, button: i32) {
        Self::publish_button(
            &self.hmi_button_pub.lock().expect("hmi button publisher poisoned"),
            button,
        );
    }

    /// Publish a Create3 base button code.
    pub fn press_create3_button(&self, button: i32) {
        Self::publish_button(
            &self
                .create3_button_pub
                .lock()
                .expect("create3 button publisher poisoned"),
            button,
        );
    }

    fn publish_button(publisher: &Option<Publisher>, button: i32) {
        match publisher {
            Some(publisher) => {
                if let Err(e) = publisher.publish(Payload::Int(button)) {
                    debug!(topic = publisher.topic(), button, "button press dropped: {e}");
                }
            }
            None => warn!(button, "button press with no bound topic"),
        }
    }

    /// Subscribe to the GUI notification channel.
    pub fn subscribe_events(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    /// Current combined display text (same render the GUI receives).
    pub fn display_text(&self) -> String {
        let selected = *self.selected_line.lock().expect("selected line poisoned");
        self.display
            .lock()
            .expect("display buffer poisoned")
            .render(selected)
    }

    /// Last received selected-line index, unclamped.
    pub fn selected_line(&self) -> i32 {
        *self.selected_line.lock().expect("selected line poisoned")
    }

    // ── Subscriber callbacks ────────────────────────────────────────────

    fn on_raw_message(&self, text: &str) {
        {
            let mut display = self.display.lock().expect("display buffer poisoned");
            display.set_raw(text);
        }
        self.emit_display();
    }

    fn on_selected_message(&self, index: i32) {
        {
            let mut selected = self.selected_line.lock().expect("selected line poisoned");
            *selected = index;
        }
        self.emit_display();
    }

    fn on_led_message(&self, led: Led, state: i32) {
        let on = state != 0;
        let color = if on { led.on_color() } else { LedColor::Grey };
        self.emit(PanelEvent::Led { led, on, color });
    }

    fn emit_display(&self) {
        let selected = self.selected_line();
        let text = self
            .display
            .lock()
            .expect("display buffer poisoned")
            .render(selected);
        self.emit(PanelEvent::Display { text, selected });
    }

    fn emit(&self, event: PanelEvent) {
        // No GUI surface attached is a routine condition.
        let _ = self.events.send(event);
    }
}

impl Drop for HmiPanel {
    fn drop(&mut self) {
        let tasks = self
            .subscriber_tasks
            .lock()
            .expect("subscriber task list poisoned");
        for task in tasks.iter() {
            task.abort();
        }
    }
}
