//! Headless, topic-based publish/subscribe message bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! Topics are plain strings composed at runtime from the robot namespace
//! (e.g. `/model/turtlebot4/hmi/led/power`). A broadcast channel is created
//! lazily the first time a topic is advertised or subscribed and is shared
//! by every later [`Publisher`] and [`Subscription`] on the same string.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use hmi_types::{Event, HmiError, Payload};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Shared message bus. Clone it cheaply – all clones share the same
/// underlying topic channels.
#[derive(Clone, Debug)]
pub struct MessageBus {
    capacity: usize,
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Event>>>>,
}

impl MessageBus {
    /// Create a new bus. `capacity` is applied to every topic channel
    /// independently.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Advertise a topic, returning a [`Publisher`] bound to it.
    pub fn advertise(&self, topic: impl Into<String>) -> Publisher {
        let topic = topic.into();
        let sender = self.channel(&topic);
        Publisher { topic, sender }
    }

    /// Subscribe to a topic, returning a [`Subscription`] that yields every
    /// event published to it from this point on.
    pub fn subscribe(&self, topic: impl Into<String>) -> Subscription {
        let topic = topic.into();
        let receiver = self.channel(&topic).subscribe();
        Subscription { topic, receiver }
    }

    /// Number of live subscribers on `topic`. Zero for topics that were
    /// never advertised or whose subscribers have all dropped.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .expect("bus channel map poisoned")
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Every topic string a channel has been created for, in no particular
    /// order.
    pub fn topics(&self) -> Vec<String> {
        self.channels
            .read()
            .expect("bus channel map poisoned")
            .keys()
            .cloned()
            .collect()
    }

    fn channel(&self, topic: &str) -> broadcast::Sender<Event> {
        if let Some(sender) = self
            .channels
            .read()
            .expect("bus channel map poisoned")
            .get(topic)
        {
            return sender.clone();
        }
        let mut map = self.channels.write().expect("bus channel map poisoned");
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// A handle that publishes events onto a single topic.
///
/// Obtained via [`MessageBus::advertise`]. Dropping the publisher does not
/// tear down the topic channel.
#[derive(Clone, Debug)]
pub struct Publisher {
    topic: String,
    sender: broadcast::Sender<Event>,
}

impl Publisher {
    /// Wrap `payload` in an [`Event`] stamped with this topic and send it.
    ///
    /// Returns the number of subscribers that were handed the event, or
    /// [`HmiError::Channel`] when no subscriber is currently listening
    /// (fire-and-forget topics treat that as a routine condition).
    pub fn publish(&self, payload: Payload) -> Result<usize, HmiError> {
        let event = Event::new(&self.topic, payload);
        self.sender
            .send(event)
            .map_err(|_| HmiError::Channel(format!("No subscribers on topic {}", self.topic)))
    }

    /// The topic this publisher is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// An async receiver bound to a single topic channel.
///
/// Obtained via [`MessageBus::subscribe`].
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Wait for the next event on this topic.
    ///
    /// A lagged subscriber logs a warning and keeps going with the oldest
    /// retained event (latest-value-wins, no backpressure). Returns `None`
    /// once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = %self.topic, lagged_by = n, "subscription lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The topic this subscription is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = MessageBus::default();
        let mut sub = bus.subscribe("/model/turtlebot4/hmi/display/raw");
        let publisher = bus.advertise("/model/turtlebot4/hmi/display/raw");

        publisher.publish(Payload::Text("Menu".to_string()))?;

        let event = sub.recv().await.ok_or("no event")?;
        assert_eq!(event.topic, "/model/turtlebot4/hmi/display/raw");
        assert_eq!(event.payload.as_text(), Some("Menu"));
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = MessageBus::default();
        let mut sub1 = bus.subscribe("/model/turtlebot4/hmi/buttons");
        let mut sub2 = bus.subscribe("/model/turtlebot4/hmi/buttons");
        let publisher = bus.advertise("/model/turtlebot4/hmi/buttons");

        publisher.publish(Payload::Int(3))?;

        let e1 = sub1.recv().await.ok_or("sub1 got nothing")?;
        let e2 = sub2.recv().await.ok_or("sub2 got nothing")?;
        assert_eq!(e1.id, e2.id);
        assert_eq!(e1.payload.as_int(), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>>
    {
        let bus = MessageBus::default();
        let mut power_sub = bus.subscribe("/model/turtlebot4/hmi/led/power");
        let _wifi_sub = bus.subscribe("/model/turtlebot4/hmi/led/wifi");
        let wifi_pub = bus.advertise("/model/turtlebot4/hmi/led/wifi");

        wifi_pub.publish(Payload::Int(1))?;

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            power_sub.recv(),
        )
        .await;
        assert!(
            result.is_err(),
            "power subscriber must not receive a wifi event"
        );
        Ok(())
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = MessageBus::default();
        let publisher = bus.advertise("/model/turtlebot4/buttons");
        let result = publisher.publish(Payload::Int(1));
        assert!(result.is_err());
    }

    #[test]
    fn subscriber_count_tracks_live_subscriptions() {
        let bus = MessageBus::default();
        assert_eq!(bus.subscriber_count("/model/a/hmi/buttons"), 0);

        let sub = bus.subscribe("/model/a/hmi/buttons");
        assert_eq!(bus.subscriber_count("/model/a/hmi/buttons"), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count("/model/a/hmi/buttons"), 0);
    }

    #[test]
    fn clones_share_topic_channels() {
        let bus = MessageBus::default();
        let clone = bus.clone();
        let _sub = bus.subscribe("/model/a/hmi/display/raw");
        assert_eq!(clone.subscriber_count("/model/a/hmi/display/raw"), 1);
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must
    /// produce a skip-ahead rather than a panic or a stall.
    #[tokio::test]
    async fn lagged_subscriber_skips_to_retained_events() {
        let bus = MessageBus::new(8);
        let mut slow_sub = bus.subscribe("/model/a/hmi/display/selected");
        let publisher = bus.advertise("/model/a/hmi/display/selected");

        for i in 0..1_000 {
            let _ = publisher.publish(Payload::Int(i));
        }

        // The subscriber lost the early events but still receives one of
        // the retained tail values.
        let event = slow_sub.recv().await.expect("channel still open");
        assert!(event.payload.as_int().expect("int payload") >= 992 - 8);
    }
}
