//! Ordered, synchronous notification queue.
//!
//! Notifications are delivered in the order they were published. The owner
//! drains the bus with [`EventBus::next_delivery`] and runs every recipient's
//! handler before asking for the next one; anything published from inside a
//! handler is appended behind the notifications already queued.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

use crate::model::{UnixTimeMs, WebcamId};
use crate::settings::Theme;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    FavoriteChanged { webcam_id: WebcamId, is_favorite: bool },
    ThemeChanged { theme: Theme },
    AutorefreshChanged { enabled: bool, interval_secs: u32 },
    Refreshed { at: UnixTimeMs },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    FavoriteChanged,
    ThemeChanged,
    AutorefreshChanged,
    Refreshed,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::FavoriteChanged,
        Topic::ThemeChanged,
        Topic::AutorefreshChanged,
        Topic::Refreshed,
    ];
}

impl Notification {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::FavoriteChanged { .. } => Topic::FavoriteChanged,
            Self::ThemeChanged { .. } => Topic::ThemeChanged,
            Self::AutorefreshChanged { .. } => Topic::AutorefreshChanged,
            Self::Refreshed { .. } => Topic::Refreshed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery<S> {
    pub notification: Notification,
    pub recipients: Vec<S>,
}

#[derive(Debug)]
pub struct EventBus<S> {
    queue: VecDeque<Notification>,
    subscribers: Vec<(S, Vec<Topic>)>,
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }
}

impl<S: Copy + Eq + std::fmt::Debug> EventBus<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribing again adds topics; recipients keep their first-subscribed
    /// position.
    pub fn subscribe(&mut self, subscriber: S, topics: &[Topic]) {
        if let Some((_, existing)) = self.subscribers.iter_mut().find(|(s, _)| *s == subscriber) {
            for topic in topics {
                if !existing.contains(topic) {
                    existing.push(*topic);
                }
            }
            return;
        }
        self.subscribers.push((subscriber, topics.to_vec()));
    }

    pub fn unsubscribe(&mut self, subscriber: S) {
        self.subscribers.retain(|(s, _)| *s != subscriber);
    }

    #[must_use]
    pub fn is_subscribed(&self, subscriber: S, topic: Topic) -> bool {
        self.subscribers
            .iter()
            .any(|(s, topics)| *s == subscriber && topics.contains(&topic))
    }

    pub fn publish(&mut self, notification: Notification) {
        trace!(?notification, queued = self.queue.len(), "notification published");
        self.queue.push_back(notification);
    }

    /// Pops the oldest notification with the subscribers of its topic, in
    /// subscription order.
    pub fn next_delivery(&mut self) -> Option<Delivery<S>> {
        let notification = self.queue.pop_front()?;
        let topic = notification.topic();
        let recipients = self
            .subscribers
            .iter()
            .filter(|(_, topics)| topics.contains(&topic))
            .map(|(s, _)| *s)
            .collect();
        Some(Delivery {
            notification,
            recipients,
        })
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Sub {
        Grid,
        Carousel,
    }

    fn fav(id: &str) -> Notification {
        Notification::FavoriteChanged {
            webcam_id: WebcamId::new(id),
            is_favorite: true,
        }
    }

    #[test]
    fn delivers_in_publish_order() {
        let mut bus = EventBus::new();
        bus.subscribe(Sub::Grid, &Topic::ALL);
        bus.publish(fav("a"));
        bus.publish(Notification::ThemeChanged { theme: Theme::Dark });
        bus.publish(fav("b"));

        let order: Vec<_> = std::iter::from_fn(|| bus.next_delivery())
            .map(|d| d.notification)
            .collect();
        assert_eq!(
            order,
            vec![fav("a"), Notification::ThemeChanged { theme: Theme::Dark }, fav("b")]
        );
    }

    #[test]
    fn only_topic_subscribers_receive() {
        let mut bus = EventBus::new();
        bus.subscribe(Sub::Carousel, &[Topic::ThemeChanged]);
        bus.subscribe(Sub::Grid, &[Topic::FavoriteChanged, Topic::ThemeChanged]);

        bus.publish(fav("a"));
        assert_eq!(bus.next_delivery().unwrap().recipients, vec![Sub::Grid]);

        bus.publish(Notification::ThemeChanged { theme: Theme::Light });
        assert_eq!(
            bus.next_delivery().unwrap().recipients,
            vec![Sub::Carousel, Sub::Grid]
        );
    }

    #[test]
    fn publish_during_dispatch_is_queued_behind() {
        let mut bus = EventBus::new();
        bus.subscribe(Sub::Grid, &Topic::ALL);
        bus.publish(fav("first"));
        bus.publish(fav("second"));

        let first = bus.next_delivery().unwrap();
        // A handler reacting to `first` publishes a follow-up.
        bus.publish(Notification::Refreshed { at: UnixTimeMs(1) });

        assert_eq!(first.notification, fav("first"));
        assert_eq!(bus.next_delivery().unwrap().notification, fav("second"));
        assert_eq!(
            bus.next_delivery().unwrap().notification,
            Notification::Refreshed { at: UnixTimeMs(1) }
        );
        assert!(bus.next_delivery().is_none());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        bus.subscribe(Sub::Grid, &[Topic::FavoriteChanged]);
        bus.unsubscribe(Sub::Grid);
        bus.publish(fav("a"));
        assert!(bus.next_delivery().unwrap().recipients.is_empty());
        assert!(!bus.is_subscribed(Sub::Grid, Topic::FavoriteChanged));
    }

    #[test]
    fn resubscribe_merges_topics() {
        let mut bus = EventBus::new();
        bus.subscribe(Sub::Grid, &[Topic::FavoriteChanged]);
        bus.subscribe(Sub::Grid, &[Topic::Refreshed, Topic::FavoriteChanged]);
        assert!(bus.is_subscribed(Sub::Grid, Topic::Refreshed));
        bus.publish(fav("a"));
        assert_eq!(bus.next_delivery().unwrap().recipients, vec![Sub::Grid]);
        assert_eq!(bus.pending(), 0);
    }
}
