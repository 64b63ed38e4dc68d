//! In-process publish/subscribe channel for tweet state.
//!
//! Views that mutate a tweet broadcast the updated value here; every other
//! mounted view reconciles its own copy on receipt. Delivery is
//! synchronous and in emission order; publishing has no error channel.

use std::sync::{Arc, Mutex, Weak};

use crate::models::Tweet;

/// The closed set of broadcast kinds. Each carries the canonical tweet
/// value computed by the mutating view after a successful API call.
#[derive(Debug, Clone, PartialEq)]
pub enum TweetEvent {
    /// A new tweet was posted. Only the main feed grows from this.
    Created(Tweet),
    /// The tweet's text was edited.
    Updated(Tweet),
    /// The tweet was liked or unliked.
    Liked(Tweet),
    /// A comment was added to the tweet.
    CommentAdded(Tweet),
}

impl TweetEvent {
    pub fn tweet(&self) -> &Tweet {
        match self {
            TweetEvent::Created(t)
            | TweetEvent::Updated(t)
            | TweetEvent::Liked(t)
            | TweetEvent::CommentAdded(t) => t,
        }
    }
}

type Handler = Box<dyn FnMut(&TweetEvent) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Cloning shares the underlying channel. Handlers run on the publishing
/// thread and must not publish or drop subscriptions re-entrantly.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every subsequent broadcast. Dropping the
    /// returned subscription unregisters it (the unmount case).
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&TweetEvent) + Send + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Box::new(handler)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers the event to all current subscribers, synchronously, in
    /// subscription order. Never fails.
    pub fn publish(&self, event: &TweetEvent) {
        let mut registry = lock(&self.registry);
        for (_, handler) in registry.handlers.iter_mut() {
            handler(event);
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
