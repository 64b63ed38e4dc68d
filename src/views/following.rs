//! Infinite-scroll feed of tweets from followed users. Pages accumulate
//! append-only; the visibility trigger may fire repeatedly while a fetch
//! is still in flight, so loads are serialized through an in-flight flag
//! that stays observable across the await.

use std::sync::{Mutex, MutexGuard};

use crate::api::{Api, ApiError};
use crate::events::TweetEvent;
use crate::views::reconcile_list;

use crate::models::Tweet;

#[derive(Default)]
struct State {
    tweets: Vec<Tweet>,
    /// Last fetched page; 0 before the first load.
    page: u32,
    has_more: bool,
    in_flight: bool,
}

pub struct FollowingFeed {
    state: Mutex<State>,
}

impl Default for FollowingFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowingFeed {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                has_more: true,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Entry point for the "last item became visible" trigger. Returns
    /// whether a page was fetched: `Ok(false)` means the call was
    /// suppressed (fetch already in flight, or no more pages).
    pub async fn load_next(&self, api: &dyn Api) -> Result<bool, ApiError> {
        let next = {
            let mut state = self.state();
            if state.in_flight || !state.has_more {
                return Ok(false);
            }
            state.in_flight = true;
            state.page + 1
        };

        let result = api.following_feed(next).await;

        let mut state = self.state();
        state.in_flight = false;
        let page = result?;
        state.tweets.extend(page.tweets);
        state.page = next;
        state.has_more = next < page.total_pages;
        Ok(true)
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn page(&self) -> u32 {
        self.state().page
    }

    pub fn tweets(&self) -> Vec<Tweet> {
        self.state().tweets.clone()
    }

    /// Broadcast reconciliation. This is not the main feed, so `Created`
    /// never grows it; everything else replaces held copies by id.
    pub fn apply(&self, event: &TweetEvent) {
        match event {
            TweetEvent::Created(_) => {}
            TweetEvent::Updated(tweet)
            | TweetEvent::Liked(tweet)
            | TweetEvent::CommentAdded(tweet) => {
                reconcile_list(&mut self.state().tweets, tweet);
            }
        }
    }
}
