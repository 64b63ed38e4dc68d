//! The home view: one page of recent tweets plus the two metric side
//! lists, all fetched in a single request.

use crate::api::{Api, ApiError};
use crate::events::TweetEvent;
use crate::models::{sort_most_commented, sort_most_liked, Tweet};
use crate::views::reconcile_list;

#[derive(Debug, Clone, PartialEq)]
pub struct PageControl {
    pub number: u32,
    pub active: bool,
}

/// The visible slice of a side list.
pub struct SidePreview<'a> {
    pub tweets: &'a [Tweet],
    /// True when the full set holds more than the preview shows.
    pub see_more: bool,
}

pub struct HomeFeed {
    pub recent: Vec<Tweet>,
    pub most_liked: Vec<Tweet>,
    pub most_commented: Vec<Tweet>,
    pub page: u32,
    pub total_pages: u32,
    side_list_limit: usize,
}

impl HomeFeed {
    pub fn new(side_list_limit: usize) -> Self {
        Self {
            recent: Vec::new(),
            most_liked: Vec::new(),
            most_commented: Vec::new(),
            page: 1,
            total_pages: 1,
            side_list_limit,
        }
    }

    /// Fetches one page. Callers navigate with [`HomeFeed::next_page`],
    /// [`HomeFeed::previous_page`], or the numbers from
    /// [`HomeFeed::page_controls`], so an out-of-range page is never
    /// constructed once the first page has loaded.
    pub async fn load(&mut self, api: &dyn Api, page: u32) -> Result<(), ApiError> {
        let data = api.home_feed(page).await?;
        self.recent = data.recent_tweets;
        self.most_liked = data.most_liked_tweets;
        self.most_commented = data.most_commented_tweets;
        self.total_pages = data.total_pages.max(1);
        self.page = page;
        Ok(())
    }

    pub fn next_page(&self) -> Option<u32> {
        (self.page < self.total_pages).then_some(self.page + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        (self.page > 1).then_some(self.page - 1)
    }

    /// One control per page, the current one marked active.
    pub fn page_controls(&self) -> Vec<PageControl> {
        (1..=self.total_pages)
            .map(|number| PageControl {
                number,
                active: number == self.page,
            })
            .collect()
    }

    pub fn liked_preview(&self) -> SidePreview<'_> {
        preview(&self.most_liked, self.side_list_limit)
    }

    pub fn commented_preview(&self) -> SidePreview<'_> {
        preview(&self.most_commented, self.side_list_limit)
    }

    /// The "see more" expansion: the full side list, re-sorted.
    pub fn expanded_liked(&self) -> Vec<Tweet> {
        let mut tweets = self.most_liked.clone();
        sort_most_liked(&mut tweets);
        tweets
    }

    pub fn expanded_commented(&self) -> Vec<Tweet> {
        let mut tweets = self.most_commented.clone();
        sort_most_commented(&mut tweets);
        tweets
    }

    /// Broadcast reconciliation: a created tweet is prepended to the main
    /// feed only; everything else replaces held copies by id and re-sorts
    /// the metric lists.
    pub fn apply(&mut self, event: &TweetEvent) {
        match event {
            TweetEvent::Created(tweet) => {
                self.recent.insert(0, tweet.clone());
            }
            TweetEvent::Updated(tweet)
            | TweetEvent::Liked(tweet)
            | TweetEvent::CommentAdded(tweet) => {
                reconcile_list(&mut self.recent, tweet);
                if reconcile_list(&mut self.most_liked, tweet) {
                    sort_most_liked(&mut self.most_liked);
                }
                if reconcile_list(&mut self.most_commented, tweet) {
                    sort_most_commented(&mut self.most_commented);
                }
            }
        }
    }
}

fn preview(tweets: &[Tweet], limit: usize) -> SidePreview<'_> {
    SidePreview {
        tweets: &tweets[..tweets.len().min(limit)],
        see_more: tweets.len() > limit,
    }
}
