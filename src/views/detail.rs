//! Detail view: one tweet with its full comment sequence.

use crate::api::{Api, ApiError};
use crate::events::TweetEvent;
use crate::models::{Comment, Tweet};

#[derive(Default)]
pub struct TweetDetail {
    tweet: Option<Tweet>,
}

impl TweetDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, api: &dyn Api, id: u64) -> Result<(), ApiError> {
        self.tweet = Some(api.tweet_detail(id).await?);
        Ok(())
    }

    pub fn tweet(&self) -> Option<&Tweet> {
        self.tweet.as_ref()
    }

    pub fn comments(&self) -> &[Comment] {
        self.tweet
            .as_ref()
            .and_then(|t| t.comments.as_deref())
            .unwrap_or(&[])
    }

    /// Broadcast reconciliation: replace the held tweet on a matching id.
    /// `Created` never applies here.
    pub fn apply(&mut self, event: &TweetEvent) {
        match event {
            TweetEvent::Created(_) => {}
            TweetEvent::Updated(incoming)
            | TweetEvent::Liked(incoming)
            | TweetEvent::CommentAdded(incoming) => {
                if let Some(held) = &mut self.tweet {
                    if held.id == incoming.id {
                        held.absorb(incoming);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tweet(id: u64) -> Tweet {
        Tweet {
            id,
            poster: "alice".to_string(),
            tweet: "hello".to_string(),
            date_posted: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            likes_count: 1,
            comments_count: 2,
            is_liked: false,
            edited: false,
            comments: None,
        }
    }

    fn comment(id: u64) -> Comment {
        Comment {
            id,
            main_post: 1,
            comment: format!("comment {}", id),
            commenter: "bob".to_string(),
            commented: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_view_has_no_comments() {
        let view = TweetDetail::new();
        assert!(view.tweet().is_none());
        assert!(view.comments().is_empty());
    }

    #[test]
    fn test_comment_broadcast_from_a_card_keeps_the_full_sequence() {
        let mut view = TweetDetail::new();
        let mut held = tweet(1);
        held.comments = Some(vec![comment(5), comment(4)]);
        view.tweet = Some(held);

        // A card elsewhere added comment 6; it only held that one comment.
        let mut incoming = tweet(1);
        incoming.comments_count = 3;
        incoming.comments = Some(vec![comment(6)]);
        view.apply(&TweetEvent::CommentAdded(incoming));

        let ids: Vec<u64> = view.comments().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![6, 5, 4]);
        assert_eq!(view.tweet().unwrap().comments_count, 3);
    }

    #[test]
    fn test_like_broadcast_reconciles_held_tweet() {
        let mut view = TweetDetail::new();
        view.tweet = Some(tweet(1));

        let mut incoming = tweet(1);
        incoming.is_liked = true;
        incoming.likes_count = 2;
        view.apply(&TweetEvent::Liked(incoming));

        let held = view.tweet().unwrap();
        assert!(held.is_liked);
        assert_eq!(held.likes_count, 2);
    }

    #[test]
    fn test_mismatched_id_and_created_are_ignored() {
        let mut view = TweetDetail::new();
        view.tweet = Some(tweet(1));

        view.apply(&TweetEvent::Liked(tweet(2)));
        assert!(!view.tweet().unwrap().is_liked);

        view.apply(&TweetEvent::Created(tweet(3)));
        assert_eq!(view.tweet().unwrap().id, 1);
    }
}
