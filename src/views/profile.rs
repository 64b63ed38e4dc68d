//! Profile view: a user's tweets, liked tweets, and comments, plus the
//! follow toggle.

use crate::api::{Api, ApiError};
use crate::events::TweetEvent;
use crate::models::Profile;
use crate::views::reconcile_list;

#[derive(Default)]
pub struct ProfileView {
    profile: Option<Profile>,
    follow_in_flight: bool,
}

impl ProfileView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, api: &dyn Api, username: &str) -> Result<(), ApiError> {
        self.profile = Some(api.profile(username).await?);
        Ok(())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Follows or unfollows the viewed user. On success the local state
    /// flips optimistically: `is_following` inverts and the follower
    /// count moves by one. Returns the new `is_following`.
    pub async fn toggle_follow(&mut self, api: &dyn Api) -> Result<bool, ApiError> {
        if self.follow_in_flight {
            return Err(ApiError::Validation(
                "a follow request is already in flight".to_string(),
            ));
        }
        let username = match &self.profile {
            Some(profile) => profile.user.username.clone(),
            None => {
                return Err(ApiError::Validation("no profile loaded".to_string()));
            }
        };

        self.follow_in_flight = true;
        let result = api.toggle_follow(&username).await;
        self.follow_in_flight = false;
        result?;

        // The server only reports success; the flip itself is local.
        let user = &mut self
            .profile
            .as_mut()
            .ok_or_else(|| ApiError::Validation("no profile loaded".to_string()))?
            .user;
        user.is_following = !user.is_following;
        user.followers_count = if user.is_following {
            user.followers_count + 1
        } else {
            user.followers_count.saturating_sub(1)
        };
        Ok(user.is_following)
    }

    /// Broadcast reconciliation over both tweet tabs. The comments tab
    /// holds `Comment` records, which no broadcast kind carries updates
    /// for, so it is left alone.
    pub fn apply(&mut self, event: &TweetEvent) {
        let Some(profile) = &mut self.profile else {
            return;
        };
        match event {
            TweetEvent::Created(_) => {}
            TweetEvent::Updated(tweet)
            | TweetEvent::Liked(tweet)
            | TweetEvent::CommentAdded(tweet) => {
                reconcile_list(&mut profile.tweets, tweet);
                reconcile_list(&mut profile.liked_tweets, tweet);
            }
        }
    }
}
