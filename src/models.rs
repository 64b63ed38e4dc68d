use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a tweet or comment, in characters.
pub const MAX_POST_LEN: usize = 280;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: u64,
    pub poster: String,
    pub tweet: String,
    pub date_posted: DateTime<Utc>,
    pub likes_count: u32,
    pub comments_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub edited: bool,
    /// Ordered newest-first; populated only by the detail endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub main_post: u64,
    pub comment: String,
    pub commenter: String,
    pub commented: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: ProfileUser,
    pub tweets: Vec<Tweet>,
    pub liked_tweets: Vec<Tweet>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUser {
    pub username: String,
    pub followers_count: u32,
    pub following_count: u32,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_self_profile: bool,
}

/// One page of the home feed plus both side lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub recent_tweets: Vec<Tweet>,
    pub most_liked_tweets: Vec<Tweet>,
    pub most_commented_tweets: Vec<Tweet>,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowingPage {
    pub tweets: Vec<Tweet>,
    pub total_pages: u32,
}

/// Response body of the like-unlike endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub success: bool,
    pub liked: bool,
    pub likes_count: u32,
}

// Reducers. Each mutation kind has its own rule stating which fields the
// server response may overwrite and which are carried over from the prior
// local value.
impl Tweet {
    /// Like-unlike response: `is_liked` and `likes_count` come from the
    /// server, everything else is untouched.
    pub fn apply_like(&mut self, outcome: &LikeOutcome) {
        self.is_liked = outcome.liked;
        self.likes_count = outcome.likes_count;
    }

    /// Edit response: only the text and the edited flag come from the
    /// server. Like state, comment counts, and the loaded comment
    /// sequence survive the edit.
    pub fn merge_edited(&mut self, server: &Tweet) {
        self.tweet = server.tweet.clone();
        self.edited = server.edited;
    }

    /// A freshly created comment: count goes up by one and the comment
    /// becomes the newest entry in the sequence.
    pub fn push_comment(&mut self, comment: Comment) {
        self.comments_count += 1;
        match &mut self.comments {
            Some(comments) => comments.insert(0, comment),
            None => self.comments = Some(vec![comment]),
        }
    }

    /// Reconciles this copy with a broadcast value for the same tweet id.
    /// Scalar fields are taken from the incoming value. The comment
    /// sequence merges: the incoming order wins, held comments the sender
    /// did not include are kept after it, so a view holding the full
    /// sequence never loses it to a sender that held a shorter one.
    pub fn absorb(&mut self, incoming: &Tweet) {
        debug_assert_eq!(self.id, incoming.id);

        self.poster = incoming.poster.clone();
        self.tweet = incoming.tweet.clone();
        self.date_posted = incoming.date_posted;
        self.likes_count = incoming.likes_count;
        self.comments_count = incoming.comments_count;
        self.is_liked = incoming.is_liked;
        self.edited = incoming.edited;

        self.comments = match (self.comments.take(), incoming.comments.as_ref()) {
            (held, None) => held,
            (None, Some(new)) => Some(new.clone()),
            (Some(held), Some(new)) => {
                let mut merged = new.clone();
                merged.extend(
                    held.into_iter()
                        .filter(|c| new.iter().all(|n| n.id != c.id)),
                );
                Some(merged)
            }
        };
    }
}

/// Sort for the "most liked" list: likes descending, most recent first
/// among ties.
pub fn sort_most_liked(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| {
        b.likes_count
            .cmp(&a.likes_count)
            .then_with(|| b.date_posted.cmp(&a.date_posted))
    });
}

/// Sort for the "most commented" list: comments descending, most recent
/// first among ties.
pub fn sort_most_commented(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| {
        b.comments_count
            .cmp(&a.comments_count)
            .then_with(|| b.date_posted.cmp(&a.date_posted))
    });
}
