pub mod detail;
pub mod following;
pub mod home;
pub mod profile;

pub use detail::TweetDetail;
pub use following::FollowingFeed;
pub use home::HomeFeed;
pub use profile::ProfileView;

use crate::models::Tweet;

/// Replaces any copy of the broadcast tweet held in `tweets`. Unknown ids
/// are ignored; a list never grows here. Returns whether a copy was hit.
pub(crate) fn reconcile_list(tweets: &mut [Tweet], incoming: &Tweet) -> bool {
    let mut hit = false;
    for held in tweets.iter_mut().filter(|t| t.id == incoming.id) {
        held.absorb(incoming);
        hit = true;
    }
    hit
}
