//! Profile actions: follow, tweet, like, retweet, and the listing scrapes.
//!
//! Selectors target the legacy desktop markup, which is why every session
//! pins the desktop device profile. Mutating actions run an idempotence
//! pre-check first and report a soft "Already …" status instead of failing
//! when the page shows the action already happened; a click that blows up
//! mid-interaction is downgraded to the same soft status.

use {
    serde_json::{Value, json},
    tracing::info,
};

use crate::{
    error::Result,
    executor::{Executor, urls_equal},
    outcome::Outcome,
};

// ── Selectors ───────────────────────────────────────────────────────────────

const FOLLOW_ANCHOR: &str = ".ProfileNav-list .user-actions .js-follow-btn";
const NOT_FOLLOWING_MARKER: &str = ".user-actions.not-following";
const FOLLOWING_MARKER: &str = ".user-actions.following";

const TWEET_BUTTON: &str = ".js-tweet-btn";
const TWEET_BOX: &str = "#tweet-box-home-timeline";
const TWEET_BOX_READY: &str = "#tweet-box-home-timeline.is-showPlaceholder";

const PERMALINK_FAVORITE: &str =
    ".PermalinkOverlay-modal div.stream-item-footer .ProfileTweet-actionButton.js-actionFavorite";
const PERMALINK_RETWEET: &str =
    ".PermalinkOverlay-modal div.stream-item-footer .ProfileTweet-actionButton.js-actionRetweet";
const PERMALINK_FAVORITED: &str = ".PermalinkOverlay-modal .tweet.favorited";
const PERMALINK_RETWEETED: &str = ".PermalinkOverlay-modal .tweet.retweeted";
const RETWEET_CONFIRM: &str = ".RetweetDialog-retweetActionLabel";

const TIMELINE_FAVORITE_ANCHOR: &str = ".ProfileTweet-action--favorite";
const TIMELINE_RETWEET_ANCHOR: &str = ".ProfileTweet-action--retweet";
const FAVORITE_CONTROL: &str = ".ProfileTweet-actionButton.js-actionFavorite";
const RETWEET_CONTROL: &str = ".ProfileTweet-actionButton.js-actionRetweet";
const TWEET_ITEM: &str = "div[data-tweet-id]";

const LIST_ANCHOR: &str = ".AppContent-main";
const LIST_FOLLOW_BUTTONS: &str = ".AppContent-main .js-follow-btn";
const LIST_HANDLES: &str = ".AppContent-main .username.u-dir .u-linkComplex-target";

// ── Status strings ──────────────────────────────────────────────────────────

const USER_FOLLOWED: &str = "User followed";
const ALREADY_FOLLOWING: &str = "Already following";
const USER_UNFOLLOWED: &str = "User unfollowed";
const NOT_FOLLOWING: &str = "Not following";
const TWEET_LIKED: &str = "Tweet liked";
const ALREADY_LIKED: &str = "Already liked";
const TWEETS_LIKED: &str = "Tweets liked";
const TWEET_RETWEETED: &str = "Tweet retweeted";
const ALREADY_RETWEETED: &str = "Already retweeted";
const NETWORK_FOLLOWED: &str = "Network followed";
const INTERESTS_FOLLOWED: &str = "Interests followed";

/// Profile actions bound to one session's page.
pub struct ProfileActions<'a> {
    exec: Executor<'a>,
    base_url: &'a str,
    session_username: Option<&'a str>,
}

impl<'a> ProfileActions<'a> {
    pub(crate) fn new(
        exec: Executor<'a>,
        base_url: &'a str,
        session_username: Option<&'a str>,
    ) -> Self {
        Self {
            exec,
            base_url,
            session_username,
        }
    }

    // ── URL helpers ─────────────────────────────────────────────────────────

    fn profile_url(&self, username: &str) -> String {
        format!("{}/{username}", self.base_url)
    }

    fn status_url(&self, username: &str, tweet_id: &str) -> String {
        format!("{}/{username}/status/{tweet_id}", self.base_url)
    }

    fn followers_url(&self, username: Option<&str>) -> String {
        match username {
            Some(u) => format!("{}/{u}/followers", self.base_url),
            None => format!("{}/followers", self.base_url),
        }
    }

    fn following_url(&self, username: Option<&str>) -> String {
        match username {
            Some(u) => format!("{}/{u}/following", self.base_url),
            None => format!("{}/following", self.base_url),
        }
    }

    // ── Follow / unfollow ───────────────────────────────────────────────────

    /// Follow `username`, soft status when already following.
    pub async fn follow(&self, username: &str) -> Outcome {
        Outcome::from_result(self.follow_inner(username).await)
    }

    async fn follow_inner(&self, username: &str) -> Result<Value> {
        self.exec.goto(&self.profile_url(username)).await?;
        self.exec.wait_for(FOLLOW_ANCHOR).await?;

        let status = if self.exec.exists(NOT_FOLLOWING_MARKER).await? {
            match self.exec.click(FOLLOW_ANCHOR).await {
                Ok(()) => USER_FOLLOWED,
                Err(_) => ALREADY_FOLLOWING,
            }
        } else {
            ALREADY_FOLLOWING
        };

        info!(username, status, "follow");
        Ok(json!({ "username": username, "status": status }))
    }

    /// Unfollow `username`, soft status when not following.
    pub async fn unfollow(&self, username: &str) -> Outcome {
        Outcome::from_result(self.unfollow_inner(username).await)
    }

    async fn unfollow_inner(&self, username: &str) -> Result<Value> {
        self.exec.goto(&self.profile_url(username)).await?;
        self.exec.wait_for(FOLLOW_ANCHOR).await?;

        let status = if self.exec.exists(FOLLOWING_MARKER).await? {
            match self.exec.click(FOLLOW_ANCHOR).await {
                Ok(()) => USER_UNFOLLOWED,
                Err(_) => NOT_FOLLOWING,
            }
        } else {
            NOT_FOLLOWING
        };

        info!(username, status, "unfollow");
        Ok(json!({ "username": username, "status": status }))
    }

    // ── Tweeting ────────────────────────────────────────────────────────────

    /// Post a tweet from the home timeline.
    pub async fn tweet(&self, text: &str) -> Outcome {
        Outcome::from_result(self.tweet_inner(text).await)
    }

    async fn tweet_inner(&self, text: &str) -> Result<Value> {
        // The composer lives on the home timeline; skip the navigation when
        // the page is already there.
        if !urls_equal(&self.exec.current_url().await, self.base_url) {
            self.exec.goto(self.base_url).await?;
        }
        self.exec.wait_for(TWEET_BUTTON).await?;
        self.exec.wait_for(TWEET_BOX).await?;
        self.exec.click(TWEET_BOX).await?;
        self.exec.wait_for(TWEET_BOX_READY).await?;
        self.exec.type_text(TWEET_BOX, text).await?;
        self.exec.click(TWEET_BUTTON).await?;

        info!(chars = text.chars().count(), "tweeted");
        Ok(json!({ "text": text }))
    }

    // ── Likes ───────────────────────────────────────────────────────────────

    /// Like one tweet on its permalink page.
    pub async fn like(&self, tweet_id: &str, username: &str) -> Outcome {
        Outcome::from_result(self.like_inner(tweet_id, username).await)
    }

    async fn like_inner(&self, tweet_id: &str, username: &str) -> Result<Value> {
        self.exec.goto(&self.status_url(username, tweet_id)).await?;
        self.exec.wait_for(PERMALINK_FAVORITE).await?;

        let status = if self.exec.exists(PERMALINK_FAVORITED).await? {
            ALREADY_LIKED
        } else {
            match self.exec.click(PERMALINK_FAVORITE).await {
                Ok(()) => TWEET_LIKED,
                Err(_) => ALREADY_LIKED,
            }
        };

        info!(username, tweet_id, status, "like");
        Ok(json!({ "tweetId": tweet_id, "username": username, "status": status }))
    }

    /// Like every tweet visible on the profile's timeline.
    pub async fn like_recent_tweets(&self, username: &str) -> Outcome {
        Outcome::from_result(self.like_recent_tweets_inner(username).await)
    }

    async fn like_recent_tweets_inner(&self, username: &str) -> Result<Value> {
        self.exec.goto(&self.profile_url(username)).await?;
        self.exec.wait_for(TIMELINE_FAVORITE_ANCHOR).await?;

        let clicked = self.exec.click_all(FAVORITE_CONTROL).await?;
        let tweet_ids = self.exec.attrs_of(TWEET_ITEM, "data-tweet-id").await?;

        info!(username, clicked, tweets = tweet_ids.len(), "liked recent tweets");
        Ok(json!({ "username": username, "tweetIds": tweet_ids, "status": TWEETS_LIKED }))
    }

    /// Like the newest tweet on the profile's timeline.
    pub async fn like_last_tweet(&self, username: &str) -> Outcome {
        Outcome::from_result(self.like_last_tweet_inner(username).await)
    }

    async fn like_last_tweet_inner(&self, username: &str) -> Result<Value> {
        self.exec.goto(&self.profile_url(username)).await?;
        self.exec.wait_for(TIMELINE_FAVORITE_ANCHOR).await?;

        let status = match self.exec.click(FAVORITE_CONTROL).await {
            Ok(()) => TWEET_LIKED,
            Err(_) => ALREADY_LIKED,
        };
        let tweet_id = self.exec.attr_of(TWEET_ITEM, "data-tweet-id").await?;

        info!(username, ?tweet_id, status, "like last tweet");
        Ok(json!({ "username": username, "tweetId": tweet_id, "status": status }))
    }

    // ── Retweets ────────────────────────────────────────────────────────────

    /// Retweet one tweet on its permalink page.
    pub async fn retweet(&self, tweet_id: &str, username: &str) -> Outcome {
        Outcome::from_result(self.retweet_inner(tweet_id, username).await)
    }

    async fn retweet_inner(&self, tweet_id: &str, username: &str) -> Result<Value> {
        self.exec.goto(&self.status_url(username, tweet_id)).await?;
        self.exec.wait_for(PERMALINK_RETWEET).await?;

        let status = if self.exec.exists(PERMALINK_RETWEETED).await? {
            ALREADY_RETWEETED
        } else {
            match self.confirm_retweet(PERMALINK_RETWEET).await {
                Ok(()) => TWEET_RETWEETED,
                Err(_) => ALREADY_RETWEETED,
            }
        };

        info!(username, tweet_id, status, "retweet");
        Ok(json!({ "username": username, "tweetId": tweet_id, "status": status }))
    }

    /// Retweet the newest tweet on the profile's timeline.
    pub async fn retweet_last_tweet(&self, username: &str) -> Outcome {
        Outcome::from_result(self.retweet_last_tweet_inner(username).await)
    }

    async fn retweet_last_tweet_inner(&self, username: &str) -> Result<Value> {
        self.exec.goto(&self.profile_url(username)).await?;
        self.exec.wait_for(TIMELINE_RETWEET_ANCHOR).await?;

        let status = match self.confirm_retweet(RETWEET_CONTROL).await {
            Ok(()) => TWEET_RETWEETED,
            Err(_) => ALREADY_RETWEETED,
        };
        let tweet_id = self.exec.attr_of(TWEET_ITEM, "data-tweet-id").await?;

        info!(username, ?tweet_id, status, "retweet last tweet");
        Ok(json!({ "username": username, "tweetId": tweet_id, "status": status }))
    }

    /// Click a retweet control and confirm through the dialog.
    async fn confirm_retweet(&self, control: &str) -> Result<()> {
        self.exec.click(control).await?;
        self.exec.wait_for(RETWEET_CONFIRM).await?;
        self.exec.click(RETWEET_CONFIRM).await?;
        Ok(())
    }

    // ── Network sweeps ──────────────────────────────────────────────────────

    /// Follow everyone on a followers page. Without a username, the session's
    /// own followers page.
    pub async fn follow_network(&self, username: Option<&str>) -> Outcome {
        let url = self.followers_url(username);
        Outcome::from_result(self.sweep_inner(url, username, NETWORK_FOLLOWED).await)
    }

    /// Follow everyone `username` follows.
    pub async fn follow_interests(&self, username: &str) -> Outcome {
        let url = self.following_url(Some(username));
        Outcome::from_result(self.sweep_inner(url, Some(username), INTERESTS_FOLLOWED).await)
    }

    async fn sweep_inner(
        &self,
        url: String,
        username: Option<&str>,
        status: &str,
    ) -> Result<Value> {
        self.exec.goto(&url).await?;
        self.exec.wait_for(LIST_ANCHOR).await?;

        // Scrape before the click sweep mutates the button states.
        let users = drop_header_row(self.exec.texts_of(LIST_HANDLES).await?);
        let clicked = self.exec.click_all(LIST_FOLLOW_BUTTONS).await?;

        // Named to dodge the `use tracing::field::display` that tracing's
        // value-set macros inject into their expansion scope.
        let display_username = username.or(self.session_username);
        info!(username = ?display_username, clicked, users = users.len(), status, "follow sweep");
        Ok(json!({ "username": display_username, "users": users, "status": status }))
    }

    // ── Listings ────────────────────────────────────────────────────────────

    /// Follower handles, header row dropped.
    pub async fn followers(&self, username: Option<&str>) -> Outcome {
        Outcome::from_result(self.handles_inner(self.followers_url(username)).await)
    }

    /// Followed-account handles, header row dropped.
    pub async fn interests(&self, username: Option<&str>) -> Outcome {
        Outcome::from_result(self.handles_inner(self.following_url(username)).await)
    }

    async fn handles_inner(&self, url: String) -> Result<Value> {
        self.exec.goto(&url).await?;
        self.exec.wait_for(LIST_ANCHOR).await?;
        let handles = drop_header_row(self.exec.texts_of(LIST_HANDLES).await?);
        Ok(json!(handles))
    }
}

/// Drop the leading entry of a scraped handle list.
///
/// The list pages always render the viewer's own row first, so the first
/// scraped handle is never part of the answer. Zero or one raw entries yield
/// an empty list.
pub(crate) fn drop_header_row(mut handles: Vec<String>) -> Vec<String> {
    if !handles.is_empty() {
        handles.remove(0);
    }
    handles
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn drop_header_row_removes_exactly_one() {
        let raw = vec!["@self".to_owned(), "@alpha".to_owned(), "@beta".to_owned()];
        assert_eq!(drop_header_row(raw), vec!["@alpha", "@beta"]);
    }

    #[test]
    fn drop_header_row_tolerates_short_lists() {
        assert!(drop_header_row(Vec::new()).is_empty());
        assert!(drop_header_row(vec!["@only".to_owned()]).is_empty());
    }
}
