mod oauth_client;
mod tweet_client;

pub use oauth_client::OAuthClient;
pub use tweet_client::{PostedTweet, TweetClient};
