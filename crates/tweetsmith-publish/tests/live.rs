//! Live checks against the real X API.
//!
//! Ignored by default. Run with a token in the environment:
//! `TWITTER_BEARER_TOKEN=... cargo test -p tweetsmith-publish --test live -- --ignored`

use tweetsmith_publish::XClient;

fn token() -> String {
    std::env::var("TWITTER_BEARER_TOKEN")
        .or_else(|_| std::env::var("TWITTER_ACCESS_TOKEN"))
        .expect("set TWITTER_BEARER_TOKEN or TWITTER_ACCESS_TOKEN")
}

#[tokio::test]
#[ignore = "calls the live X API"]
async fn live_account_info() {
    let client = XClient::new(&token(), 30).unwrap();
    let account = client.account_info().await.unwrap();
    assert!(!account.username.is_empty());
}
