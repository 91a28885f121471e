//! Handlers for each CLI subcommand.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tweetsmith_content::TweetContext;
use tweetsmith_core::{split_into_thread, AppConfig, ContentKind};
use tweetsmith_store::PostStore;

use crate::pipeline::print_preview;
use crate::scheduler::Scheduler;
use crate::wiring;

pub async fn run_schedule(config: &AppConfig) -> anyhow::Result<()> {
    let pipeline = wiring::pipeline(config).await?;
    let mut scheduler = Scheduler::new(
        pipeline,
        config.post_times.clone(),
        config.content_kind,
        Duration::from_secs(config.poll_interval_secs),
    );

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        crate::shutdown_signal().await;
        let _ = tx.send(true);
    });

    scheduler.run(rx).await;
    Ok(())
}

/// Generate and publish `count` posts now, without slot dedup.
pub async fn run_now(config: &AppConfig, kind: ContentKind, count: usize) -> anyhow::Result<()> {
    let pipeline = wiring::pipeline(config).await?;
    let mut failed = 0;

    for (i, draft) in pipeline.prepare_batch(kind, count).await.into_iter().enumerate() {
        if !config.auto_post {
            print_preview(&draft, config.max_post_length);
        }
        match pipeline.publish(draft, Local::now().naive_local()).await {
            Ok(published) => tracing::info!(
                item = i + 1,
                count,
                fragments = published.fragments,
                ids = ?published.ids,
                "run: post complete"
            ),
            Err(e) => {
                failed += 1;
                tracing::error!(item = i + 1, count, error = %e, "run: post failed");
            }
        }
    }

    if count > 0 && failed == count {
        anyhow::bail!("all {count} posts failed to publish");
    }
    Ok(())
}

pub fn run_history(store: &PostStore, days: u32) {
    let posts = store.history(days);
    if posts.is_empty() {
        println!("No posts in the last {days} day(s).");
        return;
    }
    println!("{} post(s) in the last {days} day(s):", posts.len());
    for post in &posts {
        println!(
            "{}  {:<7}  {}",
            post.posted_at.format("%Y-%m-%d %H:%M"),
            post.slot().to_string(),
            post.text
        );
        if let Some(image) = &post.image_path {
            println!("                   image: {image}");
        }
    }
}

pub async fn run_meme_reply(config: &AppConfig, tweet_id: &str, dry_run: bool) -> anyhow::Result<()> {
    let tweet = wiring::reader(config)?.get_tweet(tweet_id).await?;
    tracing::info!(tweet_id, author = %tweet.author_username, "meme-reply: fetched tweet");
    let context = TweetContext {
        text: tweet.text,
        author: tweet.author_username,
    };

    let dry_run = dry_run || !config.auto_post;
    // A dry run never needs a write token.
    let pipeline = if dry_run {
        let mut preview = config.clone();
        preview.auto_post = false;
        wiring::pipeline(&preview).await?
    } else {
        wiring::pipeline(config).await?
    };

    let (concept, draft) = pipeline.prepare_meme_reply(tweet_id, &context).await;
    println!("Replying to @{}: {}", context.author, context.text);
    println!(
        "Meme ({:?}): {} / {}",
        concept.meme_type, concept.text_top, concept.text_bottom
    );
    if dry_run {
        print_preview(&draft, config.max_post_length);
        return Ok(());
    }

    let published = pipeline.reply(draft, tweet_id).await?;
    println!("Posted reply {}", published.ids.join(", "));
    Ok(())
}

pub async fn run_account(config: &AppConfig) -> anyhow::Result<()> {
    let account = wiring::reader(config)?.account_info().await?;
    println!("@{} ({})", account.username, account.name);
    println!("id:        {}", account.id);
    println!("followers: {}", account.followers_count);
    println!("following: {}", account.following_count);
    println!("posts:     {}", account.tweet_count);
    if !account.description.is_empty() {
        println!("bio:       {}", account.description);
    }
    Ok(())
}

pub async fn run_delete(config: &AppConfig, tweet_id: &str) -> anyhow::Result<()> {
    if wiring::writer(config)?.delete_tweet(tweet_id).await? {
        println!("Deleted {tweet_id}");
    } else {
        println!("X did not delete {tweet_id}");
    }
    Ok(())
}

pub fn run_split(text: &str, limit: usize) {
    let fragments = split_into_thread(text, limit);
    for (i, fragment) in fragments.iter().enumerate() {
        println!("{:>2}. [{} chars] {fragment}", i + 1, fragment.chars().count());
    }
}
