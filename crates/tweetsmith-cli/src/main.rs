mod commands;
mod pipeline;
mod scheduler;
mod wiring;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tweetsmith_core::ContentKind;

#[derive(Debug, Parser)]
#[command(name = "tweetsmith")]
#[command(about = "Generate short posts with AI and publish them to X")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Post at the configured times until interrupted
    Schedule,
    /// Generate and post immediately
    Run {
        /// Content kind (quote, story, prediction, meme); defaults to TWEETSMITH_CONTENT_KIND
        #[arg(long)]
        kind: Option<ContentKind>,
        /// Number of posts to generate
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Show recent post history
    History {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Generate and post one crypto prediction
    Crypto,
    /// Reply to a post with a generated meme
    MemeReply {
        tweet_id: String,
        /// Print the reply instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the authenticated account
    Account,
    /// Delete a post
    Delete { tweet_id: String },
    /// Preview how a text would be split into a thread
    Split {
        /// Maximum characters per post; defaults to TWEETSMITH_MAX_POST_LENGTH
        #[arg(long)]
        limit: Option<usize>,
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = tweetsmith_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Schedule => commands::run_schedule(&config).await?,
        Commands::Run { kind, count } => {
            commands::run_now(&config, kind.unwrap_or(config.content_kind), count).await?;
        }
        Commands::History { days } => commands::run_history(&wiring::store(&config), days),
        Commands::Crypto => commands::run_now(&config, ContentKind::Prediction, 1).await?,
        Commands::MemeReply { tweet_id, dry_run } => {
            commands::run_meme_reply(&config, &tweet_id, dry_run).await?;
        }
        Commands::Account => commands::run_account(&config).await?,
        Commands::Delete { tweet_id } => commands::run_delete(&config, &tweet_id).await?,
        Commands::Split { limit, text } => {
            commands::run_split(&text, limit.unwrap_or(config.max_post_length));
        }
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal");
}
