//! Reelfeed command-line shell
//!
//! Stands in for the mobile presentation layer: one subcommand per feed
//! operation, plain text output. All state lives in the core crate's
//! database; each invocation restores the persisted session first.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use reelfeed_core::feed::{LocalFeed, RemoteFeed};
use reelfeed_core::models::{LocalVideo, Session, Video};
use reelfeed_core::{config, db, session};

/// Command-line arguments for reelfeed
#[derive(Parser, Debug)]
#[command(name = "reelfeed")]
#[command(about = "Short-video learning feed")]
#[command(version)]
struct Args {
    /// Directory holding the database file
    #[arg(short, long, env = "REELFEED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Use the local side-table feed instead of the document collection
    #[arg(long)]
    local: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in (amy@stu.com for a student, pat@cre.com for a creator)
    Login { email: String },
    /// Sign out
    Logout,
    /// Show the feed
    Feed {
        /// Only this creator's videos (document-collection mode only)
        #[arg(long)]
        creator: Option<Uuid>,
    },
    /// Toggle your like on a video
    Like { video_id: Uuid },
    /// Comment on a video
    Comment {
        video_id: Uuid,
        /// Comment text; whitespace-only input is dropped
        text: Vec<String>,
    },
    /// Publish a new video (creators only)
    Publish {
        #[arg(long)]
        title: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Reference to the playable media
        #[arg(long)]
        url: String,
    },
    /// Delete one of your videos (creators only, document-collection mode)
    Delete { video_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelfeed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_dir = config::resolve_data_dir(args.data_dir.as_deref());
    let db_path = config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    if let Command::Login { email } = &args.command {
        let session = session::login(&pool, email)
            .await
            .context("Login failed")?;
        println!(
            "Signed in as {} ({})",
            session.identity.email, session.identity.role
        );
        return Ok(());
    }

    if let Command::Logout = &args.command {
        session::logout(&pool).await.context("Logout failed")?;
        println!("Signed out");
        return Ok(());
    }

    // Every other command needs a session; absent means go sign in first
    let Some(session) = session::restore(&pool).await.context("Session restore failed")? else {
        println!("Not signed in. Run `reelfeed login <email>` first.");
        return Ok(());
    };

    if args.local {
        run_local(pool, session, args.command).await
    } else {
        run_remote(pool, session, args.command).await
    }
}

async fn run_remote(
    pool: sqlx::SqlitePool,
    session: Session,
    command: Command,
) -> Result<()> {
    match command {
        Command::Login { .. } | Command::Logout => unreachable!("handled before dispatch"),
        Command::Feed { creator } => {
            let feed = match creator {
                Some(creator_id) => {
                    RemoteFeed::load_for_creator(pool, session, creator_id).await
                }
                None => RemoteFeed::load_all(pool, session).await,
            };
            if feed.videos().is_empty() {
                println!("No videos yet.");
            }
            for video in feed.videos() {
                print_video(video);
            }
        }
        Command::Like { video_id } => {
            let mut feed = RemoteFeed::load_all(pool, session).await;
            let uid = feed.session().identity.uid;
            let video = feed.toggle_like(video_id).await.context("Like failed")?;
            let verb = if video.is_liked_by(uid) {
                "Liked"
            } else {
                "Unliked"
            };
            println!("{} \"{}\" ({} likes)", verb, video.title, video.like_count());
        }
        Command::Comment { video_id, text } => {
            let mut feed = RemoteFeed::load_all(pool, session).await;
            match feed
                .post_comment(video_id, &text.join(" "))
                .await
                .context("Comment failed")?
            {
                Some(comment) => println!("{}: {}", comment.author, comment.text),
                None => println!("Empty comment dropped."),
            }
        }
        Command::Publish { title, tags, url } => {
            let mut feed = RemoteFeed::load_all(pool, session).await;
            let video = feed
                .publish(&title, &tags, &url)
                .await
                .context("Publish failed")?;
            println!("Published \"{}\" as {}", video.title, video.id);
        }
        Command::Delete { video_id } => {
            let mut feed = RemoteFeed::load_all(pool, session).await;
            if feed.delete(video_id).await {
                println!("Deleted {}", video_id);
            } else {
                println!("Could not delete {}", video_id);
            }
        }
    }
    Ok(())
}

async fn run_local(pool: sqlx::SqlitePool, session: Session, command: Command) -> Result<()> {
    match command {
        Command::Login { .. } | Command::Logout => unreachable!("handled before dispatch"),
        Command::Feed { creator } => {
            if creator.is_some() {
                println!("Creator filtering is not available in local mode.");
                return Ok(());
            }
            let feed = LocalFeed::load(pool, session).await;
            for video in feed.videos() {
                print_local_video(video);
            }
        }
        Command::Like { video_id } => {
            let mut feed = LocalFeed::load(pool, session).await;
            let count = feed.toggle_like(video_id).await.context("Like failed")?;
            println!("Liked ({} total)", count);
        }
        Command::Comment { video_id, text } => {
            let mut feed = LocalFeed::load(pool, session).await;
            match feed
                .post_comment(video_id, &text.join(" "))
                .await
                .context("Comment failed")?
            {
                Some(comment) => println!("{}: {}", comment.author, comment.text),
                None => println!("Empty comment dropped."),
            }
        }
        Command::Publish { title, tags, url } => {
            let mut feed = LocalFeed::load(pool, session).await;
            let video = feed
                .publish(&title, &tags, &url)
                .await
                .context("Publish failed")?;
            println!("Published \"{}\" as {}", video.title, video.id);
        }
        Command::Delete { .. } => {
            println!("Delete is not available in local mode.");
        }
    }
    Ok(())
}

fn print_video(video: &Video) {
    println!(
        "{}  {}  by {}  [{}]  {} likes, {} comments",
        video.id,
        video.title,
        video.creator_name,
        video.tags.join(", "),
        video.like_count(),
        video.comment_count()
    );
}

fn print_local_video(video: &LocalVideo) {
    println!(
        "{}  {}  by {}  [{}]  {} likes, {} comments",
        video.id,
        video.title,
        video.creator,
        video.tags.join(", "),
        video.like_count,
        video.comments.len()
    );
}
