use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};

use memeverse::caption::CaptionProvider;
use memeverse::catalog::CatalogProvider;
use memeverse::comments::CommentLog;
use memeverse::config::Config;
use memeverse::engagement::EngagementRecord;
use memeverse::feed::FeedReconciler;
use memeverse::gallery::UploadGallery;
use memeverse::leaderboard::{LeaderboardAggregator, DEFAULT_TOP_MEMES, DEFAULT_TOP_USERS};
use memeverse::profile::ProfileRecord;
use memeverse::store::{SqliteStore, Store, StoreError};

/// Get the config directory path (~/.config/memeverse/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("memeverse"))
}

/// Encode a local image file as a data URI for storage.
fn file_to_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image file '{}'", path.display()))?;

    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => anyhow::bail!("Unsupported image type (expected png, jpg, gif, or webp)"),
    };

    Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
}

#[derive(Parser, Debug)]
#[command(name = "memeverse", about = "Meme gallery engagement store and feed driver")]
struct Args {
    /// Reset the local store (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the catalog and print the reconciled feed
    Feed {
        /// Filter memes by name (case-insensitive substring)
        #[arg(long)]
        search: Option<String>,
    },
    /// Toggle the liked state for a meme
    Like { meme_id: String },
    /// Increment a meme's like counter (the detail-view action)
    Heart { meme_id: String },
    /// Append a comment to a meme
    Comment { meme_id: String, text: String },
    /// Print a meme's comment log
    Comments { meme_id: String },
    /// Print the top-memes and top-users rankings
    Leaderboard,
    /// Store a local image as an uploaded meme
    Upload {
        file: PathBuf,
        /// Caption text for the upload
        #[arg(long)]
        caption: Option<String>,
        /// Ask the caption provider for a suggestion (fixed fallback offline)
        #[arg(long)]
        suggest_caption: bool,
    },
    /// Show or update the local profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Local image file to use as the avatar
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only directory access: the store holds profile data and uploads
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                tracing::warn!(path = %config_dir.display(), error = %e, "Failed to set config directory permissions");
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))?;
    let db_path = config_dir.join("memeverse.db");

    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete store")?;
        println!("Local store reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in store path"))?;
    let backend = match SqliteStore::open(db_path_str).await {
        Ok(backend) => backend,
        Err(e @ StoreError::InstanceLocked) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open store: {}", e)),
    };
    let store = Store::new(std::sync::Arc::new(backend));

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let client = reqwest::Client::new();
    let engagement = EngagementRecord::new(store.clone());

    let Some(command) = args.command else {
        println!("Nothing to do. Try `memeverse feed` or `memeverse --help`.");
        return Ok(());
    };

    match command {
        Command::Feed { search } => {
            let provider = CatalogProvider::new(client, config.catalog_url, timeout);
            let mut feed = FeedReconciler::new(
                provider,
                engagement,
                Duration::from_millis(config.search_debounce_ms),
                config.allowed_image_hosts,
            );
            feed.load_initial().await;
            if let Some(query) = search {
                // Explicit one-shot query: no keystrokes to coalesce
                feed.search_now(&query);
            }

            let items = feed.items().await?;
            if items.is_empty() {
                println!("No memes to show.");
            }
            for item in items {
                let liked = if item.is_liked { " (liked)" } else { "" };
                let blocked = if item.display_allowed { "" } else { " [image host not allowed]" };
                println!(
                    "{} [{}] {} likes{}{}",
                    item.meme.name, item.meme.id, item.like_count, liked, blocked
                );
            }
        }
        Command::Like { meme_id } => {
            let provider = CatalogProvider::new(client, config.catalog_url, timeout);
            let mut feed = FeedReconciler::new(
                provider,
                engagement,
                Duration::from_millis(config.search_debounce_ms),
                config.allowed_image_hosts,
            );
            feed.load_initial().await;

            match feed.catalog().find(&meme_id).cloned() {
                Some(meme) => {
                    let now_liked = feed.toggle_like(&meme).await?;
                    println!(
                        "{} is now {}.",
                        meme.name,
                        if now_liked { "liked" } else { "unliked" }
                    );
                }
                None => {
                    eprintln!("No meme with id '{meme_id}' in the catalog.");
                    std::process::exit(1);
                }
            }
        }
        Command::Heart { meme_id } => {
            let count = engagement.increment_like_count(&meme_id).await?;
            println!("❤️ {count} likes");
        }
        Command::Comment { meme_id, text } => {
            let log = CommentLog::new(store);
            if log.append(&meme_id, &text).await? {
                println!("Comment added.");
            } else {
                eprintln!("Comment text must not be empty.");
                std::process::exit(1);
            }
        }
        Command::Comments { meme_id } => {
            let log = CommentLog::new(store);
            let comments = log.comments(&meme_id).await?;
            if comments.is_empty() {
                println!("No comments yet. Be the first to comment!");
            }
            for comment in comments {
                println!("- {comment}");
            }
        }
        Command::Leaderboard => {
            let board = LeaderboardAggregator::new(engagement);

            println!("Top memes:");
            let memes = board.top_memes(DEFAULT_TOP_MEMES).await?;
            if memes.is_empty() {
                println!("  No memes have been liked yet.");
            }
            for (rank, entry) in memes.iter().enumerate() {
                println!(
                    "  #{} {}: {} likes",
                    rank + 1,
                    entry.meme.name,
                    entry.like_count
                );
            }

            println!("Top users:");
            let users = board.top_users(DEFAULT_TOP_USERS).await?;
            if users.is_empty() {
                println!("  No user rankings yet.");
            }
            for (rank, entry) in users.iter().enumerate() {
                println!("  #{} {}: {} points", rank + 1, entry.username, entry.score);
            }
        }
        Command::Upload {
            file,
            caption,
            suggest_caption,
        } => {
            let data_uri = file_to_data_uri(&file)?;
            let caption = match caption {
                Some(text) => text,
                None if suggest_caption => {
                    let provider = CaptionProvider::new(client, config.caption_url, timeout);
                    provider.suggest().await
                }
                None => String::new(),
            };

            let gallery = UploadGallery::new(store);
            gallery.add(&data_uri, &caption).await?;
            println!("Meme uploaded.");
            if !caption.is_empty() {
                println!("Caption: {caption}");
            }
        }
        Command::Profile { name, bio, avatar } => {
            let record = ProfileRecord::new(store);
            let mut profile = record.load().await?;

            let mut dirty = false;
            if let Some(name) = name {
                profile.name = name;
                dirty = true;
            }
            if let Some(bio) = bio {
                profile.bio = bio;
                dirty = true;
            }
            if let Some(avatar) = avatar {
                profile.avatar_url = file_to_data_uri(&avatar)?;
                dirty = true;
            }
            if dirty {
                record.save(&profile).await?;
                println!("Profile updated!");
            }

            println!("Name: {}", profile.name);
            println!("Bio:  {}", profile.bio);
            if profile.avatar_url.starts_with("data:") {
                println!("Avatar: <custom image>");
            } else {
                println!("Avatar: {}", profile.avatar_url);
            }
        }
    }

    Ok(())
}
