//! services/client/src/bin/studybank.rs
//!
//! Command-line front end over the client stores. Every command prints JSON
//! on success; failures go to the log and set a non-zero exit code.

use clap::{Args, Parser, Subcommand};
use client_lib::{
    config::Config,
    context::{recorded, AppContext},
    error::ClientError,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use studybank_core::domain::{CollectionPatch, NewAnswer, NewCollection};
use studybank_core::image::{image_style, rotated_url};
use studybank_core::{Credentials, Id, ItemStatus, ListFilter, Registration, Rotation};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "studybank")]
#[command(author, version, about = "Client for the study question bank API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "STUDYBANK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in to it
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "STUDYBANK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Re-read the signed-in identity from the server
    Whoami,
    /// Item management commands
    #[command(subcommand)]
    Items(ItemCommands),
    /// Collection management commands
    #[command(subcommand)]
    Collections(CollectionCommands),
    /// Upload an image file
    Upload { file: PathBuf },
    /// Search tags
    Tags {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show progress statistics and recommendations
    Stats {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show where navigating to a path would land
    Route { path: String },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
    #[arg(long)]
    collection: Option<Id>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    difficulty: Option<u8>,
    #[arg(long)]
    status: Option<ItemStatus>,
    /// May be given more than once
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum ItemCommands {
    /// List one page of items
    List(ListArgs),
    /// Show one item with its image URLs
    Show { id: Id },
    /// Rotate one image of an item by a quarter turn
    Rotate {
        id: Id,
        #[arg(short, long, default_value = "0")]
        image: usize,
        /// Turn counter-clockwise instead
        #[arg(long)]
        ccw: bool,
    },
    /// Set or clear the review flag
    Review {
        id: Id,
        #[arg(long)]
        off: bool,
    },
    /// Record an attempt
    Answer {
        id: Id,
        #[arg(long)]
        wrong: bool,
        #[arg(long, default_value = "0")]
        seconds: u32,
    },
    /// Delete an item
    Delete { id: Id },
    /// Random items flagged for review
    ReviewSession {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(long)]
        subject: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CollectionCommands {
    /// List collections
    List {
        #[arg(long)]
        trash: bool,
    },
    /// Create a collection
    Create {
        name: String,
        #[arg(long = "type", default_value = "CUSTOM")]
        kind: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename a collection
    Rename { id: Id, name: String },
    /// Move a collection to the trash
    Delete { id: Id },
    /// Bring a collection back from the trash
    Restore { id: Id },
    /// Permanently delete a collection that is already in the trash
    Purge { id: Id },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(base_url = %config.api_base_url, "Configuration loaded");

    // --- 2. Build the Shared Context ---
    let ctx = AppContext::from_config(config)?;

    // --- 3. Dispatch ---
    match cli.command {
        Commands::Login { username, password } => {
            let user = ctx.auth.login(&Credentials { username, password }).await?;
            print_json(&user)
        }
        Commands::Register {
            username,
            email,
            password,
            role,
        } => {
            let registration = Registration {
                username,
                email,
                password,
                role,
            };
            let user = ctx.auth.register(&registration).await?;
            print_json(&user)
        }
        Commands::Logout => {
            ctx.auth.logout();
            print_json(&json!({ "authenticated": false }))
        }
        Commands::Whoami => {
            let user = ctx.auth.refresh().await?;
            print_json(&user)
        }
        Commands::Items(command) => items(&ctx, command).await,
        Commands::Collections(command) => collections(&ctx, command).await,
        Commands::Upload { file } => {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ClientError::Internal(format!("{} is not a file", file.display())))?;
            let data = tokio::fs::read(&file).await?;
            let asset = ctx.api.upload_image(&file_name, data).await?;
            print_json(&asset)
        }
        Commands::Tags { search } => {
            let tags = ctx.api.list_tags(search.as_deref()).await?;
            print_json(&tags)
        }
        Commands::Stats { limit } => {
            let dashboard = ctx.dashboard(limit).await?;
            print_json(&dashboard)
        }
        Commands::Route { path } => {
            let landed = ctx.guard.resolve(&path);
            print_json(&json!({ "requested": path, "resolved": landed.to_string() }))
        }
    }
}

async fn items(ctx: &AppContext, command: ItemCommands) -> Result<(), ClientError> {
    let store = &ctx.items;
    match command {
        ItemCommands::List(args) => {
            let filter = ListFilter {
                page: args.page,
                per_page: args.per_page,
                collection_id: args.collection,
                subject: args.subject,
                difficulty: args.difficulty,
                status: args.status,
                tags: args.tags,
                ..Default::default()
            };
            store.fetch_list(&filter).await;
            recorded(store.error())?;
            print_json(&json!({
                "items": store.list(),
                "pagination": store.pagination(),
            }))
        }
        ItemCommands::Show { id } => {
            let item = load_item(ctx, id).await?;
            let images: Vec<_> = item
                .images
                .iter()
                .map(|image| {
                    json!({
                        "url": rotated_url(image, item.updated_at),
                        "transform": image_style(image).transform(),
                    })
                })
                .collect();
            print_json(&json!({ "item": item, "display": images }))
        }
        ItemCommands::Rotate { id, image, ccw } => {
            let item = load_item(ctx, id).await?;
            let from = item
                .images
                .get(image)
                .map(|i| i.rotation)
                .ok_or_else(|| ClientError::Internal(format!("item {} has no image {}", id, image)))?;
            let to: Rotation = if ccw {
                from.counter_clockwise()
            } else {
                from.clockwise()
            };
            store.rotate_image(id, image, to).await?;
            print_json(&store.current())
        }
        ItemCommands::Review { id, off } => {
            let needs_review = store.toggle_review(id, !off).await?;
            print_json(&json!({ "id": id, "needs_review": needs_review }))
        }
        ItemCommands::Answer { id, wrong, seconds } => {
            let answer = NewAnswer {
                is_correct: !wrong,
                content: None,
                duration_seconds: seconds,
            };
            let receipt = store.submit_answer(id, &answer).await?;
            print_json(&json!({
                "message": receipt.message,
                "item_status": receipt.item_status,
            }))
        }
        ItemCommands::Delete { id } => {
            store.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        ItemCommands::ReviewSession { limit, subject } => {
            let items = store.review_session(limit, subject.as_deref()).await?;
            print_json(&items)
        }
    }
}

async fn collections(ctx: &AppContext, command: CollectionCommands) -> Result<(), ClientError> {
    let store = &ctx.collections;
    match command {
        CollectionCommands::List { trash } => {
            if trash {
                store.fetch_trash().await;
                recorded(store.error())?;
                print_json(&store.trash())
            } else {
                store.fetch_all().await;
                recorded(store.error())?;
                print_json(&store.active())
            }
        }
        CollectionCommands::Create { name, kind, color } => {
            let created = store
                .create(&NewCollection {
                    name,
                    kind,
                    icon: None,
                    color,
                })
                .await?;
            print_json(&created)
        }
        CollectionCommands::Rename { id, name } => {
            let patch = CollectionPatch {
                name: Some(name),
                ..Default::default()
            };
            let updated = store.update(id, &patch).await?;
            print_json(&updated)
        }
        CollectionCommands::Delete { id } => {
            let trashed = store.move_to_trash(id).await?;
            print_json(&trashed)
        }
        CollectionCommands::Purge { id } => {
            store.delete(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        CollectionCommands::Restore { id } => {
            let restored = store.restore(id).await?;
            print_json(&json!({ "restored": id, "collection": restored }))
        }
    }
}

async fn load_item(ctx: &AppContext, id: Id) -> Result<studybank_core::Item, ClientError> {
    match ctx.items.fetch_one(id).await {
        Some(item) => Ok(item),
        None => Err(ClientError::Internal(
            ctx.items
                .error()
                .unwrap_or_else(|| format!("item {} could not be loaded", id)),
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| ClientError::Internal(e.to_string()))?;
    println!("{}", out);
    Ok(())
}
