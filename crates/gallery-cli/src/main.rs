//! Gallery CLI: drives the asset coordinator against the configured database and blob store.
//!
//! Configuration comes from the environment (see `.env.example`). Output is JSON on stdout;
//! logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gallery_cli::{build_patch, init_tracing, read_upload, write_stream};
use gallery_core::{AssetQuery, Config};
use gallery_db::AssetRepository;
use gallery_services::{create_storage, AssetService, Storage};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gallery", about = "Media asset gallery CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upload a file on behalf of an owner
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Owner UUID
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Override the content type guessed from the file extension
        #[arg(long)]
        content_type: Option<String>,
        /// Override the recorded file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Show one asset; with --owner, only if it belongs to that owner
    Get {
        id: Uuid,
        #[arg(long)]
        owner: Option<Uuid>,
    },
    /// List all assets, newest first
    List,
    /// Search by owner, by title/description fragment, or both
    Search {
        #[arg(long)]
        owner: Option<Uuid>,
        #[arg(long)]
        fragment: Option<String>,
    },
    /// Write an asset's content to a file
    Download {
        id: Uuid,
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        output: PathBuf,
    },
    /// Edit an asset's title or description
    Update {
        id: Uuid,
        #[arg(long)]
        owner: Uuid,
        #[arg(long, conflicts_with = "clear_title")]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_title: bool,
        #[arg(long)]
        clear_description: bool,
    },
    /// Delete an asset and its content
    Delete {
        id: Uuid,
        #[arg(long)]
        owner: Uuid,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn owned(service: &AssetService, id: Uuid, owner: Uuid) -> anyhow::Result<gallery_core::Asset> {
    service
        .get_owned(id, owner)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Asset {} not found", id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = gallery_db::connect(&config).await?;

    if let Commands::Migrate = cli.command {
        gallery_db::run_migrations(&pool).await?;
        return print_json(&serde_json::json!({ "success": true, "message": "Migrations applied" }));
    }

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::debug!(backend = %storage.backend_type(), "Storage backend ready");
    let service = AssetService::new(storage, Arc::new(AssetRepository::new(pool)));

    match cli.command {
        Commands::Migrate => {}
        Commands::Upload {
            file,
            owner,
            title,
            description,
            content_type,
            name,
        } => {
            let upload = read_upload(&file, name, content_type).await?;
            let asset = service.create(&upload, title, description, owner).await?;
            print_json(&asset)?;
        }
        Commands::Get { id, owner } => {
            let asset = match owner {
                Some(owner) => service.get_owned(id, owner).await?,
                None => service.get(id).await?,
            }
            .ok_or_else(|| anyhow::anyhow!("Asset {} not found", id))?;
            print_json(&asset)?;
        }
        Commands::List => {
            print_json(&service.list().await?)?;
        }
        Commands::Search { owner, fragment } => {
            let query = AssetQuery {
                owner_id: owner,
                fragment,
            };
            print_json(&service.search(&query).await?)?;
        }
        Commands::Download { id, owner, output } => {
            let asset = owned(&service, id, owner).await?;
            let stream = service.retrieve(&asset).await?;
            let written = write_stream(stream, &output).await?;
            print_json(&serde_json::json!({
                "id": asset.id(),
                "output": output,
                "size_bytes": written,
            }))?;
        }
        Commands::Update {
            id,
            owner,
            title,
            description,
            clear_title,
            clear_description,
        } => {
            let patch = build_patch(title, clear_title, description, clear_description);
            if patch.is_empty() {
                anyhow::bail!("Nothing to update: pass --title, --description or a --clear flag");
            }
            let asset = owned(&service, id, owner).await?;
            let updated = service.update(asset, patch).await?;
            print_json(&updated)?;
        }
        Commands::Delete { id, owner } => {
            let asset = owned(&service, id, owner).await?;
            service.delete(&asset).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("Asset {} deleted", id) }),
            )?;
        }
    }

    Ok(())
}
