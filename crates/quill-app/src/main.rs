use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use i18n::I18n;
use quill_config::ConfigStore;
use quill_services::{BlogService, BlogServiceBuilder, PostDraft};
use quill_store::FileBackend;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Local-first personal blog")]
struct Args {
    /// Directory holding the post blob (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a new post
    New {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Attach a cover image file
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List posts, newest first
    List {
        /// Filter by title substring
        #[arg(long)]
        search: Option<String>,
    },

    /// Render one post as an HTML fragment
    Show { slug: String },

    /// Edit an existing post, addressed by slug
    Edit {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Replace the cover image
        #[arg(long)]
        image: Option<PathBuf>,
        /// Drop the cover image
        #[arg(long)]
        clear_image: bool,
    },

    /// Delete a post by id
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = ConfigStore::from_default_location()?.load_or_init()?;
    let i18n = I18n::new(config.language);

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tracing::debug!(dir = %data_dir.display(), "using data directory");
    let service = BlogServiceBuilder::new(Arc::new(FileBackend::new(data_dir)))
        .image_policy(config.image)
        .build();

    match args.command {
        Command::New {
            title,
            content,
            image,
        } => {
            let mut draft = PostDraft {
                id: None,
                title,
                content,
                image: None,
            };
            if let Some(path) = image {
                draft.image = Some(attach(&service, &i18n, &path, &draft.title).await?);
            }
            let post = service.save_post(draft)?;
            println!("{} {}", i18n.t("editor.saved"), post.slug);
        }

        Command::List { search } => {
            let posts = service.search(search.as_deref().unwrap_or(""));
            if posts.is_empty() {
                println!("{}", i18n.t("list.empty"));
                return Ok(());
            }
            for post in posts {
                println!(
                    "{}  {}  {}",
                    post.display_date().format("%Y-%m-%d %H:%M"),
                    post.slug,
                    post.title
                );
            }
        }

        Command::Show { slug } => {
            let Some(post) = service.find_by_slug(&slug) else {
                println!("{}", i18n.t("post.not_found"));
                println!("{}", i18n.t("post.invalid_link"));
                return Ok(());
            };
            println!("# {} ({})", post.title, post.display_date().format("%Y-%m-%d %H:%M"));
            if !post.has_image() {
                println!("[{}]", i18n.t("editor.no_image"));
            }
            println!("{}", service.body_html(&post));
        }

        Command::Edit {
            slug,
            title,
            content,
            image,
            clear_image,
        } => {
            let post = service
                .find_by_slug(&slug)
                .ok_or_else(|| anyhow!("{}: {slug}", i18n.t("post.not_found")))?;
            let mut draft = PostDraft::from_post(&post);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(content) = content {
                draft.content = content;
            }
            if clear_image {
                draft.image = None;
            }
            if let Some(path) = image {
                draft.image = Some(attach(&service, &i18n, &path, &draft.title).await?);
            }
            let post = service.save_post(draft)?;
            println!("{} {}", i18n.t("editor.saved"), post.slug);
        }

        Command::Delete { id } => {
            service.delete(id)?;
            println!("{}", i18n.t("post.deleted"));
        }
    }

    Ok(())
}

async fn attach(
    service: &BlogService,
    i18n: &I18n,
    path: &Path,
    title: &str,
) -> Result<quill_services::AttachedImage> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    service
        .attach_image(bytes, title, &file_name)
        .await
        .map_err(|error| anyhow!("{}: {error}", i18n.t("image.error")))
}

fn default_data_dir() -> Result<PathBuf> {
    let mut dir = dirs::data_dir().context("failed to resolve data_dir")?;
    dir.push("quill");
    Ok(dir)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
