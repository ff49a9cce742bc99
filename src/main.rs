use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use cms_fallback::config;
use cms_fallback::prefetch;
use cms_fallback::{resolve_media_url, CmsClient, ImageCache};

#[derive(Debug, Parser)]
#[command(author, version, about = "Fetch CMS content for the site, degrading to empty data")]
struct Args {
    /// Optional YAML config file; environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch all content, mirror images and write a JSON manifest
    Prefetch {
        #[arg(long, default_value = "content/manifest.json")]
        out: PathBuf,
    },
    /// Print menu items as JSON
    Menu,
    /// Print the homepage document as JSON
    Homepage,
    /// Print the absolute URL for a media path
    Resolve { path: String },
    /// Cache one image (in production mode) and print the displayable URL
    CacheImage { path: String },
    /// Print an example YAML config
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let settings = match args.config.as_deref() {
        Some(path) => {
            let settings = config::load_or_unconfigured(Some(path))?;
            settings.announce();
            settings
        }
        None => config::global().clone(),
    };

    match args.command {
        Command::Prefetch { out } => {
            let client = CmsClient::new(settings.clone());
            let images = ImageCache::new(settings);
            let manifest = prefetch::run(&client, &images).await;
            prefetch::write_manifest(&out, &manifest).await?;
            info!(path = %out.display(), "wrote content manifest");
        }
        Command::Menu => {
            let client = CmsClient::new(settings);
            let menu = client.fetch_menu_items().await;
            println!("{}", serde_json::to_string_pretty(&menu)?);
        }
        Command::Homepage => {
            let client = CmsClient::new(settings);
            let home = client.fetch_homepage().await;
            println!("{}", serde_json::to_string_pretty(&home)?);
        }
        Command::Resolve { path } => match resolve_media_url(&settings, Some(path.as_str())) {
            Some(url) => println!("{}", url),
            None => println!("(unresolved)"),
        },
        Command::CacheImage { path } => {
            let images = ImageCache::new(settings);
            match images.cache_image(Some(path.as_str())).await {
                Some(url) => println!("{}", url),
                None => println!("(unresolved)"),
            }
        }
        Command::ExampleConfig => {}
    }

    Ok(())
}
