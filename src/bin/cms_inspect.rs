use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cms_fallback::client::{CmsClient, COLLECTION_POPULATE, SINGLETON_POPULATE};
use cms_fallback::config;

#[derive(Parser, Debug)]
#[command(about = "Print the raw CMS response for one endpoint")]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Endpoint name under /api, e.g. `menu-items`
    #[arg(long)]
    endpoint: String,

    /// Use the single-document populate directives
    #[arg(long)]
    singleton: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load(args.config.as_deref())?;
    if !settings.is_configured() {
        return Err(anyhow!("{} is not set", config::ENV_URL));
    }

    let client = CmsClient::new(settings);
    let query = if args.singleton {
        SINGLETON_POPULATE
    } else {
        COLLECTION_POPULATE
    };
    let request = client.build_request(&args.endpoint, query)?;
    println!("GET {}", request.url());

    let res = reqwest::Client::new()
        .execute(request)
        .await
        .context("failed to reach CMS")?;
    println!("Status: {}", res.status());
    let body = res.text().await.context("failed to read CMS response")?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", body),
    }
    Ok(())
}
