//! Directory inspection commands: `targets`, `peers`, `chat-type`.

use anyhow::{Context, Result};
use contracts::{AudienceSelector, DispatcherConfig, PeerServer};
use directory::{ConnectionDirectory, DynamoScanStore};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::{ChatTypeArgs, PeersArgs, TargetsArgs};

#[derive(Serialize)]
struct TargetsOutput<'a> {
    tenant: &'a str,
    audience: &'static str,
    count: usize,
    connection_ids: Vec<&'a str>,
}

async fn open_directory(config: &DispatcherConfig) -> ConnectionDirectory<DynamoScanStore> {
    let sdk = dispatcher::load_aws_config(config).await;
    info!(
        region = %config.directory.region,
        endpoint = config.directory.endpoint.as_deref().unwrap_or("regional"),
        "Opening connection directory"
    );
    let store = DynamoScanStore::from_sdk_config(&sdk, &config.directory);
    ConnectionDirectory::from_config(store, &config.directory)
}

/// Execute the `targets` command
pub async fn run_targets(args: &TargetsArgs) -> Result<()> {
    let (config, _) = load_config(&args.config)?;
    let directory = open_directory(&config).await;
    let audience = AudienceSelector::parse(&args.audience);

    let targets = directory
        .resolve_targets(&args.tenant, audience)
        .await
        .with_context(|| format!("Failed to resolve connections of '{}'", args.tenant))?;

    if args.json {
        let output = TargetsOutput {
            tenant: &args.tenant,
            audience: audience.as_str(),
            count: targets.len(),
            connection_ids: targets.iter().map(|t| t.as_str()).collect(),
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize targets")?;
        println!("{}", json);
    } else {
        println!(
            "{} connection(s) for tenant '{}' (audience: {})",
            targets.len(),
            args.tenant,
            audience.as_str()
        );
        for target in &targets {
            println!("  {}", target);
        }
    }
    Ok(())
}

/// Execute the `peers` command
pub async fn run_peers(args: &PeersArgs) -> Result<()> {
    let (config, _) = load_config(&args.config)?;
    let directory = open_directory(&config).await;

    let peers = directory
        .resolve_peers()
        .await
        .context("Failed to resolve chat servers")?;

    if args.json {
        let output: Vec<PeerServer> = peers.iter().collect();
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize peers")?;
        println!("{}", json);
    } else {
        println!("{} chat server(s)", peers.len());
        for peer in peers.iter() {
            println!("  {}", peer.url(&config.broadcast.publish_path));
        }
    }
    Ok(())
}

/// Execute the `chat-type` command
pub async fn run_chat_type(args: &ChatTypeArgs) -> Result<()> {
    let (config, _) = load_config(&args.config)?;
    let directory = open_directory(&config).await;

    let chat_type = directory
        .resolve_chat_type()
        .await
        .context("Failed to read chat type")?;

    println!("{}", chat_type);
    Ok(())
}
