use crate::cli::{Cli, Command};
use crate::config::MktConfig;
use crate::marketplace::{FileCache, HttpService, MarketplaceClient};

pub async fn dispatch(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Search(args) => search::run(args).await,
        Command::Info(args) => info::run(args).await,
        Command::Updates(args) => updates::run(args).await,
        Command::Download(args) => download::run(args).await,
        Command::License(args) => license::run(args).await,
    }
}

/// 設定からクライアントを組み立てる
pub(crate) fn build_client(config: &MktConfig) -> Result<MarketplaceClient, String> {
    let service = HttpService::with_license_key(config.domain.clone(), config.license_key.clone());
    let cache = FileCache::new().map_err(|e| e.to_string())?;

    Ok(MarketplaceClient::new(
        Box::new(service),
        Box::new(cache),
        config.core_version.clone(),
    ))
}

pub mod download;
pub mod info;
pub mod license;
pub mod search;
pub mod updates;
