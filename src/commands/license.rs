//! mkt license コマンド
//!
//! ライセンスキーの保存・削除・状態表示。キーの保存/削除は資格情報の
//! 変更なので応答キャッシュを全破棄する。

use crate::commands::build_client;
use crate::config::MktConfig;
use crate::marketplace::{delete_license_key, save_license_key, Consumer};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate and store a license key
    Set {
        /// License key obtained from the marketplace
        license_key: String,
    },

    /// Remove the stored license key
    Remove,

    /// Show the current license state
    Show,
}

pub async fn run(args: Args) -> Result<(), String> {
    match args.command {
        Command::Set { license_key } => run_set(license_key).await,
        Command::Remove => run_remove().await,
        Command::Show => run_show().await,
    }
}

async fn run_set(license_key: String) -> Result<(), String> {
    let mut config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;

    let profile = save_license_key(&mut config, &client, &license_key)
        .await
        .map_err(|e| e.to_string())?;

    println!("{} License key saved.", "✓".green());

    let consumer = Consumer::new(Some(profile));
    if let Some(expire_date) = consumer.expire_date_long() {
        println!("Valid until {}.", expire_date);
    }

    Ok(())
}

async fn run_remove() -> Result<(), String> {
    let mut config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;

    delete_license_key(&mut config, &client)
        .await
        .map_err(|e| e.to_string())?;

    println!("License key removed.");
    Ok(())
}

async fn run_show() -> Result<(), String> {
    let config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;

    let consumer = Consumer::new(client.get_consumer().await.map_err(|e| e.to_string())?);

    let Some(profile) = consumer.profile() else {
        println!("No license key set, or the key is not valid.");
        return Ok(());
    };

    println!(
        "License: {}",
        if profile.is_valid { "valid" } else { "not valid" }
    );

    if profile.is_expired {
        println!("Status: expired");
    }

    if let Some(expire_date) = consumer.expire_date_long() {
        println!("Valid until: {}", expire_date);
    }

    if let Some(distributor) = consumer.distributor() {
        println!("Distributor: {}", distributor);
    }

    let whitelist = consumer.whitelisted_distributors();
    if !whitelist.is_empty() {
        println!("Whitelisted distributors: {}", whitelist.join(", "));
    }

    Ok(())
}
