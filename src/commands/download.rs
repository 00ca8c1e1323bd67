//! mkt download コマンド
//!
//! 最新バージョンのパッケージを一時ファイルへダウンロードし、パスを表示する。
//! 保存されたファイルの後始末は利用者の責務。

use crate::commands::build_client;
use crate::config::MktConfig;
use clap::Parser;
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
pub struct Args {
    /// Plugin or theme name
    pub name: String,
}

pub async fn run(args: Args) -> Result<(), String> {
    let config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;

    match client.download(&args.name).await {
        Ok(Some(path)) => {
            println!(
                "{} Downloaded '{}' to {}",
                "✓".green(),
                args.name,
                path.display()
            );
            Ok(())
        }
        Ok(None) => Err(format!("Download of '{}' failed.", args.name)),
        Err(e) => Err(e.to_string()),
    }
}
