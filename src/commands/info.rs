//! mkt info コマンド
//!
//! プラグイン単体の補強済みカタログ情報を表示する。

use crate::commands::build_client;
use crate::config::MktConfig;
use crate::dependency::CoreDependencyResolver;
use crate::marketplace::{Catalog, EnrichedPlugin};
use crate::registry::{InstalledPlugins, PluginRegistry};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};

/// 出力形式
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
pub struct Args {
    /// Plugin or theme name
    pub name: String,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,
}

pub async fn run(args: Args) -> Result<(), String> {
    let config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;
    let registry = InstalledPlugins::load().map_err(|e| e.to_string())?;
    let resolver = CoreDependencyResolver::new(&config.core_version, &registry.loaded_plugins());
    let catalog = Catalog::new(&client, &registry, &resolver);

    let detail = catalog
        .get_plugin_info(&args.name)
        .await
        .map_err(|e| e.to_string())?;

    match args.format {
        OutputFormat::Table => print_table(&detail),
        OutputFormat::Json => print_json(&detail)?,
    }

    Ok(())
}

fn print_table(detail: &EnrichedPlugin) {
    let plugin = &detail.plugin;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);

    table.add_row(vec!["Name", &plugin.name]);
    table.add_row(vec![
        "Owner",
        plugin.owner.as_deref().unwrap_or("-"),
    ]);
    table.add_row(vec![
        "Description",
        plugin.description.as_deref().unwrap_or("-"),
    ]);
    table.add_row(vec![
        "Homepage",
        plugin.homepage.as_deref().unwrap_or("-"),
    ]);
    table.add_row(vec!["License", plugin.license.as_deref().unwrap_or("-")]);
    table.add_row(vec![
        "Type",
        if plugin.is_theme { "theme" } else { "plugin" },
    ]);
    table.add_row(vec![
        "Pricing",
        if plugin.is_paid { "paid" } else { "free" },
    ]);
    table.add_row(vec!["Downloads", &plugin.num_downloads.to_string()]);
    table.add_row(vec![
        "Last updated",
        plugin.last_updated.as_deref().unwrap_or("-"),
    ]);
    table.add_row(vec![
        "Installed",
        if detail.is_installed { "yes" } else { "no" },
    ]);

    if let Some(current) = &detail.current_version {
        table.add_row(vec!["Installed version", current]);
    }

    println!("{table}");

    if detail.can_be_updated {
        println!();
        println!("An update is available.");
        if let Some(changelog) = &detail.repository_changelog_url {
            println!("Changelog: {}", changelog);
        }
    }

    if !detail.missing_requirements.is_empty() {
        println!();
        println!("Missing requirements:");
        for requirement in &detail.missing_requirements {
            let actual = if requirement.actual_version.is_empty() {
                "not installed"
            } else {
                &requirement.actual_version
            };
            println!(
                "  {} {} (found: {})",
                requirement.requirement, requirement.required_version, actual
            );
        }
    }

    if !plugin.versions.is_empty() {
        println!();
        println!("Versions ({}):", plugin.versions.len());

        let mut versions = Table::new();
        versions.load_preset(UTF8_FULL);
        versions.set_header(vec!["VERSION", "RELEASED", "DOWNLOADS"]);

        for version in &plugin.versions {
            versions.add_row(vec![
                version.name.clone(),
                version.release.clone().unwrap_or_else(|| "-".to_string()),
                version.num_downloads.to_string(),
            ]);
        }

        println!("{versions}");
    }
}

fn print_json(detail: &EnrichedPlugin) -> Result<(), String> {
    let json = serde_json::to_string_pretty(detail).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
