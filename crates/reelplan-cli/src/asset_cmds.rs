use std::path::PathBuf;

use clap::Subcommand;

use reelplan_lib::core::project::AssetRef;
use reelplan_lib::core::settings::SettingsManager;

use crate::project_cmds::{open_project, save_project};

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Register a media file with the project
    Add {
        /// Project file
        project: PathBuf,
        /// Media file
        file: PathBuf,
        /// Explicit asset id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Duration in seconds (video/audio)
        #[arg(long)]
        duration: Option<f64>,
        /// Pixel size as WIDTHxHEIGHT
        #[arg(long)]
        size: Option<String>,
    },
    /// List registered assets
    List {
        /// Project file
        project: PathBuf,
    },
    /// Unregister an asset and detach it from events
    Remove {
        /// Project file
        project: PathBuf,
        /// Asset id
        id: String,
    },
}

fn parse_size(size: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = size
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("invalid size '{size}': expected WIDTHxHEIGHT"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

pub fn run_asset_command(settings: &SettingsManager, command: AssetCommands) -> anyhow::Result<()> {
    match command {
        AssetCommands::Add {
            project: path,
            file,
            id,
            duration,
            size,
        } => {
            let mut project = open_project(settings, &path)?;
            let mut asset = AssetRef::from_path(&file);
            if let Some(id) = id {
                asset = asset.with_id(id);
            }
            if let Some(seconds) = duration {
                asset = asset.with_duration(seconds);
            }
            if let Some(size) = size.as_deref() {
                let (width, height) = parse_size(size)?;
                asset = asset.with_dimensions(width, height);
            }
            match std::fs::metadata(&file) {
                Ok(meta) => asset = asset.with_file_size(meta.len()),
                Err(e) => tracing::warn!("Asset file not readable ({}): {}", file.display(), e),
            }

            let id = project.add_asset(asset)?;
            save_project(&mut project, &path)?;
            println!("Added asset {id}");
        }
        AssetCommands::List { project: path } => {
            let project = open_project(settings, &path)?;
            if project.assets().is_empty() {
                println!("No assets.");
            }
            for asset in project.assets().values() {
                println!(
                    "{:<28} {:<6} {}",
                    asset.id,
                    format!("{:?}", asset.file_type).to_lowercase(),
                    asset.file_path
                );
            }
        }
        AssetCommands::Remove { project: path, id } => {
            let mut project = open_project(settings, &path)?;
            let removed = project.remove_asset(&id)?;
            save_project(&mut project, &path)?;
            println!("Removed asset {id} ({})", removed.name);
        }
    }
    Ok(())
}
