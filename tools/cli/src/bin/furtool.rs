use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tabled::{Table, Tabled};
use tracing::warn;

use furball_assets::{asset_registry, merge_furballs, Asset, ProjectStore};
use furball_engine::version::LATEST_VERSION;
use furball_engine::{Furball, Polymorphic};

#[derive(Parser)]
#[command(author, version, about = "Furball container tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a binary furball from a project directory.
    Pack {
        project: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Format version to write; defaults to the version recorded in
        /// the project.
        #[arg(long)]
        format_version: Option<u8>,
    },
    /// Expand a binary furball into a project directory.
    Unpack {
        furball: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fold one or more patch furballs into a base furball.
    Merge {
        base: PathBuf,
        patches: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Deterministically shuffle display text between like-typed assets.
    Shuffle {
        furball: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0xF0B)]
        seed: u64,
    },
    /// List a furball's metadata and assets.
    Inspect { furball: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Pack {
            project,
            output,
            format_version,
        } => pack(&project, &output, format_version),
        Command::Unpack { furball, output } => unpack(&furball, &output),
        Command::Merge {
            base,
            patches,
            output,
        } => merge(&base, &patches, &output),
        Command::Shuffle {
            furball,
            output,
            seed,
        } => shuffle(&furball, &output, seed),
        Command::Inspect { furball } => inspect(&furball),
    }
}

fn read_container(path: &Path) -> Result<Furball<Asset>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let outcome = Furball::from_bytes(&bytes, asset_registry())
        .with_context(|| format!("parse {}", path.display()))?;
    if let Some(failure) = &outcome.failure {
        warn!(
            index = failure.index,
            error = %failure.error,
            "continuing with the {} assets decoded before the failure",
            outcome.furball.assets.len()
        );
    }
    Ok(outcome.furball)
}

fn write_container(furball: &Furball<Asset>, path: &Path) -> Result<()> {
    let bytes = furball
        .to_bytes(asset_registry())
        .context("serialize furball")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn pack(project: &Path, output: &Path, format_version: Option<u8>) -> Result<()> {
    let store = ProjectStore::new(project);
    let mut furball = store
        .load()
        .with_context(|| format!("load project {}", project.display()))?;
    if let Some(version) = format_version {
        furball.metadata.format_version = version;
    }
    write_container(&furball, output)
}

fn unpack(furball: &Path, output: &Path) -> Result<()> {
    let furball = read_container(furball)?;
    ProjectStore::new(output)
        .save(&furball)
        .with_context(|| format!("write project {}", output.display()))?;
    Ok(())
}

fn merge(base: &Path, patches: &[PathBuf], output: &Path) -> Result<()> {
    let mut combined = read_container(base)?;
    for patch in patches {
        let patch = read_container(patch)?;
        merge_furballs(&mut combined, patch);
    }
    // Merged output always carries the newest format.
    combined.metadata.format_version = LATEST_VERSION;
    write_container(&combined, output)
}

fn shuffle(furball: &Path, output: &Path, seed: u64) -> Result<()> {
    let mut furball = read_container(furball)?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    shuffle_display_text(&mut furball.assets, &mut rng);
    write_container(&furball, output)
}

/// Permutes object names and flavor text between assets of the same
/// concrete type, leaving identities and mechanics untouched.
fn shuffle_display_text(assets: &mut [Asset], rng: &mut impl rand::Rng) {
    for type_name in ["AssetItem", "AssetCreature"] {
        let slots: Vec<usize> = assets
            .iter()
            .enumerate()
            .filter(|(_, asset)| asset.type_name() == type_name)
            .map(|(index, _)| index)
            .collect();
        let mut texts: Vec<(String, String)> = slots
            .iter()
            .map(|&index| display_text(&assets[index]))
            .collect();
        texts.shuffle(rng);
        for (&index, text) in slots.iter().zip(texts) {
            set_display_text(&mut assets[index], text);
        }
    }
}

fn display_text(asset: &Asset) -> (String, String) {
    match asset {
        Asset::Item(item) => (item.object_name.clone(), item.flavor_text.clone()),
        Asset::Creature(creature) => (creature.object_name.clone(), creature.flavor_text.clone()),
        _ => (String::new(), String::new()),
    }
}

fn set_display_text(asset: &mut Asset, text: (String, String)) {
    match asset {
        Asset::Item(item) => {
            item.object_name = text.0;
            item.flavor_text = text.1;
        }
        Asset::Creature(creature) => {
            creature.object_name = text.0;
            creature.flavor_text = text.1;
        }
        _ => {}
    }
}

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "ID")]
    id: String,
}

fn inspect(furball: &Path) -> Result<()> {
    let furball = read_container(furball)?;
    println!(
        "{} by {} (format version {})",
        furball.metadata.title, furball.metadata.author, furball.metadata.format_version
    );
    println!("container id {}", furball.metadata.id);
    for dependency in &furball.dependencies {
        println!("depends on {} ({})", dependency.filename_hint, dependency.id);
    }

    let rows: Vec<AssetRow> = furball
        .assets
        .iter()
        .map(|asset| AssetRow {
            name: asset.base().name.clone(),
            kind: asset.type_name(),
            id: asset.base().id.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}
