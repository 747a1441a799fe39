//! deathsalvage - Recover items dropped after death back to the inventory
//!
//! Loads a world snapshot (JSON), estimates the death location from the
//! scattered drops unless given exact coordinates, reconciles everything it
//! can back into the player's inventory, and writes the snapshot back when
//! asked to apply the changes.

use std::{env, fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use deathsalvage_core::{ItemCatalog, XpRuleset};
use deathsalvage_world::{salvage, Position, SalvageOptions, SearchArea, WorldSnapshot};
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> Result<()> {
    let config = config_from_args()?;
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let _ = fmt().with_max_level(level).try_init();

    let raw = fs::read_to_string(&config.world)
        .with_context(|| format!("failed to read world snapshot {}", config.world.display()))?;
    let mut snapshot: WorldSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("malformed world snapshot {}", config.world.display()))?;

    tracing::info!(
        world = %snapshot.name,
        player = %snapshot.player.name,
        "determining death coordinates"
    );

    let catalog = ItemCatalog::vanilla();
    let report = salvage(&mut snapshot, &catalog, &config.options)?;

    for (item, count) in &report.failed {
        tracing::warn!(count = *count, "could not fit into the inventory: {item}");
    }
    let unplaced: u32 = report.failed.values().sum();
    tracing::info!(
        placed = report.placements.len(),
        unplaced,
        orbs = report.orbs_absorbed,
        xp = report.xp_gained,
        level = report.level_after,
        "salvage complete"
    );

    if config.apply {
        tracing::info!("applying changes and saving world snapshot");
        let out = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&config.world, out)
            .with_context(|| format!("failed to write world snapshot {}", config.world.display()))?;
    } else {
        tracing::warn!("not saving world, use --apply to apply changes");
    }
    Ok(())
}

struct CliConfig {
    world: PathBuf,
    options: SalvageOptions,
    apply: bool,
    verbose: bool,
}

fn config_from_args() -> Result<CliConfig> {
    config_from_iter(env::args().skip(1))
}

fn config_from_iter<I>(mut args: I) -> Result<CliConfig>
where
    I: Iterator<Item = String>,
{
    let mut world: Option<PathBuf> = None;
    let mut xpos: Option<f64> = None;
    let mut zpos: Option<f64> = None;
    let mut radius: f64 = 250.0;
    let mut death_pos: Option<Position> = None;
    let mut options = SalvageOptions::default();
    let mut apply = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--world" | "-w" => world = args.next().map(PathBuf::from),
            "--xpos" | "-x" => xpos = Some(value_arg(&mut args, "--xpos")?),
            "--zpos" | "-z" => zpos = Some(value_arg(&mut args, "--zpos")?),
            "--radius" | "-r" => radius = value_arg(&mut args, "--radius")?,
            "--death-xz" | "-d" => {
                let x: f64 = value_arg(&mut args, "--death-xz")?;
                let z: f64 = value_arg(&mut args, "--death-xz")?;
                death_pos = Some(Position::from_xz(x, z));
            }
            "--xp-factor" | "-X" => options.xp_factor = value_arg(&mut args, "--xp-factor")?,
            "--include-ordinary" | "-o" => options.include_ordinary = true,
            "--legacy-xp" => options.ruleset = XpRuleset::Legacy,
            "--apply" | "-a" => apply = true,
            "--verbose" | "-v" => verbose = true,
            other => bail!("unknown argument: {other}"),
        }
    }

    let world = world.context("missing required --world argument")?;
    // The radius only applies once both coordinates bound the search.
    options.search = match (xpos, zpos) {
        (Some(x), Some(z)) => SearchArea::Around { x, z, radius },
        _ => SearchArea::Everywhere,
    };
    options.death_pos = death_pos;

    Ok(CliConfig {
        world,
        options,
        apply,
        verbose,
    })
}

fn value_arg<T, I>(args: &mut I, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    I: Iterator<Item = String>,
{
    let value = args
        .next()
        .with_context(|| format!("{flag} expects a value"))?;
    value
        .parse::<T>()
        .with_context(|| format!("invalid value for {flag}: {value}"))
}
