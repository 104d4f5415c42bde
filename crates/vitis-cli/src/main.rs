//! `vitis`: import grape cultivars from VIVC and serve the catalog.
//!
//! # Usage
//!
//! ```
//! vitis import-grapes --country france
//! vitis import-relationships --country FRA --limit 100
//! vitis import-photos --type laboratory
//! vitis serve
//! ```
//!
//! Settings come from `vitis.toml` (or `--config`) layered under `VITIS_*`
//! environment variables.

mod commands;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitis_core::photo::PhotoType;
use vitis_import::Settings;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vitis", version, about = "VIVC grape catalog importer and read API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vitis.toml")]
  config: PathBuf,

  /// SQLite database, overriding `database_path` from the settings.
  #[arg(long, global = true, value_name = "FILE")]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Import grapes from the per-country VIVC listings.
  ImportGrapes(ImportGrapesArgs),
  /// Link parents and children of stored grapes.
  ImportRelationships(ImportRelationshipsArgs),
  /// Import cluster photos and their attributions.
  ImportPhotos(ImportPhotosArgs),
  /// Re-apply name and color normalization to stored records.
  Normalize(DryRunArgs),
  /// Timestamp grapes that already have parents but were never marked.
  MarkCrawled(DryRunArgs),
  /// Show how many grapes of a country have their relationships resolved.
  RelationshipStatus {
    /// Country name, partial name or ISO code.
    country: String,
  },
  /// Add every known country missing from the store.
  AddCountries,
  /// Find encyclopedia images for grapes without photos.
  BackfillImages(BackfillArgs),
  /// Print the ancestry tree of a cultivar.
  Ancestry {
    name: String,
    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,
  },
  /// List cultivars that name this cultivar as a parent.
  Children { name: String },
  /// Serve the read API.
  Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ImportGrapesArgs {
  /// A single country, by name or ISO code.
  #[arg(long, conflicts_with = "start_from")]
  country: Option<String>,

  /// Every country from this name onwards, alphabetically.
  #[arg(long)]
  start_from: Option<String>,

  /// Only update these fields of existing grapes, e.g. `name,berry_color`.
  #[arg(long, value_name = "FIELDS")]
  fields: Option<String>,

  /// Do not resolve relationships while importing.
  #[arg(long)]
  skip_relationships: bool,

  #[arg(long)]
  dry_run: bool,
}

#[derive(Args, Debug)]
struct ImportRelationshipsArgs {
  /// Country name, partial name or ISO code; all grapes when omitted.
  #[arg(long)]
  country: Option<String>,

  /// Also process grapes that are already resolved.
  #[arg(long)]
  force: bool,

  #[arg(long)]
  limit: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PhotoTypeArg {
  Field,
  Laboratory,
  All,
}

impl PhotoTypeArg {
  fn types(self) -> Vec<PhotoType> {
    match self {
      Self::Field => vec![PhotoType::Field],
      Self::Laboratory => vec![PhotoType::Laboratory],
      Self::All => vec![PhotoType::Laboratory, PhotoType::Field],
    }
  }
}

#[derive(Args, Debug)]
struct ImportPhotosArgs {
  #[arg(long = "type", value_enum, default_value_t = PhotoTypeArg::All)]
  photo_type: PhotoTypeArg,

  /// Stop each photo type after this many listing pages.
  #[arg(long)]
  page_limit: Option<usize>,

  /// Milliseconds to wait after each stored photo.
  #[arg(long)]
  delay_ms: Option<u64>,

  /// Save the first popup page fetched, for inspecting its markup.
  #[arg(long, value_name = "FILE")]
  save_popup_html: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DryRunArgs {
  #[arg(long)]
  dry_run: bool,
}

#[derive(Args, Debug)]
struct BackfillArgs {
  #[arg(long)]
  limit: Option<usize>,

  /// Only count matches.
  #[arg(long)]
  dry_run: bool,

  /// Also re-check grapes that already have an image.
  #[arg(long)]
  update_existing: bool,

  /// Milliseconds between lookups.
  #[arg(long)]
  delay_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct ServeArgs {
  #[arg(long)]
  host: Option<String>,

  #[arg(long)]
  port: Option<u16>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut settings = load_settings(cli.config)?;
  if let Some(database) = cli.database {
    settings.database_path = database;
  }

  commands::run(cli.command, &settings).await
}

fn load_settings(path: PathBuf) -> anyhow::Result<Settings> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("VITIS"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_valid() { Cli::command().debug_assert(); }

  #[test]
  fn parses_import_grapes_flags() {
    let cli = Cli::parse_from([
      "vitis",
      "import-grapes",
      "--country",
      "france",
      "--fields",
      "name,berry_color",
      "--dry-run",
    ]);
    let Command::ImportGrapes(args) = cli.command else {
      panic!("wrong subcommand");
    };
    assert_eq!(args.country.as_deref(), Some("france"));
    assert_eq!(args.fields.as_deref(), Some("name,berry_color"));
    assert!(args.dry_run);
  }

  #[test]
  fn country_and_start_from_conflict() {
    let parsed =
      Cli::try_parse_from(["vitis", "import-grapes", "--country", "fra", "--start-from", "m"]);
    assert!(parsed.is_err());
  }

  #[test]
  fn photo_type_defaults_to_both_laboratory_first() {
    let cli = Cli::parse_from(["vitis", "import-photos"]);
    let Command::ImportPhotos(args) = cli.command else {
      panic!("wrong subcommand");
    };
    assert_eq!(args.photo_type.types(), [PhotoType::Laboratory, PhotoType::Field]);
  }

  #[test]
  fn missing_config_file_gives_defaults() {
    let settings = load_settings(PathBuf::from("does-not-exist.toml")).unwrap();
    assert_eq!(settings.port, 8000);
  }
}
