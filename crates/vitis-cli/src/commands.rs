//! Subcommand dispatch. Each import pass prints its tally when done.

use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use tokio::net::TcpListener;
use vitis_core::grape::GrapeField;
use vitis_import::{
  Error, HttpFetcher, Importer, Settings,
  ancestry::{find_children, get_ancestry, resolve_cultivar},
  config::{BackfillOptions, CountrySelection, GrapeImportOptions, PhotoOptions, RelationshipOptions},
  photos::popup_dump_target_ok,
};
use vitis_scrape::VivcUrls;
use vitis_store_sqlite::SqliteStore;

use crate::{Command, ImportGrapesArgs, ImportPhotosArgs};

pub async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
  match command {
    Command::Ancestry { name, json } => return ancestry(&name, json, settings).await,
    Command::Children { name } => return children(&name, settings).await,
    Command::Serve(args) => {
      let host = args.host.unwrap_or_else(|| settings.host.clone());
      let port = args.port.unwrap_or(settings.port);
      return serve(&host, port, settings).await;
    }
    _ => {}
  }

  let store = open_store(settings).await?;
  let fetcher = http_fetcher(settings)?;
  let mut importer = Importer::new(&store, &fetcher, settings)?;

  match command {
    Command::ImportGrapes(args) => {
      let opts = grape_options(args)?;
      let tally = importer.import_grapes(&opts).await?;
      println!("Grape import complete{}:\n{tally}", dry_run_note(opts.dry_run));
    }
    Command::ImportRelationships(args) => {
      let opts = RelationshipOptions { country: args.country, force: args.force, limit: args.limit };
      let tally = importer.import_relationships(&opts).await?;
      println!("Relationship import complete:\n{tally}");
    }
    Command::ImportPhotos(args) => {
      if let Some(ms) = args.delay_ms {
        importer.pacing.row = Duration::from_millis(ms);
      }
      let opts = photo_options(args)?;
      let tally = importer.import_photos(&opts).await?;
      println!("Photo import complete:\n{tally}");
    }
    Command::Normalize(args) => {
      let tally = importer.normalize(args.dry_run).await?;
      println!("Normalization complete{}:\n{tally}", dry_run_note(args.dry_run));
    }
    Command::MarkCrawled(args) => {
      let marked = importer.mark_crawled(args.dry_run).await?;
      if args.dry_run {
        println!("{marked} grapes would be marked as crawled");
      } else {
        println!("Marked {marked} grapes as crawled");
      }
    }
    Command::RelationshipStatus { country } => {
      let (country, status) = match importer.relationship_status(&country).await {
        Err(Error::CountryNotInStore(query)) => bail!("no stored country matches {query:?}"),
        other => other?,
      };
      println!("{} ({})", country.name, country.iso_code);
      println!("  Total:        {}", status.total);
      println!("  Resolved:     {}", status.resolved);
      println!("    crawled:    {}", status.crawled);
      println!("    w/ parents: {}", status.with_parents);
      println!("  Unresolved:   {}", status.unresolved);
    }
    Command::AddCountries => {
      let created = importer.add_countries().await?;
      println!("Added {created} countries");
    }
    Command::BackfillImages(args) => {
      if let Some(ms) = args.delay_ms {
        importer.pacing.encyclopedia = Duration::from_millis(ms);
      }
      let opts = BackfillOptions {
        limit:           args.limit,
        dry_run:         args.dry_run,
        update_existing: args.update_existing,
      };
      let tally = importer.backfill_images(&opts).await?;
      println!("Image backfill complete{}:\n{tally}", dry_run_note(opts.dry_run));
    }
    Command::Ancestry { .. } | Command::Children { .. } | Command::Serve(_) => {}
  }

  Ok(())
}

fn dry_run_note(dry_run: bool) -> &'static str { if dry_run { " (dry run, nothing written)" } else { "" } }

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  let path = &settings.database_path;
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

fn http_fetcher(settings: &Settings) -> anyhow::Result<HttpFetcher> {
  HttpFetcher::new(settings.request_timeout(), &settings.user_agent).context("failed to build http client")
}

fn grape_options(args: ImportGrapesArgs) -> anyhow::Result<GrapeImportOptions> {
  let countries = match (args.country, args.start_from) {
    (Some(country), _) => CountrySelection::One(country),
    (None, Some(start)) => CountrySelection::StartingFrom(start),
    (None, None) => CountrySelection::All,
  };
  let fields = match args.fields {
    Some(raw) => GrapeField::parse_list(&raw).context("invalid --fields")?,
    None => Default::default(),
  };
  Ok(GrapeImportOptions {
    countries,
    fields,
    skip_relationships: args.skip_relationships,
    dry_run: args.dry_run,
  })
}

fn photo_options(args: ImportPhotosArgs) -> anyhow::Result<PhotoOptions> {
  if let Some(path) = &args.save_popup_html
    && !popup_dump_target_ok(path)
  {
    bail!("cannot save popup html to {}: directory does not exist", path.display());
  }
  Ok(PhotoOptions {
    types:           args.photo_type.types(),
    page_limit:      args.page_limit,
    save_popup_html: args.save_popup_html,
  })
}

async fn ancestry(name: &str, json: bool, settings: &Settings) -> anyhow::Result<()> {
  let fetcher = http_fetcher(settings)?;
  let urls = VivcUrls::new(&settings.vivc_base_url)?;
  let hit = resolve_cultivar(&fetcher, &urls, name)
    .await?
    .ok_or_else(|| Error::CultivarNotFound(name.to_owned()))?;
  let tree = get_ancestry(&fetcher, &urls, &hit.vivc_id).await?;

  if json {
    println!("{}", serde_json::to_string_pretty(&tree)?);
  } else {
    print!("{}", tree.render());
  }
  Ok(())
}

async fn children(name: &str, settings: &Settings) -> anyhow::Result<()> {
  let fetcher = http_fetcher(settings)?;
  let urls = VivcUrls::new(&settings.vivc_base_url)?;
  let hit = resolve_cultivar(&fetcher, &urls, name)
    .await?
    .ok_or_else(|| Error::CultivarNotFound(name.to_owned()))?;
  let children = find_children(&fetcher, &urls, &hit.name).await?;

  println!("Children of {} (VIVC {}): {}", hit.name, hit.vivc_id, children.len());
  for child in &children {
    println!(
      "  {:<40} {:>8}  {} x {}",
      child.name,
      child.vivc_id.as_deref().unwrap_or("-"),
      child.parent_1,
      child.parent_2
    );
  }
  Ok(())
}

async fn serve(host: &str, port: u16, settings: &Settings) -> anyhow::Result<()> {
  let store = open_store(settings).await?;
  let app = vitis_api::api_router(Arc::new(store));
  let address = format!("{host}:{port}");

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
