//! [`SqliteStore`], the SQLite implementation of [`GrapeStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::debug;
use uuid::Uuid;

use vitis_core::{
  country::{Country, CountrySummary, NewCountry},
  grape::{Grape, GrapePatch, GrapeQuery, GrapeRef, NewGrape},
  photo::{GrapePhoto, NewPhoto},
  store::{GrapeStore, RelationshipStatus},
};

use crate::{
  Error, Result,
  encode::{
    COUNTRY_COLUMNS, GRAPE_COLUMNS, PHOTO_COLUMNS, RawCountry, RawGrape, RawPhoto,
    encode_dt, encode_uuid, escape_like,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_country(
  conn: &rusqlite::Connection,
  condition: &str,
  param: &str,
) -> rusqlite::Result<Option<RawCountry>> {
  conn
    .query_row(
      &format!("SELECT {COUNTRY_COLUMNS} FROM countries c WHERE {condition} ORDER BY c.name LIMIT 1"),
      rusqlite::params![param],
      RawCountry::from_row,
    )
    .optional()
}

fn select_grape(
  conn: &rusqlite::Connection,
  condition: &str,
  param: &str,
) -> rusqlite::Result<Option<RawGrape>> {
  conn
    .query_row(
      &format!("SELECT {GRAPE_COLUMNS} FROM grapes g WHERE {condition}"),
      rusqlite::params![param],
      RawGrape::from_row,
    )
    .optional()
}

fn select_grapes(
  conn: &rusqlite::Connection,
  sql: &str,
  param: &str,
) -> rusqlite::Result<Vec<RawGrape>> {
  let mut stmt = conn.prepare(sql)?;
  stmt
    .query_map(rusqlite::params![param], RawGrape::from_row)?
    .collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A grape catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── GrapeStore impl ─────────────────────────────────────────────────────────

impl GrapeStore for SqliteStore {
  type Error = Error;

  // ── Countries ─────────────────────────────────────────────────────────────

  async fn ensure_country(&self, input: NewCountry) -> Result<(Country, bool)> {
    let new_id = encode_uuid(Uuid::new_v4());

    let (raw, created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(existing) = select_country(&tx, "c.iso_code = ?1", &input.iso_code)? {
          return Ok((existing, false));
        }
        tx.execute(
          "INSERT INTO countries (country_id, name, iso_code, search_url)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![new_id, input.name, input.iso_code, input.search_url],
        )?;
        tx.commit()?;
        Ok((
          RawCountry {
            country_id: new_id,
            name:       input.name,
            iso_code:   input.iso_code,
            search_url: input.search_url,
          },
          true,
        ))
      })
      .await?;

    Ok((raw.into_country()?, created))
  }

  async fn get_country(&self, iso_code: &str) -> Result<Option<Country>> {
    let iso = iso_code.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_country(conn, "c.iso_code = ?1", &iso)?))
      .await?;
    raw.map(RawCountry::into_country).transpose()
  }

  async fn get_country_by_id(&self, country_id: Uuid) -> Result<Option<Country>> {
    let id_str = encode_uuid(country_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_country(conn, "c.country_id = ?1", &id_str)?))
      .await?;
    raw.map(RawCountry::into_country).transpose()
  }

  async fn find_country(&self, query: &str) -> Result<Option<Country>> {
    let needle = query.trim().to_owned();
    if needle.is_empty() {
      return Ok(None);
    }

    let raw = self
      .conn
      .call(move |conn| {
        if let Some(c) = select_country(conn, "c.iso_code = upper(?1)", &needle)? {
          return Ok(Some(c));
        }
        if let Some(c) = select_country(conn, "c.name = ?1 COLLATE NOCASE", &needle)? {
          return Ok(Some(c));
        }
        let pattern = format!("%{}%", escape_like(&needle));
        Ok(select_country(conn, "c.name LIKE ?1 ESCAPE '\\'", &pattern)?)
      })
      .await?;

    raw.map(RawCountry::into_country).transpose()
  }

  async fn list_countries(&self) -> Result<Vec<CountrySummary>> {
    let rows: Vec<(RawCountry, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COUNTRY_COLUMNS}, COUNT(g.grape_id) AS grape_count
           FROM countries c
           LEFT JOIN grapes g ON g.country_id = c.country_id
           GROUP BY c.country_id
           ORDER BY grape_count DESC, c.name"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((RawCountry::from_row(row)?, row.get(4)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, count)| {
        Ok(CountrySummary { country: raw.into_country()?, grape_count: count as u64 })
      })
      .collect()
  }

  async fn rename_country(&self, country_id: Uuid, name: String) -> Result<()> {
    let id_str = encode_uuid(country_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE countries SET name = ?1 WHERE country_id = ?2",
          rusqlite::params![name, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Grapes ────────────────────────────────────────────────────────────────

  async fn get_grape(&self, vivc_id: &str) -> Result<Option<Grape>> {
    let vivc_id = vivc_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_grape(conn, "g.vivc_id = ?1", &vivc_id)?))
      .await?;
    raw.map(RawGrape::into_grape).transpose()
  }

  async fn insert_grape(&self, input: NewGrape) -> Result<Grape> {
    let now = Utc::now();
    let grape = Grape {
      grape_id:               Uuid::new_v4(),
      vivc_id:                input.vivc_id,
      name:                   input.name,
      vivc_url:               input.vivc_url,
      berry_color:            input.berry_color,
      species:                input.species,
      year_of_crossing:       input.year_of_crossing,
      breeder:                input.breeder,
      country_id:             input.country_id,
      encyclopedia_image_url: None,
      date_last_crawled:      None,
      created_at:             now,
      updated_at:             now,
    };

    let id_str      = encode_uuid(grape.grape_id);
    let vivc_id     = grape.vivc_id.clone();
    let name        = grape.name.clone();
    let vivc_url    = grape.vivc_url.clone();
    let color       = grape.berry_color.clone();
    let species     = grape.species.clone();
    let year        = grape.year_of_crossing.clone();
    let breeder     = grape.breeder.clone();
    let country_str = grape.country_id.map(encode_uuid);
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO grapes (
             grape_id, vivc_id, name, vivc_url, berry_color, species,
             year_of_crossing, breeder, country_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            vivc_id,
            name,
            vivc_url,
            color,
            species,
            year,
            breeder,
            country_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(grape)
  }

  async fn update_grape(&self, grape_id: Uuid, patch: GrapePatch) -> Result<Option<Grape>> {
    let id_str = encode_uuid(grape_id);

    let mut sets: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut text = |column: &'static str, v: Option<String>| {
      if let Some(v) = v {
        sets.push(column);
        values.push(Value::Text(v));
      }
    };
    text("name", patch.name);
    text("vivc_url", patch.vivc_url);
    text("berry_color", patch.berry_color);
    text("species", patch.species);
    text("year_of_crossing", patch.year_of_crossing);
    text("breeder", patch.breeder);
    if let Some(country) = patch.country_id {
      sets.push("country_id");
      values.push(country.map(encode_uuid).map_or(Value::Null, Value::Text));
    }
    sets.push("updated_at");
    values.push(Value::Text(encode_dt(Utc::now())));

    let assignments = sets
      .iter()
      .enumerate()
      .map(|(i, column)| format!("{column} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE grapes SET {assignments} WHERE grape_id = ?{}",
      values.len() + 1
    );
    values.push(Value::Text(id_str.clone()));

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_grape(conn, "g.grape_id = ?1", &id_str)?)
      })
      .await?;

    raw.map(RawGrape::into_grape).transpose()
  }

  async fn list_grapes(&self, query: &GrapeQuery) -> Result<Vec<Grape>> {
    let mut conds: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(country_id) = query.country_id {
      values.push(Value::Text(encode_uuid(country_id)));
      conds.push(format!("g.country_id = ?{}", values.len()));
    }
    if query.without_photos {
      conds.push(
        "NOT EXISTS (SELECT 1 FROM grape_photos p WHERE p.grape_id = g.grape_id)".into(),
      );
    }
    if query.without_encyclopedia_image {
      conds.push(
        "(g.encyclopedia_image_url IS NULL OR g.encyclopedia_image_url = '')".into(),
      );
    }
    match query.has_parents {
      Some(true) => conds.push(
        "EXISTS (SELECT 1 FROM grape_parents e WHERE e.child_id = g.grape_id)".into(),
      ),
      Some(false) => conds.push(
        "NOT EXISTS (SELECT 1 FROM grape_parents e WHERE e.child_id = g.grape_id)".into(),
      ),
      None => {}
    }
    match query.crawled {
      Some(true) => conds.push("g.date_last_crawled IS NOT NULL".into()),
      Some(false) => conds.push("g.date_last_crawled IS NULL".into()),
      None => {}
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    values.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
    let sql = format!(
      "SELECT {GRAPE_COLUMNS} FROM grapes g {where_clause}
       ORDER BY g.name COLLATE NOCASE, g.vivc_id
       LIMIT ?{}",
      values.len()
    );

    let raws: Vec<RawGrape> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), RawGrape::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrape::into_grape).collect()
  }

  async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<GrapeRef>> {
    let pattern = format!("{}%", escape_like(prefix));
    let limit = limit as i64;

    let refs = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name, vivc_id FROM grapes
           WHERE name LIKE ?1 ESCAPE '\\'
           ORDER BY name COLLATE NOCASE
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], |row| {
            Ok(GrapeRef { name: row.get(0)?, vivc_id: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(refs)
  }

  async fn set_encyclopedia_image(&self, grape_id: Uuid, url: Option<String>) -> Result<()> {
    let id_str = encode_uuid(grape_id);
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE grapes SET encyclopedia_image_url = ?1, updated_at = ?2 WHERE grape_id = ?3",
          rusqlite::params![url, at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Lineage ───────────────────────────────────────────────────────────────

  async fn parents(&self, grape_id: Uuid) -> Result<Vec<Grape>> {
    let id_str = encode_uuid(grape_id);
    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_grapes(
          conn,
          &format!(
            "SELECT {GRAPE_COLUMNS} FROM grapes g
             JOIN grape_parents e ON e.parent_id = g.grape_id
             WHERE e.child_id = ?1
             ORDER BY g.name COLLATE NOCASE"
          ),
          &id_str,
        )?)
      })
      .await?;
    raws.into_iter().map(RawGrape::into_grape).collect()
  }

  async fn children(&self, grape_id: Uuid) -> Result<Vec<Grape>> {
    let id_str = encode_uuid(grape_id);
    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_grapes(
          conn,
          &format!(
            "SELECT {GRAPE_COLUMNS} FROM grapes g
             JOIN grape_parents e ON e.child_id = g.grape_id
             WHERE e.parent_id = ?1
             ORDER BY g.name COLLATE NOCASE"
          ),
          &id_str,
        )?)
      })
      .await?;
    raws.into_iter().map(RawGrape::into_grape).collect()
  }

  async fn add_parent(&self, child_id: Uuid, parent_id: Uuid) -> Result<bool> {
    let child_str  = encode_uuid(child_id);
    let parent_str = encode_uuid(parent_id);
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO grape_parents (child_id, parent_id) VALUES (?1, ?2)",
          rusqlite::params![child_str, parent_str],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn mark_crawled(&self, grape_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(grape_id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE grapes SET date_last_crawled = ?1, updated_at = ?1 WHERE grape_id = ?2",
          rusqlite::params![at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn relationship_status(&self, country_id: Uuid) -> Result<RelationshipStatus> {
    let id_str = encode_uuid(country_id);
    let (total, resolved, crawled, with_parents): (i64, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "WITH flagged AS (
             SELECT g.date_last_crawled IS NOT NULL AS crawled,
                    EXISTS (SELECT 1 FROM grape_parents e WHERE e.child_id = g.grape_id)
                      AS has_parents
             FROM grapes g
             WHERE g.country_id = ?1
           )
           SELECT COUNT(*),
                  COALESCE(SUM(crawled OR has_parents), 0),
                  COALESCE(SUM(crawled), 0),
                  COALESCE(SUM(has_parents), 0)
           FROM flagged",
          rusqlite::params![id_str],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?)
      })
      .await?;

    Ok(RelationshipStatus {
      total:        total as u64,
      resolved:     resolved as u64,
      unresolved:   (total - resolved) as u64,
      crawled:      crawled as u64,
      with_parents: with_parents as u64,
    })
  }

  // ── Photos ────────────────────────────────────────────────────────────────

  async fn photos(&self, grape_id: Uuid) -> Result<Vec<GrapePhoto>> {
    let id_str = encode_uuid(grape_id);
    let raws: Vec<RawPhoto> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PHOTO_COLUMNS} FROM grape_photos p WHERE p.grape_id = ?1 ORDER BY p.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPhoto::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPhoto::into_photo).collect()
  }

  async fn add_photo(&self, input: NewPhoto) -> Result<GrapePhoto> {
    let photo = GrapePhoto {
      photo_id:   Uuid::new_v4(),
      grape_id:   input.grape_id,
      url:        input.url,
      source:     input.source,
      photo_type: input.photo_type,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(photo.photo_id);
    let grape_str = encode_uuid(photo.grape_id);
    let url       = photo.url.clone();
    let source    = photo.source.clone();
    let type_str  = photo.photo_type.as_ref().to_owned();
    let at_str    = encode_dt(photo.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO grape_photos (photo_id, grape_id, url, source, photo_type, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, grape_str, url, source, type_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(photo)
  }

  async fn set_photo_source(&self, photo_id: Uuid, source: String) -> Result<()> {
    let id_str = encode_uuid(photo_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE grape_photos SET source = ?1 WHERE photo_id = ?2",
          rusqlite::params![source, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
