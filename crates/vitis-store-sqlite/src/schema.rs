//! SQL schema for the Vitis SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS countries (
    country_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    iso_code    TEXT NOT NULL UNIQUE,
    search_url  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS grapes (
    grape_id               TEXT PRIMARY KEY,
    vivc_id                TEXT NOT NULL UNIQUE,
    name                   TEXT NOT NULL,
    vivc_url               TEXT NOT NULL DEFAULT '',
    berry_color            TEXT NOT NULL DEFAULT '',
    species                TEXT NOT NULL DEFAULT '',
    year_of_crossing       TEXT NOT NULL DEFAULT '',
    breeder                TEXT NOT NULL DEFAULT '',
    country_id             TEXT REFERENCES countries(country_id) ON DELETE SET NULL,
    encyclopedia_image_url TEXT,
    date_last_crawled      TEXT,            -- RFC 3339; NULL until relationships resolved
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

-- Directed parent edges. Cycles are permitted.
CREATE TABLE IF NOT EXISTS grape_parents (
    child_id   TEXT NOT NULL REFERENCES grapes(grape_id) ON DELETE CASCADE,
    parent_id  TEXT NOT NULL REFERENCES grapes(grape_id) ON DELETE CASCADE,
    PRIMARY KEY (child_id, parent_id)
);

CREATE TABLE IF NOT EXISTS grape_photos (
    photo_id    TEXT PRIMARY KEY,
    grape_id    TEXT NOT NULL REFERENCES grapes(grape_id) ON DELETE CASCADE,
    url         TEXT NOT NULL,
    source      TEXT NOT NULL DEFAULT '',
    photo_type  TEXT NOT NULL CHECK (photo_type IN ('field', 'laboratory')),
    created_at  TEXT NOT NULL,
    UNIQUE (grape_id, url)
);

CREATE INDEX IF NOT EXISTS grapes_country_idx        ON grapes(country_id);
CREATE INDEX IF NOT EXISTS grapes_name_idx           ON grapes(name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS grape_parents_parent_idx  ON grape_parents(parent_id);

PRAGMA user_version = 1;
";
