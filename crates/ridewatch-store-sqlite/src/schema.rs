//! SQL schema for the ridewatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS competitors (
    competitor_id TEXT PRIMARY KEY,
    slug          TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

-- Rows are never deleted; a new batch clears is_latest on the previous one.
CREATE TABLE IF NOT EXISTS driver_tariffs (
    tariff_id       TEXT PRIMARY KEY,
    competitor_id   TEXT NOT NULL REFERENCES competitors(competitor_id),
    commission_rate TEXT,            -- decimal as string
    min_fare        TEXT,
    signup_bonus    TEXT,
    referral_bonus  TEXT,
    requirements    TEXT,            -- JSON array or NULL
    benefits        TEXT,
    currency        TEXT NOT NULL DEFAULT 'PEN',
    source_url      TEXT,
    is_latest       INTEGER NOT NULL,
    collected_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rider_tariffs (
    tariff_id     TEXT PRIMARY KEY,
    competitor_id TEXT NOT NULL REFERENCES competitors(competitor_id),
    service_type  TEXT NOT NULL DEFAULT 'standard',
    base_fare     TEXT,
    per_km_rate   TEXT,
    per_min_rate  TEXT,
    booking_fee   TEXT,
    currency      TEXT NOT NULL DEFAULT 'PEN',
    source_url    TEXT,
    is_latest     INTEGER NOT NULL,
    collected_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS releases (
    release_id    TEXT PRIMARY KEY,
    competitor_id TEXT NOT NULL REFERENCES competitors(competitor_id),
    platform      TEXT NOT NULL,     -- 'ios' | 'android'
    version       TEXT NOT NULL,
    release_date  TEXT,              -- YYYY-MM-DD
    release_notes TEXT,
    rating        TEXT,
    rating_count  INTEGER,
    significance  TEXT NOT NULL,
    categories    TEXT NOT NULL DEFAULT '[]',
    summary       TEXT,
    collected_at  TEXT NOT NULL,
    UNIQUE (competitor_id, platform, version)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id     TEXT PRIMARY KEY,
    external_id   TEXT NOT NULL UNIQUE,  -- '{platform}_{source id}'
    competitor_id TEXT NOT NULL REFERENCES competitors(competitor_id),
    platform      TEXT NOT NULL,
    author        TEXT,
    rating        INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    text          TEXT,
    review_date   TEXT,
    app_version   TEXT,
    role          TEXT NOT NULL DEFAULT 'unknown',
    sentiment     TEXT NOT NULL,
    categories    TEXT NOT NULL DEFAULT '[]',
    key_topics    TEXT NOT NULL DEFAULT '[]',
    collected_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS news_items (
    news_id               TEXT PRIMARY KEY,
    unique_id             TEXT NOT NULL UNIQUE,  -- digest of normalised URL
    search_query          TEXT NOT NULL,
    title                 TEXT NOT NULL,
    summary               TEXT,
    source_url            TEXT NOT NULL,
    source_name           TEXT,
    provider              TEXT NOT NULL,
    published_date        TEXT,
    competitors_mentioned TEXT NOT NULL DEFAULT '[]',
    topics                TEXT NOT NULL DEFAULT '[]',
    category              TEXT NOT NULL,
    sentiment             TEXT NOT NULL,
    relevance_score       REAL NOT NULL,
    is_relevant           INTEGER NOT NULL DEFAULT 1,
    collected_at          TEXT NOT NULL
);

-- Append-only audit trail, one row per webhook invocation.
CREATE TABLE IF NOT EXISTS collection_logs (
    log_id          TEXT PRIMARY KEY,
    task_name       TEXT NOT NULL,
    source_type     TEXT NOT NULL,
    competitor_id   TEXT REFERENCES competitors(competitor_id),
    status          TEXT NOT NULL,   -- 'success' | 'partial' | 'failed'
    error_message   TEXT,
    items_collected INTEGER NOT NULL DEFAULT 0,
    raw_payload     TEXT NOT NULL DEFAULT 'null',
    started_at      TEXT NOT NULL,
    completed_at    TEXT
);

CREATE INDEX IF NOT EXISTS driver_tariffs_latest_idx
    ON driver_tariffs(competitor_id) WHERE is_latest = 1;
CREATE INDEX IF NOT EXISTS rider_tariffs_latest_idx
    ON rider_tariffs(competitor_id, service_type) WHERE is_latest = 1;
CREATE INDEX IF NOT EXISTS reviews_competitor_idx ON reviews(competitor_id);
CREATE INDEX IF NOT EXISTS news_items_collected_idx ON news_items(collected_at);
CREATE INDEX IF NOT EXISTS collection_logs_started_idx ON collection_logs(started_at);

PRAGMA user_version = 1;
";
