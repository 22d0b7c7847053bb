//! SQL schema for the Lustre SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Written by the ingestion side and never modified by the engine.
-- Revenue columns use NUMERIC affinity so that malformed values written by
-- other tools survive as text and are coerced on read.
CREATE TABLE IF NOT EXISTS daily_sales (
    organization_id   TEXT NOT NULL,
    location_id       TEXT,
    location_key      TEXT NOT NULL DEFAULT '',  -- location_id or ''
    date              TEXT NOT NULL,             -- YYYY-MM-DD
    total_revenue     NUMERIC,
    service_revenue   NUMERIC,
    product_revenue   NUMERIC,
    transaction_count NUMERIC,
    UNIQUE (organization_id, location_key, date)
);

CREATE TABLE IF NOT EXISTS forecast_projections (
    forecast_id               TEXT PRIMARY KEY,
    organization_id           TEXT NOT NULL,
    location_id               TEXT,
    location_key              TEXT NOT NULL DEFAULT '',
    forecast_type             TEXT NOT NULL,   -- 'quarterly'
    period_label              TEXT NOT NULL,   -- e.g. 'Q1 2025'
    period_start              TEXT NOT NULL,
    period_end                TEXT NOT NULL,
    scenario                  TEXT NOT NULL,   -- 'conservative' | 'baseline' | 'optimistic'
    projected_revenue         REAL NOT NULL,
    projected_service_revenue REAL NOT NULL,
    projected_product_revenue REAL NOT NULL,
    qoq_growth_rate           REAL NOT NULL,
    yoy_growth_rate           REAL,
    confidence_lower          REAL NOT NULL,
    confidence_upper          REAL NOT NULL,
    momentum                  TEXT NOT NULL,
    seasonality_index         REAL NOT NULL,
    insights                  TEXT,            -- JSON array; baseline rows only
    generated_at              TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    expires_at                TEXT NOT NULL,
    UNIQUE (organization_id, location_key, forecast_type, scenario, period_label)
);

CREATE INDEX IF NOT EXISTS daily_sales_org_date_idx
    ON daily_sales(organization_id, date);
CREATE INDEX IF NOT EXISTS forecast_projections_expiry_idx
    ON forecast_projections(organization_id, expires_at);

PRAGMA user_version = 1;
";
