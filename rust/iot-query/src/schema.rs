//! Diesel schema definitions for the hierarchy and telemetry tables.

diesel::table! {
    use diesel::sql_types::*;

    asset_metadata (id) {
        id -> Int8,
        document -> Jsonb,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    telemetry_readings (id) {
        id -> Int8,
        time -> Timestamptz,
        parent_asset_uid -> Text,
        payload -> Jsonb,
    }
}

/// Idempotent DDL applied at startup.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS asset_metadata (
    id       BIGSERIAL PRIMARY KEY,
    document JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS telemetry_readings (
    id               BIGSERIAL PRIMARY KEY,
    time             TIMESTAMPTZ NOT NULL,
    parent_asset_uid TEXT NOT NULL,
    payload          JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS telemetry_readings_parent_time_idx
    ON telemetry_readings (parent_asset_uid, time);
"#;
