//! Database schema.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Schema for a fresh database.
///
/// Timestamps are microseconds since the Unix epoch. `body` holds the
/// model's mapped columns as a JSON object in wire form.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    external_id TEXT,
    parent_id INTEGER,
    updated_at INTEGER NOT NULL,
    synced_at INTEGER,
    body TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_model_external_id
    ON entities (model, external_id);

CREATE INDEX IF NOT EXISTS idx_entities_model_updated_at
    ON entities (model, updated_at);

CREATE INDEX IF NOT EXISTS idx_entities_model_parent
    ON entities (model, parent_id);

CREATE TABLE IF NOT EXISTS sync_cursors (
    model TEXT PRIMARY KEY,
    cursor INTEGER NOT NULL
);
"#;
