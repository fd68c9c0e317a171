//! Status command implementation.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tillsync_model::EntityClass;
use tillsync_store::{ModelRegistry, Store, StoreResult};
use tillsync_sync_engine::DATABASE_PATH_VAR;

/// Stored state of one model.
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    /// Model name.
    pub model: &'static str,
    /// Direction the model flows in.
    pub class: &'static str,
    /// Stored rows.
    pub rows: usize,
    /// Last pull cursor, reference models only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Prints row counts and cursors of the local store.
pub fn run(database: Option<PathBuf>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = database
        .or_else(|| std::env::var(DATABASE_PATH_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("edge.sqlite3"));
    if !path.exists() {
        return Err(format!("No database found at {}", path.display()).into());
    }

    let rows = collect(&path)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => {
            println!("Database: {}", path.display());
            for row in &rows {
                print!("  {:<32} {:<14} {:>8}", row.model, row.class, row.rows);
                match &row.cursor {
                    Some(cursor) => println!("  since {cursor}"),
                    None => println!(),
                }
            }
        }
    }
    Ok(())
}

/// Reads the status of every registered model.
pub fn collect(path: &Path) -> StoreResult<Vec<ModelStatus>> {
    let store = Store::open(path)?;
    let registry = ModelRegistry::with_defaults();
    registry
        .names()
        .into_iter()
        .filter_map(|name| registry.get(name))
        .map(|model| -> StoreResult<ModelStatus> {
            let name = model.type_name();
            let cursor = match model.class() {
                EntityClass::Reference => store.cursor(name)?.map(|c| c.to_rfc3339()),
                EntityClass::Transactional => None,
            };
            Ok(ModelStatus {
                model: name,
                class: model.class().as_str(),
                rows: store.count(name)?,
                cursor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillsync_testkit::{seed_category, seed_order, TestStore};

    #[test]
    fn collects_counts_per_model() {
        let store = TestStore::file();
        seed_order(&store, "S-1", 100);
        seed_category(&store, "Drinks");
        let path = store.path().unwrap();

        let rows = collect(&path).unwrap();
        let find = |name: &str| rows.iter().find(|r| r.model == name).unwrap();
        assert_eq!(find("Order").rows, 1);
        assert_eq!(find("OrderItem").rows, 1);
        assert_eq!(find("Category").rows, 1);
        assert_eq!(find("Category").class, "reference");
        assert!(find("Category").cursor.is_none());
    }
}
