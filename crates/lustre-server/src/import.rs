//! `lustre import`: load daily sales facts from a JSON file into the store.
//!
//! The file holds a JSON array of objects with `organization_id`, `date`
//! (`YYYY-MM-DD`), optional `location_id`, and the revenue / transaction
//! columns. Revenue values may be numbers or numeric strings; anything else
//! counts as zero.

use std::path::Path;

use anyhow::Context as _;
use lustre_core::sales::DailySalesFact;
use lustre_store_sqlite::SqliteStore;

pub fn parse_sales(json: &str) -> anyhow::Result<Vec<DailySalesFact>> {
  serde_json::from_str(json).context("expected a JSON array of daily sales facts")
}

/// Read, parse and insert `path`. Returns the number of facts written.
pub async fn import_file(store: &SqliteStore, path: &Path) -> anyhow::Result<usize> {
  let text = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;
  let facts = parse_sales(&text)
    .with_context(|| format!("failed to parse {}", path.display()))?;
  store
    .insert_daily_sales(&facts)
    .await
    .context("failed to insert daily sales")
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use lustre_core::store::SalesSource;

  use super::*;

  const SAMPLE: &str = r#"[
    { "organization_id": "org-1", "date": "2024-01-05",
      "total_revenue": 1200.5, "service_revenue": "900", "product_revenue": null,
      "transaction_count": 14 },
    { "organization_id": "org-1", "location_id": "downtown", "date": "2024-01-06",
      "total_revenue": "oops" }
  ]"#;

  #[test]
  fn parses_leniently() {
    let facts = parse_sales(SAMPLE).unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(facts[0].total_revenue, 1200.5);
    assert_eq!(facts[0].service_revenue, 900.0);
    assert_eq!(facts[0].product_revenue, 0.0);
    assert_eq!(facts[0].transaction_count, 14);
    assert_eq!(facts[1].location_id.as_deref(), Some("downtown"));
    assert_eq!(facts[1].total_revenue, 0.0);
    assert_eq!(facts[1].transaction_count, 0);
  }

  #[test]
  fn rejects_non_arrays() {
    assert!(parse_sales(r#"{"organization_id": "org-1"}"#).is_err());
    assert!(parse_sales(r#"[{"organization_id": "org-1", "date": "yesterday"}]"#).is_err());
  }

  #[tokio::test]
  async fn imports_into_the_store() {
    let path = std::env::temp_dir()
      .join(format!("lustre-import-{}.json", std::process::id()));
    std::fs::write(&path, SAMPLE).unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let written = import_file(&store, &path).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(written, 2);
    assert_eq!(store.daily_sales("org-1", None).await.unwrap().len(), 2);
  }
}
