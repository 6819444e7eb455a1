//! Incremental clients sync (business-wide, cursor on `updatedAfter`),
//! plus the CSV snapshot artifact archived for future bootstraps.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::models::Client;
use datahub_core::sync::{run_cursor_sync, SyncTuning, SCOPE_ALL};
use datahub_core::{Error, Result};
use datahub_storage_postgres::ClientRepository;
use datahub_upstream::ClientsClient;

use crate::context::JobContext;

const ENTITY: &str = "clients_api";
const ARCHIVE_DIR: &str = "data/clients_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = ClientsClient::new(ctx.upstream_config());
    let repo = ClientRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();
    let tuning = SyncTuning::incremental(ENTITY);

    let outcome = run_cursor_sync(SCOPE_ALL, &tuning, &client, &repo, &watermarks, &cancel).await?;

    if outcome.rows.is_empty() {
        info!("clients: no new or updated rows; nothing to archive");
        return Ok(());
    }

    let archived = export_snapshot(ctx, &outcome.rows)?;
    info!(rows = outcome.rows.len(), archive = %archived, "clients: finished");
    Ok(())
}

/// Write the fetched rows to `{EXPORT_DIR}/clients_api_incremental_*.csv`
/// and move the file into the bootstrap archive on success.
fn export_snapshot(ctx: &JobContext, rows: &[Client]) -> Result<String> {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("clients_api_incremental_{stamp}.csv");
    let tmp_path = ctx.settings.export_dir.join(&filename);

    write_snapshot_csv(&tmp_path, rows)
        .map_err(|err| Error::Config(format!("write {}: {err}", tmp_path.display())))?;
    info!(path = %tmp_path.display(), "clients: snapshot written");

    fs::create_dir_all(ARCHIVE_DIR)
        .map_err(|err| Error::Config(format!("create {ARCHIVE_DIR}: {err}")))?;
    let final_path = Path::new(ARCHIVE_DIR).join(&filename);
    fs::rename(&tmp_path, &final_path)
        .map_err(|err| Error::Config(format!("archive {}: {err}", final_path.display())))?;

    Ok(final_path.display().to_string())
}

fn write_snapshot_csv(path: &Path, rows: &[Client]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "client_id",
        "version",
        "first_name",
        "last_name",
        "mobile",
        "email",
        "street_address_1",
        "street_address_2",
        "city",
        "postal_code",
        "country",
        "birth_date",
        "client_since",
        "gender",
        "notes",
        "loyalty_card_serial",
        "loyalty_points",
        "credit_outstanding_balance",
        "credit_days",
        "credit_limit",
        "updated_at_upstream",
    ])?;

    for c in rows {
        let record: Vec<String> = vec![
            c.client_id.clone(),
            c.version.to_string(),
            c.first_name.clone(),
            c.last_name.clone(),
            c.mobile.clone(),
            c.email.clone(),
            c.street_address_1.clone(),
            c.street_address_2.clone(),
            c.city.clone(),
            c.postal_code.clone(),
            c.country.clone(),
            c.birth_date.map(|d| d.to_string()).unwrap_or_default(),
            c.client_since.map(|d| d.to_string()).unwrap_or_default(),
            c.gender.clone(),
            c.notes.clone(),
            c.loyalty_card_serial.clone(),
            c.loyalty_points.map(|v| v.to_string()).unwrap_or_default(),
            c.credit_outstanding_balance
                .map(|v| v.to_string())
                .unwrap_or_default(),
            c.credit_days.map(|v| v.to_string()).unwrap_or_default(),
            c.credit_limit.map(|v| v.to_string()).unwrap_or_default(),
            c.updated_at_upstream
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
        ];
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_csv_round_trips_through_a_temp_file() {
        let dir = std::env::temp_dir().join("datahub-clients-csv-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.csv");

        let rows = vec![Client {
            client_id: "cl-1".into(),
            version: 2,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Client::default()
        }];
        write_snapshot_csv(&path, &rows).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        assert!(lines.next().unwrap().starts_with("client_id,version"));
        assert!(lines.next().unwrap().starts_with("cl-1,2,Ada,Lovelace"));
        fs::remove_file(&path).ok();
    }
}
