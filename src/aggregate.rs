//! Opener aggregation: join each provider's per-campaign opener exports
//! against the VIP index and produce the report table.

use crate::error::{ReportError, Result};
use crate::provider::{
    campaign_column, Provider, CAMPAIGN_SLOTS, ESP_COLUMN, OPENED_MARKER, TOTAL_OPENS_COLUMN,
};
use crate::table::{Cell, ReportTable};
use crate::vip_list::VipIndex;
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};

/// List the opener files in `dir` that belong to `provider`.
///
/// Files are taken in lexicographic filename order and capped at
/// [`CAMPAIGN_SLOTS`]; the Nth returned file feeds campaign slot N.
pub fn opener_files(dir: &Path, provider: Provider) -> Result<Vec<PathBuf>> {
    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if provider.matches_opener_file(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    if names.len() > CAMPAIGN_SLOTS {
        log::debug!(
            "{} matching {} opener files, ignoring {} past the first {}",
            names.len(),
            provider,
            names.len() - CAMPAIGN_SLOTS,
            CAMPAIGN_SLOTS
        );
    }

    Ok(names
        .into_iter()
        .take(CAMPAIGN_SLOTS)
        .map(|name| dir.join(name))
        .collect())
}

/// Read every value of `email_column` from an opener CSV export.
pub fn read_opener_emails(path: &Path, email_column: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let email_idx = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == email_column)
        .ok_or_else(|| ReportError::MissingColumn {
            column: email_column.to_string(),
            source_path: path.to_path_buf(),
        })?;

    let mut emails = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(email) = record.get(email_idx) {
            let email = email.trim();
            if !email.is_empty() {
                emails.push(email.to_string());
            }
        }
    }
    Ok(emails)
}

/// Mark campaign slots from `files` (slot N = Nth file) and build the report.
///
/// Files beyond the slot count are ignored. Opener emails that are not VIPs
/// are dropped without error.
pub fn aggregate_opens(
    mut index: VipIndex,
    files: &[PathBuf],
    provider: Provider,
) -> Result<ReportTable> {
    for (slot, path) in files.iter().take(CAMPAIGN_SLOTS).enumerate() {
        let emails = read_opener_emails(path, provider.email_column())?;
        let matched = emails
            .iter()
            .filter(|email| index.mark_opened(email, slot))
            .count();
        log::info!(
            "{} -> {} ({} openers, {} VIPs)",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("(unknown)"),
            campaign_column(slot),
            emails.len(),
            matched
        );
        log::debug!("{} openers not on the VIP list", emails.len() - matched);
    }

    Ok(build_report_table(&index, provider))
}

/// Scan `openers_dir` for the provider's exports and aggregate them into `index`.
pub fn aggregate_directory(
    index: VipIndex,
    openers_dir: &Path,
    provider: Provider,
) -> Result<ReportTable> {
    let files = opener_files(openers_dir, provider)?;
    aggregate_opens(index, &files, provider)
}

/// Lay the index out as a report table: email, VIP fields, campaign slots,
/// total opens, ESP. Column renames for the provider are applied last.
pub fn build_report_table(index: &VipIndex, provider: Provider) -> ReportTable {
    let mut columns = Vec::with_capacity(index.field_columns().len() + CAMPAIGN_SLOTS + 3);
    columns.push(index.email_column().to_string());
    columns.extend(index.field_columns().iter().cloned());
    columns.extend((0..CAMPAIGN_SLOTS).map(campaign_column));
    columns.push(TOTAL_OPENS_COLUMN.to_string());
    columns.push(ESP_COLUMN.to_string());

    let mut table = ReportTable::new(columns);
    for record in index.records() {
        let mut row = Vec::with_capacity(table.columns.len());
        row.push(Cell::text(record.email.clone()));
        row.extend(record.fields.iter().cloned());
        row.extend(record.campaigns.iter().map(|&opened| {
            if opened {
                Cell::text(OPENED_MARKER)
            } else {
                Cell::Empty
            }
        }));
        row.push(Cell::Number(record.total_opens() as f64));
        row.push(Cell::text(provider.esp_label()));
        table.push_row(row);
    }

    table.rename_columns(provider.canonical_renames());
    table
}
