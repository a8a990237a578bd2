//! Pipeline functions for programmatic use by the CLI.
//!
//! Each function checks that its inputs are present, runs the load /
//! aggregate / format steps, and returns the finished workbook as a
//! [`ReportDownload`] together with the table it was built from (the master
//! report is built from those tables).

use crate::aggregate::{aggregate_opens, opener_files};
use crate::error::{ReportError, Result};
use crate::format::format_report;
use crate::provider::{Provider, MASTER_REPORT_FILE_NAME, XLSX_MIME_TYPE};
use crate::table::ReportTable;
use crate::vip_list::VipIndex;
use std::io::Cursor;
use std::path::{Path, PathBuf};

// ============================================================================
// Download artifact
// ============================================================================

/// A rendered workbook ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ReportDownload {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ReportDownload {
    fn xlsx(file_name: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            mime_type: XLSX_MIME_TYPE,
            bytes,
        }
    }

    /// Reader over the workbook bytes, positioned at offset 0.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }

    /// Write the workbook to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.bytes)?;
        log::info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(())
    }
}

// ============================================================================
// Per-provider report
// ============================================================================

/// Configuration for one provider's report.
#[derive(Debug, Clone)]
pub struct ProviderReportConfig {
    pub provider: Provider,
    /// VIP list workbook
    pub vip_list: PathBuf,
    /// Directory holding the provider's opener CSV exports
    pub openers_dir: PathBuf,
}

/// A provider report: the aggregated table and its styled workbook.
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub provider: Provider,
    pub table: ReportTable,
    pub download: ReportDownload,
}

/// Build one provider's report. Fails without output if the VIP list is
/// missing, no opener export matches, or a required column is absent.
pub fn generate_provider_report(config: &ProviderReportConfig) -> Result<ProviderReport> {
    let provider = config.provider;

    if !config.vip_list.is_file() {
        return Err(ReportError::MissingInput(format!(
            "{} VIP list not found: {}",
            provider,
            config.vip_list.display()
        )));
    }
    if !config.openers_dir.is_dir() {
        return Err(ReportError::MissingInput(format!(
            "{} opener directory not found: {}",
            provider,
            config.openers_dir.display()
        )));
    }

    let files = opener_files(&config.openers_dir, provider)?;
    if files.is_empty() {
        return Err(ReportError::MissingInput(format!(
            "no {} opener CSVs in {}",
            provider,
            config.openers_dir.display()
        )));
    }

    let index = VipIndex::load(&config.vip_list, provider.email_column())?;
    let table = aggregate_opens(index, &files, provider)?;
    let bytes = format_report(&table)?;

    Ok(ProviderReport {
        provider,
        download: ReportDownload::xlsx(provider.report_file_name(), bytes),
        table,
    })
}

// ============================================================================
// Master report
// ============================================================================

/// Configuration for merging two previously generated report workbooks.
#[derive(Debug, Clone)]
pub struct MasterReportConfig {
    pub mailchimp_report: PathBuf,
    pub constant_contact_report: PathBuf,
}

/// Stack the Mailchimp and Constant Contact tables and format the result.
pub fn merge_reports(mailchimp: &ReportTable, constant_contact: &ReportTable) -> Result<ReportDownload> {
    let master = mailchimp.concat(constant_contact);
    log::info!(
        "Master report: {} + {} = {} rows",
        mailchimp.len(),
        constant_contact.len(),
        master.len()
    );
    let bytes = format_report(&master)?;
    Ok(ReportDownload::xlsx(MASTER_REPORT_FILE_NAME, bytes))
}

/// Build the master report from both provider reports. Both must exist.
pub fn generate_master_report(
    mailchimp: Option<&ProviderReport>,
    constant_contact: Option<&ProviderReport>,
) -> Result<ReportDownload> {
    match (mailchimp, constant_contact) {
        (Some(mc), Some(cc)) => merge_reports(&mc.table, &cc.table),
        _ => Err(ReportError::MissingInput(
            "both the Mailchimp and Constant Contact reports are needed for the master file"
                .to_string(),
        )),
    }
}

/// Build the master report by re-reading two report workbooks from disk.
pub fn generate_master_from_files(config: &MasterReportConfig) -> Result<ReportDownload> {
    for path in [&config.mailchimp_report, &config.constant_contact_report] {
        if !path.is_file() {
            return Err(ReportError::MissingInput(format!(
                "report not found: {}",
                path.display()
            )));
        }
    }
    let mailchimp = ReportTable::from_workbook(&config.mailchimp_report)?;
    let constant_contact = ReportTable::from_workbook(&config.constant_contact_report)?;
    merge_reports(&mailchimp, &constant_contact)
}
