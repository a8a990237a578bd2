//! VIP list loading.
//!
//! The VIP list is a workbook whose first sheet has a header row with an
//! email column plus any number of identity/tag columns. Each row becomes a
//! [`VipRecord`] with ten blank campaign slots, addressable by normalized
//! email through [`VipIndex`].

use crate::error::{ReportError, Result};
use crate::provider::{campaign_column, CAMPAIGN_SLOTS, ESP_COLUMN, TOTAL_OPENS_COLUMN};
use crate::table::{Cell, ReportTable};
use std::collections::HashMap;
use std::path::Path;

/// Lowercased, whitespace-trimmed form used as the index key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// One VIP contact and its per-campaign open marks.
#[derive(Debug, Clone, PartialEq)]
pub struct VipRecord {
    /// Email as it appears in the VIP list (trimmed).
    pub email: String,
    /// Remaining VIP list columns, aligned with [`VipIndex::field_columns`].
    pub fields: Vec<Cell>,
    pub campaigns: [bool; CAMPAIGN_SLOTS],
}

impl VipRecord {
    pub fn mark_opened(&mut self, slot: usize) {
        if let Some(opened) = self.campaigns.get_mut(slot) {
            *opened = true;
        }
    }

    /// Number of campaign slots marked opened.
    pub fn total_opens(&self) -> usize {
        self.campaigns.iter().filter(|opened| **opened).count()
    }
}

/// VIP records keyed by normalized email, in VIP list order.
#[derive(Debug, Clone)]
pub struct VipIndex {
    email_column: String,
    field_columns: Vec<String>,
    records: Vec<VipRecord>,
    by_email: HashMap<String, usize>,
}

impl VipIndex {
    /// Load the first sheet of the workbook at `path`, keyed on `email_column`.
    pub fn load(path: &Path, email_column: &str) -> Result<VipIndex> {
        let table = ReportTable::from_workbook(path)?;
        let index = VipIndex::from_table(&table, email_column, path)?;
        log::info!(
            "Loaded {} VIPs from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Build an index from an already-read table. `source` is only used in
    /// error messages.
    ///
    /// Rows with a blank email are skipped. A repeated email keeps the
    /// position of its first row but takes the fields of its last row.
    pub fn from_table(table: &ReportTable, email_column: &str, source: &Path) -> Result<VipIndex> {
        let email_idx = table
            .column_index(email_column)
            .ok_or_else(|| ReportError::MissingColumn {
                column: email_column.to_string(),
                source_path: source.to_path_buf(),
            })?;

        let reserved: Vec<String> = (0..CAMPAIGN_SLOTS)
            .map(campaign_column)
            .chain([TOTAL_OPENS_COLUMN.to_string(), ESP_COLUMN.to_string()])
            .collect();
        let field_idx: Vec<usize> = (0..table.columns.len())
            .filter(|&i| i != email_idx && !reserved.contains(&table.columns[i]))
            .collect();

        let mut index = VipIndex {
            email_column: email_column.to_string(),
            field_columns: field_idx.iter().map(|&i| table.columns[i].clone()).collect(),
            records: Vec::with_capacity(table.len()),
            by_email: HashMap::with_capacity(table.len()),
        };

        for (row_num, row) in table.rows.iter().enumerate() {
            let email = row[email_idx].to_string().trim().to_string();
            if email.is_empty() {
                log::debug!("VIP row {} has no email, skipping", row_num + 2);
                continue;
            }
            let record = VipRecord {
                fields: field_idx.iter().map(|&i| row[i].clone()).collect(),
                email,
                campaigns: [false; CAMPAIGN_SLOTS],
            };
            index.insert(record);
        }

        Ok(index)
    }

    fn insert(&mut self, record: VipRecord) {
        let key = normalize_email(&record.email);
        match self.by_email.get(&key) {
            Some(&pos) => {
                log::debug!("Duplicate VIP email {}, keeping last row", record.email);
                self.records[pos] = record;
            }
            None => {
                self.by_email.insert(key, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Mark `email` as having opened campaign `slot`. Returns false when the
    /// email is not a VIP.
    pub fn mark_opened(&mut self, email: &str, slot: usize) -> bool {
        match self.by_email.get(&normalize_email(email)) {
            Some(&pos) => {
                self.records[pos].mark_opened(slot);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, email: &str) -> Option<&VipRecord> {
        self.by_email
            .get(&normalize_email(email))
            .map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, email: &str) -> bool {
        self.by_email.contains_key(&normalize_email(email))
    }

    pub fn email_column(&self) -> &str {
        &self.email_column
    }

    pub fn field_columns(&self) -> &[String] {
        &self.field_columns
    }

    pub fn records(&self) -> &[VipRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
