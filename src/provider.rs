//! Email service providers and their export conventions.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // Anchored at the start only: `contact_export_1.csv.bak` is accepted too.
    static ref CC_EXPORT_PATTERN: Regex = Regex::new(r"^contact_export_.*\.csv").unwrap();
}

/// Opened marker written into a campaign slot.
pub const OPENED_MARKER: &str = "X";
/// Number of campaign slots per report.
pub const CAMPAIGN_SLOTS: usize = 10;
pub const TOTAL_OPENS_COLUMN: &str = "Total Opens";
pub const ESP_COLUMN: &str = "ESP";
/// Canonical email column shared by every report table.
pub const CANONICAL_EMAIL_COLUMN: &str = "Email Address";

pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MASTER_REPORT_FILE_NAME: &str = "Master_VIP_Report.xlsx";

/// Header of campaign slot `slot` (0-based).
pub fn campaign_column(slot: usize) -> String {
    format!("Campaign {}", slot + 1)
}

/// The email service providers whose exports we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Mailchimp,
    ConstantContact,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Mailchimp, Provider::ConstantContact];

    /// Email column name in both the VIP list and the opener exports.
    pub fn email_column(self) -> &'static str {
        match self {
            Provider::Mailchimp => "Email Address",
            Provider::ConstantContact => "Email address",
        }
    }

    /// Label written into the ESP column.
    pub fn esp_label(self) -> &'static str {
        match self {
            Provider::Mailchimp => "Mailchimp",
            Provider::ConstantContact => "Constant Contact",
        }
    }

    /// Whether `file_name` is one of this provider's opener exports.
    pub fn matches_opener_file(self, file_name: &str) -> bool {
        match self {
            Provider::Mailchimp => file_name.ends_with("-blast.csv"),
            Provider::ConstantContact => CC_EXPORT_PATTERN.is_match(file_name),
        }
    }

    /// Column renames applied to the finished table so both providers share
    /// one schema.
    pub fn canonical_renames(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Provider::Mailchimp => &[],
            Provider::ConstantContact => &[
                ("Email address", "Email Address"),
                ("First name", "First Name"),
                ("Last name", "Last Name"),
                ("Tags", "TAGS"),
            ],
        }
    }

    /// Solid fill used for this provider's ESP cells.
    pub fn fill_color(self) -> &'static str {
        match self {
            Provider::Mailchimp => "#FFFF00",
            Provider::ConstantContact => "#0000FF",
        }
    }

    pub fn report_file_name(self) -> &'static str {
        match self {
            Provider::Mailchimp => "Email_Opens_Report_for_VIPs.xlsx",
            Provider::ConstantContact => "CC_Email_Opens_Report_for_VIPs.xlsx",
        }
    }

    /// Look up a provider by the label found in an ESP cell.
    pub fn from_esp_label(label: &str) -> Option<Provider> {
        Provider::ALL.into_iter().find(|p| p.esp_label() == label)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.esp_label())
    }
}
