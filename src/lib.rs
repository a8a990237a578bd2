//! VIP Opens Report
//!
//! Cross-references per-campaign email "open" exports from Mailchimp and
//! Constant Contact against a VIP contact list and produces styled Excel
//! reports showing which VIPs opened which campaigns.
//!
//! This library provides:
//! - `vip_list`: VIP list loading, keyed by normalized email
//! - `aggregate`: opener file discovery and per-campaign aggregation
//! - `format`: report styling, resort and xlsx rendering
//! - `pipeline`: per-provider and master report generation
//!
//! Binaries:
//! - `vip-report`: command-line report generator

pub mod aggregate;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod provider;
pub mod table;
pub mod vip_list;

pub use error::{ReportError, Result};
pub use provider::Provider;
pub use table::{Cell, ReportTable};
pub use vip_list::{VipIndex, VipRecord};
