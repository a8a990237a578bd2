//! VIP Report - Cross-reference ESP opener exports against a VIP list
//!
//! Generates the Mailchimp report, the Constant Contact report, and the
//! combined master report as styled Excel workbooks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vip_opens_report::pipeline::{
    generate_master_from_files, generate_master_report, generate_provider_report,
    MasterReportConfig, ProviderReport, ProviderReportConfig, ReportDownload,
};
use vip_opens_report::provider::MASTER_REPORT_FILE_NAME;
use vip_opens_report::{Provider, ReportError};

#[derive(Parser)]
#[command(name = "vip-report")]
#[command(about = "Generate VIP email open reports from Mailchimp and Constant Contact exports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Mailchimp VIP report (opener files end with `-blast.csv`)
    Mailchimp {
        /// VIP list Excel file (needs an "Email Address" column)
        #[arg(long)]
        vip_list: PathBuf,

        /// Directory holding the opener CSVs
        #[arg(long)]
        openers: PathBuf,

        /// Output xlsx path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the Constant Contact VIP report (opener files match `contact_export_*.csv`)
    ConstantContact {
        /// VIP list Excel file (needs an "Email address" column)
        #[arg(long)]
        vip_list: PathBuf,

        /// Directory holding the opener CSVs
        #[arg(long)]
        openers: PathBuf,

        /// Output xlsx path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine two previously generated reports into a master report
    Master {
        /// Mailchimp report xlsx
        #[arg(long)]
        mailchimp_report: PathBuf,

        /// Constant Contact report xlsx
        #[arg(long)]
        cc_report: PathBuf,

        /// Output xlsx path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build both provider reports and the master report in one run
    All {
        #[arg(long)]
        mc_vip_list: PathBuf,

        #[arg(long)]
        mc_openers: PathBuf,

        #[arg(long)]
        cc_vip_list: PathBuf,

        #[arg(long)]
        cc_openers: PathBuf,

        /// Directory the three reports are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Mailchimp {
            vip_list,
            openers,
            output,
        } => provider_report(Provider::Mailchimp, vip_list, openers, output),
        Commands::ConstantContact {
            vip_list,
            openers,
            output,
        } => provider_report(Provider::ConstantContact, vip_list, openers, output),
        Commands::Master {
            mailchimp_report,
            cc_report,
            output,
        } => master_report(mailchimp_report, cc_report, output),
        Commands::All {
            mc_vip_list,
            mc_openers,
            cc_vip_list,
            cc_openers,
            out_dir,
        } => all_reports(mc_vip_list, mc_openers, cc_vip_list, cc_openers, &out_dir),
    };

    // Missing inputs: warn and exit with status 2, no output written.
    if let Err(err) = &outcome {
        if let Some(ReportError::MissingInput(msg)) = err.downcast_ref::<ReportError>() {
            log::warn!("{}", msg);
            eprintln!("Warning: {}", msg);
            std::process::exit(2);
        }
    }
    outcome
}

fn save(download: &ReportDownload, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = output.unwrap_or_else(|| PathBuf::from(download.file_name));
    download
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn build(provider: Provider, vip_list: PathBuf, openers_dir: PathBuf) -> Result<ProviderReport> {
    let config = ProviderReportConfig {
        provider,
        vip_list,
        openers_dir,
    };
    let report = generate_provider_report(&config)?;
    Ok(report)
}

fn provider_report(
    provider: Provider,
    vip_list: PathBuf,
    openers: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = build(provider, vip_list, openers)?;
    let path = save(&report.download, output)?;
    println!(
        "{} report: {} VIPs -> {}",
        provider,
        report.table.len(),
        path.display()
    );
    Ok(())
}

fn master_report(
    mailchimp_report: PathBuf,
    constant_contact_report: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = MasterReportConfig {
        mailchimp_report,
        constant_contact_report,
    };
    let download = generate_master_from_files(&config)?;
    let path = save(&download, output)?;
    println!("Master report -> {}", path.display());
    Ok(())
}

fn all_reports(
    mc_vip_list: PathBuf,
    mc_openers: PathBuf,
    cc_vip_list: PathBuf,
    cc_openers: PathBuf,
    out_dir: &Path,
) -> Result<()> {
    let mailchimp = build(Provider::Mailchimp, mc_vip_list, mc_openers)?;
    let constant_contact = build(Provider::ConstantContact, cc_vip_list, cc_openers)?;

    for report in [&mailchimp, &constant_contact] {
        let path = save(
            &report.download,
            Some(out_dir.join(report.download.file_name)),
        )?;
        println!(
            "{} report: {} VIPs -> {}",
            report.provider,
            report.table.len(),
            path.display()
        );
    }

    let master = generate_master_report(Some(&mailchimp), Some(&constant_contact))?;
    let path = save(&master, Some(out_dir.join(MASTER_REPORT_FILE_NAME)))?;
    println!("Master report -> {}", path.display());
    Ok(())
}
