//! End-to-end tests for report generation.
//!
//! Each test writes a VIP list workbook and a directory of opener CSVs into a
//! temp dir, runs the pipeline, then reads the produced workbook back to
//! check campaign slots, totals, ordering and the master merge.

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use vip_opens_report::format::format_report;
use vip_opens_report::pipeline::{
    generate_master_from_files, generate_master_report, generate_provider_report,
    ProviderReportConfig, MasterReportConfig,
};
use vip_opens_report::{Cell, Provider, ReportError, ReportTable};

fn write_vip_list(path: &Path, headers: &[&str], rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row as u32 + 1, col as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

fn write_openers(dir: &Path, name: &str, column: &str, emails: &[&str]) {
    let mut content = format!("{column},Opens\n");
    for email in emails {
        content.push_str(&format!("{email},1\n"));
    }
    std::fs::write(dir.join(name), content).unwrap();
}

fn read_back(dir: &Path, name: &str, bytes: &[u8]) -> ReportTable {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    ReportTable::from_workbook(&path).unwrap()
}

fn row_for<'a>(table: &'a ReportTable, email: &str) -> &'a [Cell] {
    let idx = table.column_index("Email Address").unwrap();
    table
        .rows
        .iter()
        .find(|r| r[idx].to_string() == email)
        .unwrap_or_else(|| panic!("no row for {email}"))
}

fn opened_slots(table: &ReportTable, email: &str) -> Vec<usize> {
    let row = row_for(table, email);
    (1..=10)
        .filter(|n| {
            let idx = table.column_index(&format!("Campaign {n}")).unwrap();
            row[idx] == Cell::text("X")
        })
        .collect()
}

fn total_opens(table: &ReportTable, email: &str) -> f64 {
    let idx = table.column_index("Total Opens").unwrap();
    row_for(table, email)[idx].as_sort_key()
}

/// Mailchimp fixture: ann opens every file, bob opens a, c and j, cy opens
/// nothing, dee only appears in the 11th file.
fn mailchimp_fixture(root: &Path) -> ProviderReportConfig {
    let openers = root.join("mc");
    std::fs::create_dir_all(&openers).unwrap();
    let vip_list = root.join("MCVIP.xlsx");
    write_vip_list(
        &vip_list,
        &["Email Address", "First Name", "Last Name", "TAGS"],
        &[
            &["cy@x.com", "Cy", "Young", ""],
            &["bob@x.com", "Bob", "Ray", "board"],
            &["ann@x.com", "Ann", "Lee", "donor"],
            &["dee@x.com", "Dee", "Fox", ""],
        ],
    );

    for letter in 'a'..='k' {
        let mut emails = vec!["ann@x.com"];
        match letter {
            'a' => emails.extend(["bob@x.com", "stranger@x.com"]),
            'c' => emails.push(" Bob@X.com"),
            'j' => emails.push("bob@x.com"),
            'k' => emails.push("dee@x.com"),
            _ => {}
        }
        write_openers(&openers, &format!("{letter}-blast.csv"), "Email Address", &emails);
    }
    write_openers(&openers, "summary.csv", "Email Address", &["cy@x.com"]);

    ProviderReportConfig {
        provider: Provider::Mailchimp,
        vip_list,
        openers_dir: openers,
    }
}

fn constant_contact_fixture(root: &Path) -> ProviderReportConfig {
    let openers = root.join("cc");
    std::fs::create_dir_all(&openers).unwrap();
    let vip_list = root.join("CCVIP.xlsx");
    write_vip_list(
        &vip_list,
        &["Email address", "First name", "Last name", "Tags"],
        &[
            &["eve@y.com", "Eve", "Stone", "press"],
            &["fay@y.com", "Fay", "Wu", ""],
        ],
    );
    write_openers(&openers, "contact_export_2.csv", "Email address", &["fay@y.com"]);
    write_openers(
        &openers,
        "contact_export_1.csv",
        "Email address",
        &["eve@y.com", "fay@y.com", "ghost@y.com"],
    );
    write_openers(&openers, "a-blast.csv", "Email address", &["eve@y.com"]);

    ProviderReportConfig {
        provider: Provider::ConstantContact,
        vip_list,
        openers_dir: openers,
    }
}

#[test]
fn test_mailchimp_slots_follow_filename_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = mailchimp_fixture(dir.path());

    let report = generate_provider_report(&config).unwrap();
    assert_eq!(report.download.file_name, "Email_Opens_Report_for_VIPs.xlsx");
    let table = read_back(dir.path(), "mc.xlsx", &report.download.bytes);

    // a..j feed Campaign 1..10, k is the 11th file and ignored
    assert_eq!(opened_slots(&table, "ann@x.com"), (1..=10).collect::<Vec<_>>());
    assert_eq!(opened_slots(&table, "bob@x.com"), vec![1, 3, 10]);
    assert!(opened_slots(&table, "dee@x.com").is_empty());
    assert!(opened_slots(&table, "cy@x.com").is_empty());
    assert_eq!(total_opens(&table, "cy@x.com"), 0.0);
    assert_eq!(total_opens(&table, "dee@x.com"), 0.0);
}

#[test]
fn test_total_opens_matches_markers() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();

    for table in [report.table.clone(), read_back(dir.path(), "mc.xlsx", &report.download.bytes)] {
        for row in &table.rows {
            let email = row[0].to_string();
            assert_eq!(
                total_opens(&table, &email),
                opened_slots(&table, &email).len() as f64,
                "{email}"
            );
        }
    }
}

#[test]
fn test_unmatched_openers_add_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    assert_eq!(report.table.len(), 4);
    let emails_col = report.table.column_index("Email Address").unwrap();
    assert!(report
        .table
        .rows
        .iter()
        .all(|r| r[emails_col].to_string() != "stranger@x.com"));
}

#[test]
fn test_report_rows_sorted_by_total_opens() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    let table = read_back(dir.path(), "mc.xlsx", &report.download.bytes);

    let emails: Vec<String> = table.rows.iter().map(|r| r[0].to_string()).collect();
    // Ties keep VIP list order: cy before dee
    assert_eq!(emails, vec!["ann@x.com", "bob@x.com", "cy@x.com", "dee@x.com"]);
    assert_eq!(table.get(0, "ESP"), Some(&Cell::text("Mailchimp")));
    assert_eq!(table.get(1, "First Name"), Some(&Cell::text("Bob")));
    assert_eq!(table.get(1, "TAGS"), Some(&Cell::text("board")));
}

#[test]
fn test_report_column_layout() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    let table = read_back(dir.path(), "mc.xlsx", &report.download.bytes);

    let mut expected = vec![
        "Email Address".to_string(),
        "First Name".to_string(),
        "Last Name".to_string(),
        "TAGS".to_string(),
    ];
    expected.extend((1..=10).map(|n| format!("Campaign {n}")));
    expected.push("Total Opens".to_string());
    expected.push("ESP".to_string());
    assert_eq!(table.columns, expected);
}

#[test]
fn test_constant_contact_report_uses_canonical_columns() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&constant_contact_fixture(dir.path())).unwrap();
    assert_eq!(report.download.file_name, "CC_Email_Opens_Report_for_VIPs.xlsx");

    let table = report.table;
    assert_eq!(&table.columns[..4], &["Email Address", "First Name", "Last Name", "TAGS"]);
    assert_eq!(opened_slots(&table, "eve@y.com"), vec![1]);
    assert_eq!(opened_slots(&table, "fay@y.com"), vec![1, 2]);
    assert_eq!(table.get(0, "ESP"), Some(&Cell::text("Constant Contact")));
}

#[test]
fn test_master_merge_stacks_both_reports() {
    let dir = tempfile::tempdir().unwrap();
    let mc = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    let cc = generate_provider_report(&constant_contact_fixture(dir.path())).unwrap();
    assert_eq!(mc.table.columns, cc.table.columns);

    let master = generate_master_report(Some(&mc), Some(&cc)).unwrap();
    assert_eq!(master.file_name, "Master_VIP_Report.xlsx");
    let table = read_back(dir.path(), "master.xlsx", &master.bytes);

    assert_eq!(table.len(), mc.table.len() + cc.table.len());
    assert_eq!(table.columns, mc.table.columns);
    assert_eq!(total_opens(&table, "ann@x.com"), 10.0);
    assert_eq!(total_opens(&table, "fay@y.com"), 2.0);
    let esp = table.column_index("ESP").unwrap();
    let fay = row_for(&table, "fay@y.com");
    assert_eq!(fay[esp], Cell::text("Constant Contact"));
}

#[test]
fn test_master_from_report_files() {
    let dir = tempfile::tempdir().unwrap();
    let mc = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    let cc = generate_provider_report(&constant_contact_fixture(dir.path())).unwrap();
    let mc_path: PathBuf = dir.path().join(mc.download.file_name);
    let cc_path: PathBuf = dir.path().join(cc.download.file_name);
    mc.download.save(&mc_path).unwrap();
    cc.download.save(&cc_path).unwrap();

    let master = generate_master_from_files(&MasterReportConfig {
        mailchimp_report: mc_path,
        constant_contact_report: cc_path,
    })
    .unwrap();
    let table = read_back(dir.path(), "master.xlsx", &master.bytes);
    assert_eq!(table.len(), 6);
    let emails: Vec<String> = table.rows.iter().map(|r| r[0].to_string()).collect();
    assert_eq!(emails[0], "ann@x.com");
    assert_eq!(emails[1], "bob@x.com");
}

#[test]
fn test_reformatting_a_report_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate_provider_report(&mailchimp_fixture(dir.path())).unwrap();
    let first = read_back(dir.path(), "first.xlsx", &report.download.bytes);

    let bytes = format_report(&first).unwrap();
    let second = read_back(dir.path(), "second.xlsx", &bytes);
    assert_eq!(first, second);
}

#[test]
fn test_vip_list_without_email_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = mailchimp_fixture(dir.path());
    write_vip_list(&config.vip_list, &["Email", "First Name"], &[&["ann@x.com", "Ann"]]);

    match generate_provider_report(&config) {
        Err(ReportError::MissingColumn { column, .. }) => assert_eq!(column, "Email Address"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn test_opener_file_without_email_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = mailchimp_fixture(dir.path());
    std::fs::write(config.openers_dir.join("b-blast.csv"), "Email,Opens\nann@x.com,1\n").unwrap();

    let err = generate_provider_report(&config).unwrap_err();
    assert!(matches!(err, ReportError::MissingColumn { .. }));
}
