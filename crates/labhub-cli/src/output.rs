use colored::Colorize;
use labhub_compendium::{ImportReport, PassStats};
use labhub_results::ResultFile;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::macros::format_description;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Warnings go to stderr so stdout stays clean for decrypted content.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_field(label: &str, value: &str) {
    println!("{}: {}", label.cyan(), value);
}

pub fn print_result_files(files: &[ResultFile]) {
    if files.is_empty() {
        println!("No files found.");
        return;
    }
    println!("{}", result_files_table(files));
    println!("Total: {}", files.len());
}

fn result_files_table(files: &[ResultFile]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Name", "Size", "Modified", "Status"]);
    for file in files {
        builder.push_record([
            file.name.clone(),
            file.size.to_string(),
            file.modified.map(format_time).unwrap_or_else(|| "-".to_string()),
            file.status_label(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn print_import_report(report: &ImportReport) {
    println!("{}", import_report_table(report));
}

fn import_report_table(report: &ImportReport) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Pass",
        "Inserted",
        "Duplicates",
        "Inactive",
        "Invalid",
        "Unknown procedure",
        "Failed",
    ]);
    let row = |name: &str, stats: &PassStats| {
        [
            name.to_string(),
            stats.inserted.to_string(),
            stats.duplicates.to_string(),
            stats.inactive.to_string(),
            stats.invalid.to_string(),
            stats.unknown_procedure.to_string(),
            stats.failed.to_string(),
        ]
    };
    builder.push_record(row("Order codes", &report.order_codes));
    builder.push_record(row("Questions", &report.questions));
    builder.build().with(Style::rounded()).to_string()
}

pub fn format_time(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    at.format(&format).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(datetime!(2024-03-05 07:08:09 UTC)), "2024-03-05 07:08:09");
    }

    #[test]
    fn test_table_lists_every_file() {
        let files = vec![
            ResultFile {
                path: PathBuf::from("/r/a.hl7"),
                name: "a.hl7".into(),
                size: 120,
                modified: Some(datetime!(2024-03-05 07:08:09 UTC)),
                encryption_version: Some(6),
            },
            ResultFile {
                path: PathBuf::from("/r/b.hl7"),
                name: "b.hl7".into(),
                size: 7,
                modified: None,
                encryption_version: None,
            },
        ];
        let table = result_files_table(&files);
        assert!(table.contains("a.hl7"));
        assert!(table.contains("encrypted (v6)"));
        assert!(table.contains("plaintext"));
        assert!(table.contains("2024-03-05 07:08:09"));
    }

    #[test]
    fn test_import_report_table() {
        let report = ImportReport {
            order_codes: PassStats {
                inserted: 12,
                duplicates: 3,
                ..PassStats::default()
            },
            questions: PassStats {
                unknown_procedure: 4,
                ..PassStats::default()
            },
        };
        let table = import_report_table(&report);
        assert!(table.contains("Order codes"));
        assert!(table.contains("12"));
        assert!(table.contains("Unknown procedure"));
    }
}
