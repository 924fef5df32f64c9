//! Output formatting and styling module.
//!
//! Centralizes all user-facing CLI output: colored status lines, the
//! directory summaries, the category listing and the organize progress bar.

use crate::file_category::FALLBACK_FOLDER;
use crate::file_organizer::{OrganizeReport, PlannedMove};
use crate::merger::MergeReport;
use crate::summary::Summary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the organize run.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Renders a directory summary.
    pub fn summary(summary: &Summary) {
        print!("{}", Self::render_summary(summary));
    }

    /// Text form of a directory summary, numbered like:
    ///
    /// ```text
    /// <<summary>>
    /// Organizing directory: /home/me/Downloads
    /// Total folders: 1
    ///    1) Projects
    /// Total files: 2
    ///    1) .jpg: 2 files
    /// ```
    pub fn render_summary(summary: &Summary) -> String {
        let mut out = format!(
            "\n<<summary>>\nOrganizing directory: {}\nTotal folders: {}\n",
            summary.directory.display(),
            summary.total_folders
        );
        for (i, folder) in summary.folders.iter().enumerate() {
            out.push_str(&format!("   {}) {}\n", i + 1, folder));
        }
        out.push_str(&format!("Total files: {}\n", summary.total_files));
        for (i, (ext, count)) in summary.extensions.iter().enumerate() {
            let label = if ext.is_empty() { "(no extension)" } else { ext.as_str() };
            let word = if *count == 1 { "file" } else { "files" };
            out.push_str(&format!("   {}) {}: {} {}\n", i + 1, label, count, word));
        }
        out
    }

    /// Prints `(category, extensions)` pairs, e.g. from [`CategoryMap::iter`](crate::file_category::CategoryMap::iter).
    pub fn categories<'a, I>(categories: I)
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        println!("Current file type settings:");
        println!("(folder_name: types of files)");
        for (name, extensions) in categories {
            println!("  - {}: {}", name.bold(), extensions.join(", "));
        }
    }

    /// Prints what an organize run would do.
    pub fn plan(plan: &[PlannedMove]) {
        if plan.is_empty() {
            Self::dry_run_notice("Nothing to organize.");
            return;
        }
        Self::header("DRY RUN: entries would be organized as follows:");
        for planned in plan {
            println!(
                " - {} → {}/",
                planned.file_name().to_string_lossy(),
                planned.folder
            );
        }
        Self::dry_run_notice("No files were modified.");
    }

    /// Prints a summary table of an organize run, by destination folder.
    pub fn organize_report(report: &OrganizeReport) {
        Self::header("SUMMARY");

        let counts = report.counts_by_folder();
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let width = counts
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (folder, count) in &counts {
            let label = if folder == FALLBACK_FOLDER {
                folder.italic()
            } else {
                folder.normal()
            };
            println!(
                "{:<width$} | {} {}",
                label,
                count.to_string().green(),
                if *count == 1 { "file" } else { "files" },
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );

        if !report.failures.is_empty() {
            Self::warning(&format!(
                "{} entries could not be moved:",
                report.failures.len()
            ));
            for failure in &report.failures {
                Self::error(&failure.to_string());
            }
        }
    }

    pub fn merge_report(report: &MergeReport) {
        for (folder, _) in &report.folders {
            Self::success(&format!("Merged {}", folder));
        }
        for failure in &report.failures {
            Self::error(&failure.to_string());
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
