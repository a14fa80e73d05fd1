//! Output formatters for bundling and listing results.

pub mod human;
pub mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::cli::pack::PackSummary;
use dtsweave_core::ListReport;
use std::path::Path;

/// Trait for formatting run results
pub trait Formatter {
    /// Format and print a list report; paths are shown relative to `root`
    fn format_list(&self, report: &ListReport, root: &Path);

    /// Format and print the summary of a bundling run
    fn format_pack(&self, summary: &PackSummary);
}

impl Formatter for HumanFormatter {
    fn format_list(&self, report: &ListReport, root: &Path) {
        human::print_list(report, root);
    }

    fn format_pack(&self, summary: &PackSummary) {
        human::print_pack(summary);
    }
}

impl Formatter for JsonFormatter {
    fn format_list(&self, report: &ListReport, _root: &Path) {
        json::print_json(report);
    }

    fn format_pack(&self, summary: &PackSummary) {
        json::print_json(summary);
    }
}
