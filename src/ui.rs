use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

use crate::report::CountEntry;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Name")]
    label: String,
}

/// Terminal output for the command layer. Status lines go to stderr so
/// stdout carries only report content.
pub struct UIManager {
    colors_enabled: bool,
    show_progress: bool,
}

impl UIManager {
    pub fn new(colors_enabled: bool, show_progress: bool) -> Self {
        if !colors_enabled {
            colored::control::set_override(false);
        }
        Self {
            colors_enabled,
            show_progress,
        }
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    pub fn print_header(&self, title: &str) {
        let rule = "=".repeat(title.chars().count().max(40));
        println!("\n{}", rule.dimmed());
        println!("{}", title.bold().cyan());
        println!("{}", rule.dimmed());
    }

    pub fn print_section(&self, title: &str) {
        println!("\n{}", title.bold());
    }

    pub fn print_info(&self, message: &str) {
        println!("{}", message);
    }

    pub fn print_success(&self, message: &str) {
        eprintln!("{} {}", "✓".green().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        eprintln!("{} {}", "!".yellow().bold(), message.yellow());
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Progress bar over a known number of files; hidden when progress is off.
    pub fn create_progress(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn count_table(&self, entries: &[CountEntry]) -> String {
        let rows = entries.iter().map(|entry| CountRow {
            count: entry.count,
            label: entry.label.clone(),
        });
        Table::new(rows).with(Style::rounded()).to_string()
    }

    pub fn print_counts(&self, title: &str, entries: &[CountEntry]) {
        self.print_section(title);
        if entries.is_empty() {
            println!("  {}", "(none)".dimmed());
        } else {
            println!("{}", self.count_table(entries));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_table_lists_rows_in_order() {
        let ui = UIManager::new(false, false);
        let table = ui.count_table(&[CountEntry::new("Class", 3), CountEntry::new("Config", 1)]);
        assert!(table.contains("Count"));
        let class_at = table.find("Class").unwrap();
        let config_at = table.find("Config").unwrap();
        assert!(class_at < config_at);
    }

    #[test]
    fn test_hidden_progress_keeps_length() {
        let ui = UIManager::new(false, false);
        let bar = ui.create_progress(7);
        assert_eq!(bar.length(), Some(7));
        bar.inc(2);
        assert_eq!(bar.position(), 2);
    }
}
