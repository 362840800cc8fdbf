//! Terminal rendering for command results.

use std::fmt::Display;

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// `--format` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    /// Machine-readable, for scripts.
    Json,
}

/// Rows as a table, or as a JSON array.
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(items),
        OutputFormat::Table if items.is_empty() => println!("(no rows)"),
        OutputFormat::Table => {
            let mut table = Table::new(items);
            table.with(Style::sharp());
            println!("{table}");
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => print_error(&format!("cannot render JSON: {e}")),
    }
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

pub fn print_warning(msg: &str) {
    eprintln!("! {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Aligned `key  value` line for detail views.
pub fn print_kv(key: &str, value: impl Display) {
    println!("{key:>16}  {value}");
}
