//! Output formatting for CLI
//!
//! Tables, JSON and YAML go to stdout. Status lines go to stdout too, except
//! errors, which go to stderr.

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Unknown names fall back to a table
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }
}

/// Print rows as a table, or the structured value as JSON/YAML
pub fn print_report<T, S>(rows: Vec<T>, structured: &S, format: OutputFormat) -> anyhow::Result<()>
where
    T: Tabled,
    S: Serialize,
{
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Json => print_json(structured)?,
        OutputFormat::Yaml => print_yaml(structured)?,
    }
    Ok(())
}

pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "Nothing to show".yellow());
        return;
    }

    println!("{}", Table::new(rows));
}

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn print_yaml<T: Serialize>(data: &T) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(data)?);
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Render an optional cell, `-` when absent
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("YAML"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_str("yml"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_str("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("wide"), OutputFormat::Table);
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("Bound")), "Bound");
        assert_eq!(or_dash(None), "-");
    }
}
