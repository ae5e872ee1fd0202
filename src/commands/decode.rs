use anyhow::{Context, Result};
use chromelogger::{Payload, Row, RowType};
use colored::Colorize;
use std::io::{self, Read};

/// Execute the decode command
///
/// Prints the rows of a captured header the way the browser console would
/// nest them
pub fn execute(header: Option<String>) -> Result<()> {
    let header = match header {
        Some(header) => header,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read header from stdin")?;
            buf
        }
    };

    let payload = Payload::decode(&header)?;

    println!(
        "{} {} ({} rows)",
        "chromelogger payload".bold(),
        payload.version,
        payload.rows.len()
    );

    for line in render_rows(&payload.rows) {
        println!("{}", line);
    }

    Ok(())
}

/// One line per row, indented by group depth
fn render_rows(rows: &[Row]) -> Vec<String> {
    let mut depth = 0usize;
    let mut lines = Vec::with_capacity(rows.len());

    for row in rows {
        if row.kind == RowType::GroupEnd {
            depth = depth.saturating_sub(1);
            continue;
        }

        let args = row
            .args
            .iter()
            .map(|arg| match arg {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");

        let text = match row.kind {
            RowType::Info => args.blue().to_string(),
            RowType::Warn => args.yellow().to_string(),
            RowType::Error => args.red().to_string(),
            RowType::Group | RowType::GroupCollapsed => format!("▸ {}", args.bold()),
            _ => args,
        };

        let mut line = format!("{}{}", "  ".repeat(depth), text);
        if !row.backtrace.is_empty() {
            line.push_str(&format!("  {}", row.backtrace.dimmed()));
        }
        lines.push(line);

        if matches!(row.kind, RowType::Group | RowType::GroupCollapsed) {
            depth += 1;
        }
    }

    lines
}
