use std::error::Error;
use std::fs::File;

use crate::commands::header_ops::{header_text, read_rows};
use crate::commands::CommandArgs;
use crate::file_utils::{format_bytes, get_file_size};
use crate::models::matching_preset;

/// Forma de un CSV, leído sin modificarlo
#[derive(Debug, Clone, PartialEq)]
pub struct CsvInspection {
    pub header: Option<Vec<String>>,
    pub data_rows: usize,
    /// Filas de datos sin campos (líneas vacías)
    pub blank_rows: usize,
    pub min_fields: usize,
    pub max_fields: usize,
    pub file_size: u64,
}

impl CsvInspection {
    /// ✅ Filas de datos (sin contar líneas vacías) con distinto ancho entre sí o respecto a la cabecera
    pub fn is_ragged(&self) -> bool {
        let header_len = self.header.as_ref().map(|h| h.len());
        if self.data_rows == self.blank_rows {
            return false;
        }
        self.min_fields != self.max_fields || header_len != Some(self.min_fields)
    }
}

pub fn inspect_csv(path: &str) -> Result<CsvInspection, Box<dyn Error>> {
    let rows = read_rows(File::open(path)?)?;
    let file_size = get_file_size(path)?;

    let header = rows.first().map(header_text);
    // Las líneas vacías no cuentan para el rango de anchos
    let data = rows.iter().skip(1).filter(|r| !r.is_empty());
    let min_fields = data.clone().map(|r| r.len()).min().unwrap_or(0);
    let max_fields = data.map(|r| r.len()).max().unwrap_or(0);
    let blank_rows = rows.iter().skip(1).filter(|r| r.is_empty()).count();

    Ok(CsvInspection {
        header,
        data_rows: rows.len().saturating_sub(1),
        blank_rows,
        min_fields,
        max_fields,
        file_size,
    })
}

/// `inspect <input.csv>`
pub fn inspect(args: &[String]) -> Result<(), Box<dyn Error>> {
    let cmd = CommandArgs::parse(args);
    if let Some(flag) = cmd.unknown_flag(&[]) {
        eprintln!("❌ Unknown flag: {}", flag);
        eprintln!("Usage: centroid_tools inspect <input.csv>");
        return Ok(());
    }
    if cmd.positional.len() != 1 {
        eprintln!("Usage: centroid_tools inspect <input.csv>");
        return Ok(());
    }
    let path = cmd.positional[0];
    let report = inspect_csv(path)?;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Centroid File Inspection                                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("📄 File: {} ({})", path, format_bytes(report.file_size));

    match &report.header {
        Some(header) => {
            println!("🔢 Header columns: {}", header.len());
            for (i, h) in header.iter().enumerate() {
                println!("   [{}] {}", i, h);
            }
            match matching_preset(header) {
                Some(name) => println!("📋 Matches preset: {}", name),
                None => println!("📋 Matches preset: (none)"),
            }
        }
        None => println!("ℹ️  File is empty"),
    }

    println!("📊 Data rows: {}", report.data_rows);
    if report.data_rows > report.blank_rows {
        println!("📊 Fields per data row: {}..={}", report.min_fields, report.max_fields);
    }
    if report.blank_rows > 0 {
        println!("📊 Blank rows: {} (kept on rewrite)", report.blank_rows);
    }
    if report.is_ragged() {
        eprintln!("⚠️  Rows have differing field counts (passed through unchanged on rewrite)");
    }

    Ok(())
}
