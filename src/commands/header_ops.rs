use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use csv::{ByteRecord, ReaderBuilder, Terminator, WriterBuilder};
use serde::Serialize;

use crate::commands::CommandArgs;
use crate::file_utils::is_same_file;
use crate::models::{resolve_header, HeaderPreset, DEFAULT_PRESET};
use crate::progress::ProgressTracker;

const PROGRESS_INTERVAL: u64 = 10_000;
const REWRITE_FLAGS: [&str; 2] = ["--lf", "--json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`, what the JLCPCB upload and most spreadsheet tools produce
    #[default]
    Crlf,
    Lf,
}

impl LineEnding {
    fn terminator(self) -> Terminator {
        match self {
            LineEnding::Crlf => Terminator::CRLF,
            LineEnding::Lf => Terminator::Any(b'\n'),
        }
    }

    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Crlf => b"\r\n",
            LineEnding::Lf => b"\n",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    pub line_ending: LineEnding,
    /// Sin línea de progreso (salida `--json`)
    pub quiet: bool,
}

/// Outcome of one header rewrite
#[derive(Debug, Clone, Serialize)]
pub struct RewriteSummary {
    pub input: String,
    pub output: String,
    pub rows_written: usize,
    pub data_rows: usize,
    pub original_header: Option<Vec<String>>,
    pub new_header: Vec<String>,
    pub header_replaced: bool,
    pub completed_at: String,
}

/// Reads every row, the first one included, as raw bytes (cells need not be UTF-8).
/// Rows may differ in length. Blank lines are kept as zero-field rows.
pub fn read_rows<R: Read>(mut reader: R) -> Result<Vec<ByteRecord>, Box<dyn Error>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_slice());

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    let mut last_end = 0usize;

    // ✅ El lector csv salta las líneas vacías: se recuperan desde el hueco
    // entre el final del registro anterior y el siguiente registro
    while rdr.read_byte_record(&mut record)? {
        for _ in 0..count_blank_lines(&data, last_end) {
            rows.push(ByteRecord::new());
        }
        rows.push(record.clone());
        last_end = rdr.position().byte() as usize;
    }

    // Líneas vacías al final del archivo
    for _ in 0..count_blank_lines(&data, last_end) {
        rows.push(ByteRecord::new());
    }

    Ok(rows)
}

/// Line terminators (`\r\n`, `\r` or `\n`) directly at `start`
fn count_blank_lines(data: &[u8], start: usize) -> usize {
    let mut i = start;

    // "\n" pendiente de un "\r\n" cuyo "\r" cerró el registro anterior
    if i > 0 && data.get(i - 1) == Some(&b'\r') && data.get(i) == Some(&b'\n') {
        i += 1;
    }

    let mut count = 0;
    loop {
        match data.get(i) {
            Some(b'\r') => {
                i += if data.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                count += 1;
            }
            Some(b'\n') => {
                i += 1;
                count += 1;
            }
            _ => break,
        }
    }
    count
}

/// Replaces the first row with `new_header` and returns the row it replaced.
/// An empty table is left empty.
pub fn replace_header(rows: &mut [ByteRecord], new_header: &[String]) -> Option<ByteRecord> {
    rows.first_mut()
        .map(|first| std::mem::replace(first, ByteRecord::from(new_header)))
}

/// Writes all rows, quoting only where needed. Returns the number of rows written.
pub fn write_rows<W: Write>(
    mut writer: W,
    rows: &[ByteRecord],
    line_ending: LineEnding,
    mut progress: Option<&mut ProgressTracker>,
) -> Result<usize, Box<dyn Error>> {
    let mut written: u64 = 0;

    // Una fila sin campos (línea vacía o cabecera vacía) es solo el terminador;
    // csv::Writer la escribiría como `""`
    for (i, chunk) in rows.split(|r| r.is_empty()).enumerate() {
        if i > 0 {
            writer.write_all(line_ending.as_bytes())?;
            written += 1;
            if let Some(tracker) = progress.as_deref_mut() {
                tracker.update(written);
            }
        }

        // flexible: la cabecera nueva puede no tener el ancho de las filas de datos
        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .terminator(line_ending.terminator())
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(&mut writer);

        for record in chunk {
            wtr.write_byte_record(record)?;
            written += 1;
            if let Some(tracker) = progress.as_deref_mut() {
                tracker.update(written);
            }
        }
        wtr.flush()?;
    }

    writer.flush()?;
    Ok(rows.len())
}

/// Header cells as text, for reports
pub fn header_text(record: &ByteRecord) -> Vec<String> {
    record.iter().map(|c| String::from_utf8_lossy(c).into_owned()).collect()
}

/// Reads `input_path`, swaps its header row for `new_header` and writes the
/// table to `output_path`. The input is read completely and closed before the
/// output is created, so a missing input never leaves an output file behind.
pub fn rewrite_header(
    input_path: &str,
    output_path: &str,
    new_header: &[String],
    options: &RewriteOptions,
) -> Result<RewriteSummary, Box<dyn Error>> {
    let mut rows = {
        let input_file = File::open(input_path)?;
        read_rows(input_file)?
    };

    let data_rows = rows.len().saturating_sub(1);
    let original_header = replace_header(&mut rows, new_header);

    let output_file = File::create(output_path)?;
    let rows_written = if options.quiet {
        write_rows(BufWriter::new(output_file), &rows, options.line_ending, None)?
    } else {
        let mut progress = ProgressTracker::new(PROGRESS_INTERVAL);
        let written = write_rows(
            BufWriter::new(output_file),
            &rows,
            options.line_ending,
            Some(&mut progress),
        )?;
        progress.finish();
        written
    };

    Ok(RewriteSummary {
        input: input_path.to_string(),
        output: output_path.to_string(),
        rows_written,
        data_rows,
        header_replaced: original_header.is_some(),
        original_header: original_header.as_ref().map(header_text),
        new_header: new_header.to_vec(),
        completed_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

fn options_from_flags(cmd: &CommandArgs) -> RewriteOptions {
    RewriteOptions {
        line_ending: if cmd.has_flag("--lf") { LineEnding::Lf } else { LineEnding::Crlf },
        quiet: cmd.has_flag("--json"),
    }
}

fn run_rewrite(
    cmd: &CommandArgs,
    input_path: &str,
    output_path: &str,
    new_header: &[String],
) -> Result<(), Box<dyn Error>> {
    let options = options_from_flags(cmd);
    let json = cmd.has_flag("--json");

    if !json {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║  Centroid Header Rewrite                                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!("📄 Input:  {}", input_path);
        println!("📄 Output: {}", output_path);
        println!("📋 Header: {}", new_header.join(", "));
        if is_same_file(input_path, output_path) {
            eprintln!("⚠️  Output is the input file: the original header will be overwritten");
        }
        println!();
    }

    let summary = rewrite_header(input_path, output_path, new_header, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RewriteSummary) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Rewrite Summary                                             ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    match &summary.original_header {
        Some(original) => {
            println!("🔁 Old header: {}", original.join(", "));
            println!("✅ New header: {}", summary.new_header.join(", "));
            if original.len() != summary.new_header.len() {
                eprintln!(
                    "⚠️  Header width changed: {} -> {} columns (data rows untouched)",
                    original.len(),
                    summary.new_header.len()
                );
            }
        }
        None => println!("ℹ️  Input is empty: no header to replace"),
    }
    println!("📊 Data rows:    {}", summary.data_rows);
    println!("📊 Rows written: {}", summary.rows_written);
    println!("📄 Output file:  {}", summary.output);
    println!();
}

const JLC_USAGE: &str = "Usage: centroid_tools jlc <input.csv> <output.csv> [--lf] [--json]";
const RENAME_USAGE: &str =
    "Usage: centroid_tools rename_header <input.csv> <output.csv> <preset|col1,col2,...> [--lf] [--json]";

/// `jlc <input.csv> <output.csv> [--lf] [--json]`
pub fn convert_to_jlc(args: &[String]) -> Result<(), Box<dyn Error>> {
    let cmd = CommandArgs::parse(args);
    if let Some(flag) = cmd.unknown_flag(&REWRITE_FLAGS) {
        eprintln!("❌ Unknown flag: {}", flag);
        eprintln!("{}", JLC_USAGE);
        return Ok(());
    }
    if cmd.positional.len() != 2 {
        eprintln!("{}", JLC_USAGE);
        return Ok(());
    }

    let preset = HeaderPreset::from_name(DEFAULT_PRESET)
        .ok_or_else(|| format!("Missing built-in preset '{}'", DEFAULT_PRESET))?;

    run_rewrite(&cmd, cmd.positional[0], cmd.positional[1], &preset.columns_owned())
}

/// `rename_header <input.csv> <output.csv> <preset|col1,col2,...> [--lf] [--json]`
pub fn rename_header(args: &[String]) -> Result<(), Box<dyn Error>> {
    let cmd = CommandArgs::parse(args);
    if let Some(flag) = cmd.unknown_flag(&REWRITE_FLAGS) {
        eprintln!("❌ Unknown flag: {}", flag);
        eprintln!("{}", RENAME_USAGE);
        eprintln!("💡 Use `--` before a header list that starts with `--`");
        return Ok(());
    }
    if cmd.positional.len() != 3 {
        eprintln!("{}", RENAME_USAGE);
        return Ok(());
    }

    let new_header = resolve_header(cmd.positional[2]);
    run_rewrite(&cmd, cmd.positional[0], cmd.positional[1], &new_header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn rows_as_vecs(rows: &[ByteRecord]) -> Vec<Vec<String>> {
        rows.iter().map(header_text).collect()
    }

    fn quiet() -> RewriteOptions {
        RewriteOptions { quiet: true, ..Default::default() }
    }

    /// read → replace → write, all in memory
    fn rewrite_bytes(input: &[u8], new_header: &[&str], line_ending: LineEnding) -> Vec<u8> {
        let mut rows = read_rows(Cursor::new(input.to_vec())).unwrap();
        replace_header(&mut rows, &header(new_header));
        let mut out = Vec::new();
        write_rows(&mut out, &rows, line_ending, None).unwrap();
        out
    }

    #[test]
    fn test_replace_header_keeps_data_rows() {
        let mut rows = read_rows(Cursor::new("X,Y,Rot\nR1,0603,90\nC2,0402,0\n")).unwrap();
        let old = replace_header(&mut rows, &header(&["Designator", "Val", "Rotation"]));

        assert_eq!(header_text(&old.unwrap()), header(&["X", "Y", "Rot"]));
        assert_eq!(
            rows_as_vecs(&rows),
            vec![
                header(&["Designator", "Val", "Rotation"]),
                header(&["R1", "0603", "90"]),
                header(&["C2", "0402", "0"]),
            ]
        );
    }

    #[test]
    fn test_replace_header_on_empty_table() {
        let mut rows: Vec<ByteRecord> = Vec::new();
        assert!(replace_header(&mut rows, &header(&["Designator"])).is_none());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_shorter_header_is_passed_through() {
        let out = rewrite_bytes(b"a,b,c\n1,2,3\n4,5,6\n", &["H1", "H2"], LineEnding::Lf);
        assert_eq!(out, b"H1,H2\n1,2,3\n4,5,6\n".to_vec());
    }

    #[test]
    fn test_longer_header_is_passed_through() {
        let out = rewrite_bytes(b"a,b\n1,2\n", &["H1", "H2", "H3", "H4"], LineEnding::Lf);
        assert_eq!(out, b"H1,H2,H3,H4\n1,2\n".to_vec());
    }

    #[test]
    fn test_leading_blank_line_is_the_header() {
        let out = rewrite_bytes(b"\nR1,0603,90\nC2,0402,0\n", &["Designator"], LineEnding::Crlf);
        assert_eq!(out, b"Designator\r\nR1,0603,90\r\nC2,0402,0\r\n".to_vec());
    }

    #[test]
    fn test_blank_lines_between_rows_are_kept() {
        let out = rewrite_bytes(b"X,Y\n\nR1,1\n", &["A", "B"], LineEnding::Crlf);
        assert_eq!(out, b"A,B\r\n\r\nR1,1\r\n".to_vec());

        let rows = read_rows(Cursor::new("X,Y\r\n\r\nR1,1\r\n\r\n")).unwrap();
        let widths: Vec<usize> = rows.iter().map(|r| r.len()).collect();
        assert_eq!(widths, vec![2, 0, 2, 0]);
    }

    #[test]
    fn test_quoted_newline_is_not_a_blank_line() {
        let rows = read_rows(Cursor::new("Ref,Val\n\"R1\n\",10k\nR2,1k\n")).unwrap();
        let widths: Vec<usize> = rows.iter().map(|r| r.len()).collect();
        assert_eq!(widths, vec![2, 2, 2]);
    }

    #[test]
    fn test_empty_header_writes_bare_terminator() {
        let out = rewrite_bytes(b"a\nR1,1\n", &[], LineEnding::Crlf);
        assert_eq!(out, b"\r\nR1,1\r\n".to_vec());
    }

    #[test]
    fn test_non_utf8_cells_are_copied_byte_for_byte() {
        let out = rewrite_bytes(b"Ref,Val\nC1,10\xb5F\n", &["Designator", "Val"], LineEnding::Lf);
        assert_eq!(out, b"Designator,Val\nC1,10\xb5F\n".to_vec());
    }

    #[test]
    fn test_ragged_input_is_read() {
        let rows = read_rows(Cursor::new("a,b,c\n1\n1,2,3,4\n")).unwrap();
        let widths: Vec<usize> = rows.iter().map(|r| r.len()).collect();
        assert_eq!(widths, vec![3, 1, 4]);
    }

    #[test]
    fn test_write_rows_quotes_only_when_needed() {
        let rows = vec![
            ByteRecord::from(vec!["Designator", "Val"]),
            ByteRecord::from(vec!["C1", "100nF, 50V"]),
        ];
        let mut out = Vec::new();
        let written = write_rows(&mut out, &rows, LineEnding::Crlf, None).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Designator,Val\r\nC1,\"100nF, 50V\"\r\n"
        );
    }

    #[test]
    fn test_rewrite_header_file_scenario() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("Tiny4FSK-top-pos.csv");
        let output = dir.path().join("centroid.csv");
        fs::write(&input, "X,Y,Rot\r\nR1,0603,90\r\nC2,0402,0\r\n").unwrap();

        let summary = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["Designator", "Val", "Rotation"]),
            &quiet(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Designator,Val,Rotation\r\nR1,0603,90\r\nC2,0402,0\r\n"
        );
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.data_rows, 2);
        assert!(summary.header_replaced);
        assert_eq!(summary.original_header, Some(header(&["X", "Y", "Rot"])));
        // entrada intacta
        assert_eq!(
            fs::read_to_string(&input).unwrap(),
            "X,Y,Rot\r\nR1,0603,90\r\nC2,0402,0\r\n"
        );
    }

    #[test]
    fn test_rewrite_kicad_export_to_jlc() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("board-top-pos.csv");
        let output = dir.path().join("centroid.csv");
        fs::write(
            &input,
            "Ref,Val,Package,PosX,PosY,Rot,Side\n\
             \"C1\",\"100n\",\"C_0402_1005Metric\",104.5,-62.25,90.0,top\n\
             \"U1\",\"Si4063\",\"QFN-20-1EP_4x4mm_P0.5mm\",110.0,-70.0,180.0,top\n",
        )
        .unwrap();

        let jlc = HeaderPreset::from_name("jlcpcb").unwrap().columns_owned();
        rewrite_header(input.to_str().unwrap(), output.to_str().unwrap(), &jlc, &quiet()).unwrap();

        let out = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(lines[0], "Designator,Val,Package,Mid X,Mid Y,Rotation,Layer");
        assert_eq!(lines[1], "C1,100n,C_0402_1005Metric,104.5,-62.25,90.0,top");
        assert_eq!(lines[2], "U1,Si4063,QFN-20-1EP_4x4mm_P0.5mm,110.0,-70.0,180.0,top");
        assert_eq!(lines[3], "");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_rewrite_non_utf8_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("cp1252.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, b"Ref,Val\r\nC3,4.7\xb5F\r\n").unwrap();

        let summary = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["Designator", "Val"]),
            &quiet(),
        )
        .unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"Designator,Val\r\nC3,4.7\xb5F\r\n".to_vec());
        assert_eq!(summary.data_rows, 1);
    }

    #[test]
    fn test_rewrite_empty_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "").unwrap();

        let summary = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["Designator", "Val"]),
            &quiet(),
        )
        .unwrap();

        assert_eq!(fs::read(&output).unwrap().len(), 0);
        assert_eq!(summary.rows_written, 0);
        assert_eq!(summary.data_rows, 0);
        assert!(!summary.header_replaced);
        assert!(summary.original_header.is_none());
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let once = dir.path().join("once.csv");
        let twice = dir.path().join("twice.csv");
        fs::write(&input, "Ref,Val\nR1,10k\n\nR2,\"1k, 1%\"\n").unwrap();
        let new_header = header(&["Designator", "Val"]);

        rewrite_header(input.to_str().unwrap(), once.to_str().unwrap(), &new_header, &quiet()).unwrap();
        rewrite_header(once.to_str().unwrap(), twice.to_str().unwrap(), &new_header, &quiet()).unwrap();

        assert_eq!(fs::read(&once).unwrap(), fs::read(&twice).unwrap());
    }

    #[test]
    fn test_rewrite_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pos.csv");
        fs::write(&path, "Ref,Val\nR1,10k\n").unwrap();
        let p = path.to_str().unwrap();

        rewrite_header(p, p, &header(&["Designator", "Val"]), &quiet()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Designator,Val\r\nR1,10k\r\n");
    }

    #[test]
    fn test_lf_line_ending() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "a\r\n1\r\n").unwrap();

        let options = RewriteOptions { line_ending: LineEnding::Lf, quiet: true };
        rewrite_header(input.to_str().unwrap(), output.to_str().unwrap(), &header(&["A"]), &options).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "A\n1\n");
    }

    #[test]
    fn test_missing_input_does_not_create_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("missing.csv");
        let output = dir.path().join("out.csv");

        let result = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["Designator"]),
            &quiet(),
        );
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "a\n1\n").unwrap();
        let output = dir.path().join("no_such_dir").join("out.csv");

        let result = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["A"]),
            &quiet(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_flag_does_not_write_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "a\n1\n").unwrap();

        let args = header(&[
            "centroid_tools",
            "jlc",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--LF",
        ]);
        convert_to_jlc(&args).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_summary_serializes() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "a,b\n1,2\n").unwrap();

        let summary = rewrite_header(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &header(&["A", "B"]),
            &quiet(),
        )
        .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows_written"], 2);
        assert_eq!(json["new_header"][1], "B");
        assert_eq!(json["original_header"][0], "a");
    }
}
