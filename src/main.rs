use std::env;
use std::error::Error;

// Módulos locales
mod progress;
mod file_utils;
mod models;
mod commands;

use commands::CommandArgs;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        help();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "jlc" => {
            commands::header_ops::convert_to_jlc(&args)?;
        },
        "rename_header" => {
            commands::header_ops::rename_header(&args)?;
        },
        "inspect" => {
            commands::inspection::inspect(&args)?;
        },
        "presets" => {
            let cmd = CommandArgs::parse(&args);
            if let Some(flag) = cmd.unknown_flag(&["--json"]) {
                eprintln!("❌ Unknown flag: {}", flag);
                eprintln!("Usage: centroid_tools presets [--json]");
                return Ok(());
            }
            list_presets(cmd.has_flag("--json"))?;
        },
        "version" | "--version" => {
            version();
        },
        "help" | "--help" => {
            help();
        },
        _ => {
            eprintln!("Unknown command: {}", command);
            help();
        }
    }

    Ok(())
}

fn list_presets(json: bool) -> Result<(), Box<dyn Error>> {
    let presets = models::available_presets();

    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    println!("Header presets:");
    for preset in presets {
        println!("  {:<8} {}", preset.name, preset.description);
        println!("           {}", preset.columns.join(", "));
    }
    Ok(())
}

/// ✅ Versión y fecha de compilación inyectadas por build.rs
fn version() {
    println!(
        "centroid_tools v{} (built {}, {})",
        env!("CENTROID_TOOLS_VERSION"),
        env!("BUILD_DATE"),
        env!("TARGET")
    );
}

fn help() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Centroid Tools - pick-and-place header conversion           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Commands:");
    println!("  jlc <input.csv> <output.csv> [--lf] [--json]");
    println!("    Replace the header row with the JLCPCB CPL header:");
    println!("    Designator, Val, Package, Mid X, Mid Y, Rotation, Layer");
    println!();
    println!("  rename_header <input.csv> <output.csv> <preset|col1,col2,...> [--lf] [--json]");
    println!("    Replace the header row with a preset or a comma separated list");
    println!("    - Data rows are copied unchanged");
    println!("    - Header width is not checked against the data rows");
    println!("    - An empty input produces an empty output");
    println!("    - Blank lines and non UTF-8 cells are copied as they are");
    println!();
    println!("  inspect <input.csv>");
    println!("    Show the header, row count and field widths of a CSV file");
    println!();
    println!("  presets [--json]");
    println!("    List the built-in header presets");
    println!();
    println!("  version");
    println!();
    println!("FLAGS:");
    println!("  --lf     Write \\n line endings instead of \\r\\n");
    println!("  --json   Print the result as JSON instead of the report");
    println!("  --       Everything after it is positional (header lists starting with --)");
    println!();
    println!("EXAMPLES:");
    println!();
    println!("  # KiCad position export to JLCPCB upload");
    println!("  centroid_tools jlc Tiny4FSK-top-pos.csv centroid.csv");
    println!();
    println!("  # Back to KiCad column names");
    println!("  centroid_tools rename_header centroid.csv top-pos.csv kicad");
    println!();
    println!("  # Custom header");
    println!("  centroid_tools rename_header in.csv out.csv \"Designator,Footprint,Mid X,Mid Y,Layer,Rotation\"");
}
