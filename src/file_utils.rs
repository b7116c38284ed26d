use std::error::Error;
use std::path::Path;

/// Tamaño del archivo en bytes
pub fn get_file_size(path: &str) -> Result<u64, Box<dyn Error>> {
    Ok(std::fs::metadata(path)?.len())
}

/// Formatea bytes en formato legible (KB, MB, GB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

    match UNITS.iter().find(|(_, size)| bytes >= *size) {
        Some((unit, size)) => format!("{:.2} {}", bytes as f64 / *size as f64, unit),
        None => format!("{} bytes", bytes),
    }
}

/// ✅ `true` si entrada y salida son el mismo archivo. Reescribir en el lugar
/// está permitido (la entrada se lee completa antes de crear la salida),
/// pero la cabecera original se pierde.
pub fn is_same_file(input: &str, output: &str) -> bool {
    match (Path::new(input).canonicalize(), Path::new(output).canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
