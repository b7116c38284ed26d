use std::collections::HashMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Header expected by the JLCPCB assembly upload ("CPL" file)
pub const JLCPCB_COLUMNS: [&str; 7] = [
    "Designator", "Val", "Package", "Mid X", "Mid Y", "Rotation", "Layer",
];

/// Header written by KiCad's footprint position export (CSV variant)
pub const KICAD_COLUMNS: [&str; 7] = [
    "Ref", "Val", "Package", "PosX", "PosY", "Rot", "Side",
];

pub const DEFAULT_PRESET: &str = "jlcpcb";

/// Named replacement header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub columns: Vec<&'static str>,
}

lazy_static! {
    static ref PRESETS: HashMap<&'static str, HeaderPreset> = {
        let mut m = HashMap::new();
        m.insert("jlcpcb", HeaderPreset {
            name: "jlcpcb",
            description: "JLCPCB pick-and-place (CPL) upload",
            columns: JLCPCB_COLUMNS.to_vec(),
        });
        m.insert("kicad", HeaderPreset {
            name: "kicad",
            description: "KiCad footprint position export",
            columns: KICAD_COLUMNS.to_vec(),
        });
        m
    };

    // Comas de un argumento de cabecera, con los espacios alrededor
    static ref HEADER_SEPARATOR: Regex = Regex::new(r"\s*,\s*").unwrap();
}

impl HeaderPreset {
    /// Búsqueda por nombre, sin distinguir mayúsculas
    pub fn from_name(name: &str) -> Option<HeaderPreset> {
        PRESETS.get(name.trim().to_lowercase().as_str()).cloned()
    }

    pub fn columns_owned(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }
}

/// All registered presets, sorted by name
pub fn available_presets() -> Vec<&'static HeaderPreset> {
    let mut presets: Vec<&'static HeaderPreset> = PRESETS.values().collect();
    presets.sort_by_key(|p| p.name);
    presets
}

/// Splits `"Designator, Val ,Package"` into column names.
/// Only whitespace next to a comma (and at the ends) is dropped; inner spaces
/// such as in `Mid X` are kept.
pub fn parse_header_list(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    HEADER_SEPARATOR.split(text).map(|s| s.to_string()).collect()
}

/// Resolves a header argument: a preset name first, otherwise a literal list
pub fn resolve_header(arg: &str) -> Vec<String> {
    match HeaderPreset::from_name(arg) {
        Some(preset) => preset.columns_owned(),
        None => parse_header_list(arg),
    }
}

/// Name of the preset whose columns equal `header` exactly
pub fn matching_preset(header: &[String]) -> Option<&'static str> {
    available_presets()
        .into_iter()
        .find(|p| p.columns.len() == header.len() && p.columns.iter().zip(header).all(|(a, b)| *a == b.as_str()))
        .map(|p| p.name)
}
