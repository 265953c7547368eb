//! Fact normalizers: turn noisy collector strings and byte counts into
//! structured facts the rule evaluators can compare.

use std::{cmp::Ordering, fmt};

use serde::Serialize;

use crate::{
    consts::{BYTES_PER_GB, BYTES_PER_MB},
    error::NormalizationError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorFamily {
    I3,
    I5,
    I7,
    Other,
}

impl fmt::Display for ProcessorFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ProcessorFamily::I3 => "i3",
            ProcessorFamily::I5 => "i5",
            ProcessorFamily::I7 => "i7",
            ProcessorFamily::Other => "other",
        };
        f.write_str(s)
    }
}

/// `generation == 0` means it could not be determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessorFact {
    pub family: ProcessorFamily,
    pub generation: u32,
}

impl ProcessorFact {
    pub const UNKNOWN: ProcessorFact = ProcessorFact {
        family: ProcessorFamily::Other,
        generation: 0,
    };
}

pub trait ProcessorNormalizer {
    fn normalize(&self, processor_name: &str) -> ProcessorFact;
}

/// Family by substring (first match of i7, i5, i3), generation from the
/// first model number found in the name.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringProcessorNormalizer;

impl ProcessorNormalizer for SubstringProcessorNormalizer {
    fn normalize(&self, processor_name: &str) -> ProcessorFact {
        let family = detect_family(processor_name);
        if family == ProcessorFamily::Other {
            return ProcessorFact::UNKNOWN;
        }

        ProcessorFact {
            family,
            generation: extract_generation(processor_name),
        }
    }
}

pub fn detect_family(processor_name: &str) -> ProcessorFamily {
    const PRIORITY: [(&str, ProcessorFamily); 3] = [
        ("i7", ProcessorFamily::I7),
        ("i5", ProcessorFamily::I5),
        ("i3", ProcessorFamily::I3),
    ];

    PRIORITY
        .iter()
        .find(|(marker, _)| processor_name.contains(marker))
        .map(|(_, family)| *family)
        .unwrap_or(ProcessorFamily::Other)
}

/// Model number divided by 1000, e.g. `13700` gives 13.
///
/// The name is split on `i`, `-` and whitespace. The first token that starts
/// with a 4 or 5 digit run is the model number; a trailing suffix such as
/// `K`, `F` or `HX` is ignored. Shorter runs (the digit left over from `i5`,
/// clock speeds like `3.50GHz`) are skipped. Returns 0 when nothing matches.
pub fn extract_generation(processor_name: &str) -> u32 {
    processor_name
        .split(|c: char| c == 'i' || c == '-' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .find_map(model_number)
        .map(|model| model / 1000)
        .unwrap_or(0)
}

fn model_number(token: &str) -> Option<u32> {
    let digits = token.bytes().take_while(u8::is_ascii_digit).count();
    if !(4..=5).contains(&digits) {
        return None;
    }
    token[..digits].parse().ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OsVersionFact {
    pub major: u32,
    pub minor: u32,
}

impl OsVersionFact {
    pub const UNKNOWN: OsVersionFact = OsVersionFact { major: 0, minor: 0 };

    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses the leading dotted-numeric token, e.g. `"10.0.22631"` or
    /// `"11.0.22000 Build 22000"`. A single component means minor 0.
    pub fn parse(version: &str) -> Result<Self, NormalizationError> {
        let token = version
            .trim()
            .split(' ')
            .next()
            .filter(|token| !token.is_empty())
            .ok_or(NormalizationError::Empty)?;

        let mut parts = token.split('.');
        let major = parse_component(parts.next())?;
        let minor = match parts.next() {
            Some(part) => parse_component(Some(part))?,
            None => 0,
        };
        for rest in parts {
            parse_component(Some(rest))?;
        }

        Ok(Self { major, minor })
    }
}

fn parse_component(part: Option<&str>) -> Result<u32, NormalizationError> {
    part.filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|p| p.parse().ok())
        .ok_or(NormalizationError::MalformedVersion)
}

impl PartialOrd for OsVersionFact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OsVersionFact {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for OsVersionFact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Truncating conversion used for every threshold comparison.
pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / BYTES_PER_GB
}

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}

pub fn bytes_to_gb_f64(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB as f64
}

/// Two decimals with thousands grouping, e.g. `1,234.56`.
pub fn format_gb(bytes: u64) -> String {
    let hundredths = (bytes_to_gb_f64(bytes) * 100.0).round() as u64;
    let whole = (hundredths / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}.{:02}", grouped, hundredths % 100)
}
