//! Algorithm name classification.
//!
//! Maps KEM names as they appear in the benchmark data (e.g. `Kyber768`,
//! `FrodoKEM-976-AES`, `Classic-McEliece-348864f`) to families, NIST security
//! levels and chart colors, and provides the predicates used by the view filters.

use serde::{Deserialize, Serialize};

/// Name marker for reference (unoptimized) implementations.
pub const REFERENCE_MARKER: &str = "-ref";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    Bike,
    ClassicMceliece,
    Frodo,
    Hqc,
    Kyber,
    Ntru,
    NtruPrime,
    Saber,
    Sike,
    Other,
}

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Bike,
        Family::ClassicMceliece,
        Family::Frodo,
        Family::Hqc,
        Family::Kyber,
        Family::Ntru,
        Family::NtruPrime,
        Family::Saber,
        Family::Sike,
        Family::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Family::Bike => "BIKE",
            Family::ClassicMceliece => "Classic McEliece",
            Family::Frodo => "FrodoKEM",
            Family::Hqc => "HQC",
            Family::Kyber => "Kyber",
            Family::Ntru => "NTRU",
            Family::NtruPrime => "NTRU Prime",
            Family::Saber => "Saber",
            Family::Sike => "SIKE",
            Family::Other => "Other",
        }
    }

    /// Classify an algorithm name. Names matching no known family land in `Other`.
    pub fn of(name: &str) -> Family {
        let n = name.to_ascii_lowercase();
        // ntrulpr/sntrup must be checked before the plain NTRU prefix
        if n.starts_with("sntrup") || n.starts_with("ntrulpr") {
            Family::NtruPrime
        } else if n.starts_with("ntru") {
            Family::Ntru
        } else if n.starts_with("bike") {
            Family::Bike
        } else if n.starts_with("classic-mceliece") {
            Family::ClassicMceliece
        } else if n.starts_with("frodo") {
            Family::Frodo
        } else if n.starts_with("hqc") {
            Family::Hqc
        } else if n.starts_with("kyber") {
            Family::Kyber
        } else if n.contains("saber") {
            Family::Saber
        } else if n.starts_with("sike") || n.starts_with("sidh") {
            Family::Sike
        } else {
            Family::Other
        }
    }
}

/// Parameter-set markers per family and the NIST level they target.
const LEVEL_TABLE: &[(Family, &str, u8)] = &[
    (Family::Bike, "l1", 1),
    (Family::Bike, "l3", 3),
    (Family::Bike, "l5", 5),
    (Family::ClassicMceliece, "348864", 1),
    (Family::ClassicMceliece, "460896", 3),
    (Family::ClassicMceliece, "6688128", 5),
    (Family::ClassicMceliece, "6960119", 5),
    (Family::ClassicMceliece, "8192128", 5),
    (Family::Frodo, "640", 1),
    (Family::Frodo, "976", 3),
    (Family::Frodo, "1344", 5),
    (Family::Hqc, "128", 1),
    (Family::Hqc, "192", 3),
    (Family::Hqc, "256", 5),
    (Family::Kyber, "1024", 5),
    (Family::Kyber, "512", 1),
    (Family::Kyber, "768", 3),
    (Family::Ntru, "hps-2048-509", 1),
    (Family::Ntru, "hps-2048-677", 3),
    (Family::Ntru, "hrss-701", 3),
    (Family::Ntru, "hps-4096-821", 5),
    (Family::Ntru, "hrss-1373", 5),
    (Family::NtruPrime, "653", 1),
    (Family::NtruPrime, "761", 2),
    (Family::NtruPrime, "857", 3),
    (Family::NtruPrime, "953", 4),
    (Family::NtruPrime, "1013", 4),
    (Family::NtruPrime, "1277", 5),
    (Family::Sike, "p434", 1),
    (Family::Sike, "p503", 2),
    (Family::Sike, "p610", 3),
    (Family::Sike, "p751", 5),
];

/// NIST security level targeted by an algorithm, if it can be derived from its name.
pub fn nist_level(name: &str) -> Option<u8> {
    let family = Family::of(name);
    if family == Family::Saber {
        let n = name.to_ascii_lowercase();
        return Some(if n.starts_with("lightsaber") {
            1
        } else if n.starts_with("firesaber") {
            5
        } else {
            3
        });
    }
    let n = name.to_ascii_lowercase();
    LEVEL_TABLE
        .iter()
        .find(|(f, marker, _)| *f == family && n.contains(marker))
        .map(|(_, _, level)| *level)
}

/// NIST level selection of the filter form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NistLevel {
    #[default]
    All,
    Level(u8),
}

impl NistLevel {
    /// True when `name` does NOT satisfy the selected level.
    pub fn rejects(self, name: &str) -> bool {
        match self {
            NistLevel::All => false,
            NistLevel::Level(l) => nist_level(name) != Some(l),
        }
    }

    /// Cycle All -> 1 -> ... -> 5 -> All.
    pub fn next(self) -> Self {
        match self {
            NistLevel::All => NistLevel::Level(1),
            NistLevel::Level(l) if l >= 5 => NistLevel::All,
            NistLevel::Level(l) => NistLevel::Level(l + 1),
        }
    }

    pub fn prev(self) -> Self {
        match self {
            NistLevel::All => NistLevel::Level(5),
            NistLevel::Level(l) if l <= 1 => NistLevel::All,
            NistLevel::Level(l) => NistLevel::Level(l - 1),
        }
    }
}

impl std::fmt::Display for NistLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NistLevel::All => write!(f, "All"),
            NistLevel::Level(l) => write!(f, "{l}"),
        }
    }
}

impl std::str::FromStr for NistLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(NistLevel::All);
        }
        match s.trim().parse::<u8>() {
            Ok(l @ 1..=5) => Ok(NistLevel::Level(l)),
            _ => Err(format!("invalid NIST level '{s}' (expected all or 1-5)")),
        }
    }
}

/// Families currently selected for display. Empty selection means "all families".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilySelection {
    selected: Vec<Family>,
}

impl FamilySelection {
    pub fn only(families: &[Family]) -> Self {
        let mut selected = families.to_vec();
        selected.sort_by_key(|f| *f as u8);
        selected.dedup();
        Self { selected }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(&Family::of(name))
    }

    pub fn is_all(&self) -> bool {
        self.selected.is_empty()
    }

    /// Step through "all families" and then each single family.
    pub fn cycle(&self, forward: bool) -> Self {
        let current = match self.selected.as_slice() {
            [] => None,
            [one] => Family::ALL.iter().position(|f| f == one),
            _ => None,
        };
        let len = Family::ALL.len();
        let next = match (current, forward) {
            (None, true) => Some(0),
            (None, false) => Some(len - 1),
            (Some(i), true) if i + 1 < len => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        };
        match next {
            Some(i) => Self::only(&[Family::ALL[i]]),
            None => Self::default(),
        }
    }

    pub fn label(&self) -> String {
        if self.selected.is_empty() {
            return "All".into();
        }
        self.selected
            .iter()
            .map(|f| f.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Decides which algorithm keys of the reference snapshot become chart series at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFilter {
    pub name_contains: Option<String>,
    pub hide_reference: bool,
}

impl KeyFilter {
    pub fn accepts(&self, name: &str) -> bool {
        if self.hide_reference && is_reference_impl(name) {
            return false;
        }
        match self.name_contains.as_deref() {
            Some(needle) if !needle.is_empty() => name
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase()),
            _ => true,
        }
    }
}

pub fn is_reference_impl(name: &str) -> bool {
    name.contains(REFERENCE_MARKER)
}

/// RGB color of a chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor(pub u8, pub u8, pub u8);

impl Serialize for SeriesColor {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2))
    }
}

const PALETTE: [SeriesColor; 12] = [
    SeriesColor(0x1f, 0x77, 0xb4),
    SeriesColor(0xff, 0x7f, 0x0e),
    SeriesColor(0x2c, 0xa0, 0x2c),
    SeriesColor(0xd6, 0x27, 0x28),
    SeriesColor(0x94, 0x67, 0xbd),
    SeriesColor(0x8c, 0x56, 0x4b),
    SeriesColor(0xe3, 0x77, 0xc2),
    SeriesColor(0x7f, 0x7f, 0x7f),
    SeriesColor(0xbc, 0xbd, 0x22),
    SeriesColor(0x17, 0xbe, 0xcf),
    SeriesColor(0xff, 0xd7, 0x00),
    SeriesColor(0x00, 0x80, 0x80),
];

/// Deterministic color for an algorithm name. Reference and optimized builds of the
/// same parameter set share a color; the line style tells them apart.
pub fn color_for(name: &str) -> SeriesColor {
    let base = name.strip_suffix(REFERENCE_MARKER).unwrap_or(name);
    // FNV-1a
    let mut h: u32 = 0x811c_9dc5;
    for b in base.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(0x0100_0193);
    }
    PALETTE[(h as usize) % PALETTE.len()]
}
