//! Base-unit multiplier inference from variant nicknames.
//!
//! The base inventory unit is a 4oz bag; every other package size is an
//! integer multiple of it. The structured `base_units` metadata field on a
//! vendor price is the source of truth, but older prices predate that field,
//! so the multiplier is inferred by pattern-matching the display nickname
//! ("8oz", "1 lb", ...) as a fallback. The sync handler persists the inferred
//! value back to the vendor so future reads stop guessing.
//!
//! The inference is a heuristic over free text and breaks on renames or
//! localization; new prices should always carry the metadata field.

use std::sync::LazyLock;

use regex::Regex;

/// Ounces in one base unit.
pub const BASE_UNIT_OUNCES: u32 = 4;

/// Recognized size labels and their base-unit multipliers.
///
/// Matching is case-insensitive and tolerant of whitespace between the
/// number and unit ("1lb", "1 lb", "1 LBS" all match).
static SIZE_PATTERNS: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    [
        (r"(?i)\b4\s*oz\b", 1),
        (r"(?i)\b8\s*oz\b", 2),
        (r"(?i)\b12\s*oz\b", 3),
        (r"(?i)\b16\s*oz\b", 4),
        (r"(?i)\b1\s*lbs?\b", 4),
        (r"(?i)\b2\s*lbs?\b", 8),
        (r"(?i)\b5\s*lbs?\b", 20),
    ]
    .into_iter()
    .map(|(pattern, multiplier)| {
        #[allow(clippy::expect_used)]
        let regex = Regex::new(pattern).expect("size pattern is a valid regex");
        (regex, multiplier)
    })
    .collect()
});

/// Infer a base-unit multiplier from a variant nickname.
///
/// Unrecognized nicknames default to 1 (one base unit per item). That keeps
/// unknown sizes purchasable at the most conservative per-item draw rather
/// than blocking them.
#[must_use]
pub fn infer_base_units(nickname: &str) -> u32 {
    SIZE_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(nickname))
        .map_or(1, |(_, multiplier)| *multiplier)
}

/// Resolve the effective multiplier for a variant.
///
/// An explicit metadata value of at least 1 always wins; otherwise fall back
/// to nickname inference.
#[must_use]
pub fn resolve_base_units(explicit: Option<u32>, nickname: &str) -> u32 {
    match explicit {
        Some(value) if value >= 1 => value,
        _ => infer_base_units(nickname),
    }
}

/// Parse a metadata string value ("4", " 4 ") into a multiplier.
///
/// Vendors store metadata as strings; anything non-numeric or zero is treated
/// as absent so it gets repaired by the sync handler.
#[must_use]
pub fn parse_base_units_metadata(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v >= 1)
}
