//! Stable numeric identifiers for routes and stops.
//!
//! The source feed mixes plain numeric codes with alphanumeric schemes, so
//! identifiers are synthesized by deterministic arithmetic over disjoint
//! numeric ranges. Recomputing an id from the same source token always yields
//! the same value, and distinct prefix/suffix combinations can never collide
//! because their base offsets are spaced wider than any embedded digit run.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NormalizeError;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Route short names like "T12" land above every digit-only route id.
const ROUTE_T_BASE: i64 = 20_000;

/// Stop id prefixes, each mapped to its own 100 000 block.
const STOP_PREFIXES: &[(&str, i64)] = &[
    ("BLA", 100_000),
    ("SEU", 200_000),
    ("SJM", 300_000),
    ("ROS", 400_000),
    ("TER", 500_000),
];

/// Trailing platform qualifier, one 1 000 block per letter.
const STOP_SUFFIXES: &[(char, i64)] = &[('A', 1_000), ('B', 2_000), ('C', 3_000), ('D', 4_000)];

/// Stop codes equal to "0" mean "no code".
const NO_STOP_CODE: &str = "0";

fn is_digits_only(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

fn first_digit_run(value: &str) -> Option<i64> {
    DIGITS.find(value).and_then(|m| m.as_str().parse().ok())
}

/// Resolves the numeric route id from the source route id and short name.
///
/// Digit-only route ids are used verbatim, preserving the source numbering.
/// Otherwise the short name must carry a recognized letter scheme ("T" plus
/// digits); anything else is fatal, since inventing an id would corrupt every
/// downstream identity join.
pub fn resolve_route_id(route_id: &str, short_name: &str) -> Result<i64, NormalizeError> {
    if is_digits_only(route_id) {
        return route_id
            .parse()
            .map_err(|_| NormalizeError::UnresolvedRouteId {
                route_id: route_id.to_string(),
                short_name: short_name.to_string(),
            });
    }
    if let Some(digits) = first_digit_run(short_name) {
        if short_name.starts_with('T') {
            return Ok(ROUTE_T_BASE + digits);
        }
    }
    Err(NormalizeError::UnresolvedRouteId {
        route_id: route_id.to_string(),
        short_name: short_name.to_string(),
    })
}

/// The display form of a stop code; the "0" sentinel and blanks are absent.
pub fn display_stop_code(stop_code: &str) -> Option<&str> {
    let trimmed = stop_code.trim();
    if trimmed.is_empty() || trimmed == NO_STOP_CODE {
        None
    } else {
        Some(trimmed)
    }
}

/// Resolves the numeric stop id.
///
/// A present, numeric stop code is authoritative. Otherwise the stop id token
/// decomposes into prefix block + suffix block + embedded digit run. Tokens
/// outside the enumerated prefix/suffix sets are fatal: a new naming
/// convention must be whitelisted before it can be trusted.
pub fn resolve_stop_id(stop_code: &str, stop_id: &str) -> Result<i64, NormalizeError> {
    if let Some(code) = display_stop_code(stop_code) {
        if is_digits_only(code) {
            return code.parse().map_err(|_| NormalizeError::UnresolvedStopId {
                stop_id: stop_id.to_string(),
                stop_code: stop_code.to_string(),
            });
        }
    }

    let unresolved = || NormalizeError::UnresolvedStopId {
        stop_id: stop_id.to_string(),
        stop_code: stop_code.to_string(),
    };

    let digits = first_digit_run(stop_id).ok_or_else(unresolved)?;
    let base = STOP_PREFIXES
        .iter()
        .find(|(prefix, _)| stop_id.starts_with(prefix))
        .map(|(_, base)| *base)
        .ok_or_else(unresolved)?;
    let suffix = STOP_SUFFIXES
        .iter()
        .find(|(letter, _)| stop_id.ends_with(*letter))
        .map(|(_, offset)| *offset)
        .ok_or_else(unresolved)?;

    Ok(base + suffix + digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_only_route_id_is_used_verbatim() {
        assert_eq!(resolve_route_id("9", "9").unwrap(), 9);
        assert_eq!(resolve_route_id("88", "T88").unwrap(), 88);
    }

    #[test]
    fn t_short_name_is_offset() {
        assert_eq!(resolve_route_id("CITLA-T12", "T12").unwrap(), 20_012);
        assert_eq!(resolve_route_id("X", "T5").unwrap(), 20_005);
    }

    #[test]
    fn unrecognized_route_scheme_is_fatal() {
        assert!(matches!(
            resolve_route_id("EXP", "E12"),
            Err(NormalizeError::UnresolvedRouteId { .. })
        ));
        assert!(matches!(
            resolve_route_id("EXP", "T-express"),
            Err(NormalizeError::UnresolvedRouteId { .. })
        ));
    }

    #[test]
    fn numeric_stop_code_is_authoritative() {
        assert_eq!(resolve_stop_id("74001", "BLA123A").unwrap(), 74_001);
    }

    #[test]
    fn stop_id_token_is_decomposed() {
        assert_eq!(resolve_stop_id("", "BLA123A").unwrap(), 101_123);
        assert_eq!(resolve_stop_id("", "SEU123C").unwrap(), 203_123);
        assert_eq!(resolve_stop_id("", "SJM2B").unwrap(), 302_002);
        assert_eq!(resolve_stop_id("", "ROS1A").unwrap(), 401_001);
        assert_eq!(resolve_stop_id("", "TER45D").unwrap(), 504_045);
    }

    #[test]
    fn zero_stop_code_is_treated_as_absent() {
        assert_eq!(
            resolve_stop_id("0", "SEU123C").unwrap(),
            resolve_stop_id("", "SEU123C").unwrap()
        );
        assert_eq!(display_stop_code("0"), None);
        assert_eq!(display_stop_code(""), None);
        assert_eq!(display_stop_code("74001"), Some("74001"));
    }

    #[test]
    fn prefix_suffix_combinations_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for (prefix, _) in STOP_PREFIXES {
            for (suffix, _) in STOP_SUFFIXES {
                for digits in [1, 42, 999] {
                    let token = format!("{prefix}{digits}{suffix}");
                    let id = resolve_stop_id("", &token).unwrap();
                    assert!(seen.insert(id), "collision for {token}");
                }
            }
        }
    }

    #[test]
    fn unknown_prefix_or_suffix_is_fatal() {
        assert!(matches!(
            resolve_stop_id("", "XYZ123A"),
            Err(NormalizeError::UnresolvedStopId { .. })
        ));
        assert!(matches!(
            resolve_stop_id("", "BLA123E"),
            Err(NormalizeError::UnresolvedStopId { .. })
        ));
        assert!(matches!(
            resolve_stop_id("", "BLAC"),
            Err(NormalizeError::UnresolvedStopId { .. })
        ));
    }
}
