// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Small parsing and formatting helpers shared by the configuration layer.

/// Parse a comma-delimited list of 64-bit integers.
///
/// Permissive by contract: an empty string, a list of blank entries, or any
/// entry that fails to parse yields `None` ("feature disabled") instead of an
/// error. Whitespace around entries is ignored.
#[must_use]
pub fn parse_comma_delimited_longs(raw: &str) -> Option<Vec<i64>> {
    let mut out = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.parse::<i64>() {
            Ok(v) => out.push(v),
            Err(_) => {
                log::debug!(
                    "[conf] discarding long list {:?}: bad entry {:?}",
                    raw,
                    entry
                );
                return None;
            }
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Join a slice of displayable items with commas, no spaces.
#[must_use]
pub fn join_comma<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_longs_with_whitespace() {
        assert_eq!(
            parse_comma_delimited_longs("1, 2 ,3"),
            Some(vec![1, 2, 3])
        );
        assert_eq!(parse_comma_delimited_longs("-5"), Some(vec![-5]));
    }

    #[test]
    fn blank_input_yields_none() {
        assert_eq!(parse_comma_delimited_longs(""), None);
        assert_eq!(parse_comma_delimited_longs(" , ,"), None);
    }

    #[test]
    fn garbage_entry_discards_the_list() {
        assert_eq!(parse_comma_delimited_longs("1,x,3"), None);
        assert_eq!(parse_comma_delimited_longs("1.5"), None);
    }

    #[test]
    fn joins_with_commas() {
        assert_eq!(join_comma(&[1i64, 2, 3]), "1,2,3");
        assert_eq!(join_comma::<i64>(&[]), "");
    }
}
