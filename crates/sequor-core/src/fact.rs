//! Fact propagation between sequence steps.
//!
//! Steps that opt into fact inheritance receive a filtered snapshot of the
//! facts accumulated so far. Filtering is glob-style over the dot-separated
//! trait namespace: `host.*` selects `host.hostname` and `host.ip` but not
//! `host.net.subnet` -- a `*` stands for exactly one segment. Storage is
//! never filtered; only consumption is.

use sequor_types::fact::Fact;

/// Select the facts whose trait matches any of the given patterns.
///
/// An empty pattern list passes everything through. Unmatched facts are
/// dropped silently; output order follows input order.
pub fn filter_facts(facts: &[Fact], patterns: &[String]) -> Vec<Fact> {
    if patterns.is_empty() {
        return facts.to_vec();
    }
    facts
        .iter()
        .filter(|fact| patterns.iter().any(|p| matches_pattern(&fact.name, p)))
        .cloned()
        .collect()
}

/// Segment-wise glob match of a trait name against a pattern.
///
/// Both sides split on `.`; segment counts must agree. A pattern segment of
/// `*` matches any one trait segment, anything else must match exactly. A
/// pattern without wildcards therefore only matches the identical trait.
pub fn matches_pattern(trait_name: &str, pattern: &str) -> bool {
    let mut name_segments = trait_name.split('.');
    let mut pattern_segments = pattern.split('.');
    loop {
        match (name_segments.next(), pattern_segments.next()) {
            (Some(name_seg), Some(pat_seg)) => {
                if pat_seg != "*" && pat_seg != name_seg {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Syntactic check used by definition validation: every dot-separated
/// segment must be `*` or a non-empty run of `[A-Za-z0-9_]`.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern.split('.').all(|segment| {
            segment == "*"
                || (!segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_'))
        })
}
