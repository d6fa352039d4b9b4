//! Weak-answer heuristic.
//!
//! Purely syntactic and deterministic: the same text always gets the same
//! verdict.

use crate::sections::StructuredAnswer;

/// A direct answer shorter than this (trimmed, in characters) is weak.
pub const MIN_DIRECT_CHARS: usize = 40;

/// Case-insensitive substrings that mark a hedged answer.
pub const HEDGING_MARKERS: [&str; 9] = [
    "not found",
    "context is weak",
    "do not know",
    "don't know",
    "no specific",
    "cannot provide",
    "not mentioned",
    "no information",
    "insufficient context",
];

/// Weak if empty, too short, or hedged.
pub fn is_weak_text(direct: &str) -> bool {
    let trimmed = direct.trim();
    if trimmed.chars().count() < MIN_DIRECT_CHARS {
        return true;
    }

    let lower = trimmed.to_lowercase();
    HEDGING_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Check the direct section of a parsed answer.
pub fn is_weak(answer: &StructuredAnswer) -> bool {
    is_weak_text(&answer.direct)
}

/// Check raw model output by locating its direct section first.
pub fn is_weak_raw(raw: &str) -> bool {
    is_weak(&StructuredAnswer::parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG: &str = "Madhavan Ramanujam recommends talking about willingness to pay before building, and packaging into three tiers.";

    #[test]
    fn test_empty_and_short_are_weak() {
        assert!(is_weak_text(""));
        assert!(is_weak_text("   \n"));
        assert!(is_weak_text("Charge more."));
        assert!(is_weak_text(&"x".repeat(MIN_DIRECT_CHARS - 1)));
        assert!(!is_weak_text(&"x".repeat(MIN_DIRECT_CHARS)));
    }

    #[test]
    fn test_hedging_markers_are_weak_regardless_of_length() {
        for marker in HEDGING_MARKERS {
            let text = format!("{} {}", STRONG, marker.to_uppercase());
            assert!(is_weak_text(&text), "marker {:?} not detected", marker);
        }
    }

    #[test]
    fn test_strong_answer() {
        assert!(!is_weak_text(STRONG));
    }

    #[test]
    fn test_raw_text_uses_direct_section() {
        let raw = format!(
            "## Direct Answer\n{}\n\n## Missing Information\nNo information on B2C pricing.",
            STRONG
        );
        // The hedge lives in another section
        assert!(!is_weak_raw(&raw));

        assert!(is_weak_raw("## Direct Answer\nNot found in provided context.\n## Indirect Insights\n- a"));
        assert!(is_weak_raw(STRONG));
    }

    #[test]
    fn test_inline_headings_are_not_weak() {
        let raw = format!(
            "**Direct Answer:** {}\n\n**Indirect Insights:** Anchor high.\n\n**Missing Information:** None.",
            STRONG
        );
        assert!(!is_weak_raw(&raw));
        assert!(is_weak_raw("**Direct Answer:** Not found.\n**Indirect Insights:** Anchor high."));
    }

    #[test]
    fn test_deterministic() {
        let raw = "## Direct Answer\nSomething reasonably long enough to pass the threshold.";
        assert_eq!(is_weak_raw(raw), is_weak_raw(raw));
    }
}
