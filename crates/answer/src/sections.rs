//! Three-section answer format.
//!
//! A small line tokenizer over a closed set of heading variants. A heading
//! must open its line: optional leading `#`, optional `**`, a known variant
//! (case-insensitive), then a terminator (`:`, closing `**`, or end of line).
//! Text after the terminator is body text of the new section, so
//! `**Direct Answer:** yes` works. Heading words in the middle of a line are
//! never mistaken for headings.

use serde::{Deserialize, Serialize};

/// Section of a structured answer, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    Direct,
    Indirect,
    Missing,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [Self::Direct, Self::Indirect, Self::Missing];

    /// Canonical heading text.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Direct => "Direct Answer",
            Self::Indirect => "Indirect Insights",
            Self::Missing => "Missing Information",
        }
    }

    fn variants(&self) -> &'static [&'static str] {
        match self {
            Self::Direct => &["direct answer", "direct"],
            Self::Indirect => &["indirect insights", "indirect insight", "indirect"],
            Self::Missing => &["missing information", "missing info", "missing"],
        }
    }

    /// Classify a line as a heading, if the heading fills the whole line.
    pub fn from_heading(line: &str) -> Option<Self> {
        Self::split_heading(line)
            .filter(|(_, rest)| rest.is_empty())
            .map(|(kind, _)| kind)
    }

    /// Split a line that opens with a heading into its kind and the text
    /// following the heading (possibly empty).
    pub fn split_heading(line: &str) -> Option<(Self, &str)> {
        let stripped = line.trim().trim_start_matches('#').trim_start();
        let (bold, stripped) = match stripped.strip_prefix("**") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, stripped),
        };

        let mut candidates: Vec<(Self, &str)> = Self::ALL
            .into_iter()
            .flat_map(|kind| kind.variants().iter().map(move |v| (kind, *v)))
            .collect();
        candidates.sort_by_key(|(_, variant)| std::cmp::Reverse(variant.len()));

        candidates.into_iter().find_map(|(kind, variant)| {
            let head = stripped.get(..variant.len())?;
            if !head.eq_ignore_ascii_case(variant) {
                return None;
            }
            let rest = strip_terminator(&stripped[variant.len()..], bold)?;
            Some((kind, rest))
        })
    }
}

/// Consume what may follow a heading variant. `None` when the variant is
/// only the start of a longer word or sentence.
fn strip_terminator(rest: &str, bold: bool) -> Option<&str> {
    let rest = rest.trim_start();
    let terminators: &[&str] = if bold {
        &[":**", "**:", "**"]
    } else {
        &[":"]
    };

    for terminator in terminators {
        if let Some(after) = rest.strip_prefix(terminator) {
            return Some(after.trim());
        }
    }

    // Bare heading line with nothing after it
    (!bold && rest.is_empty()).then_some("")
}

/// One classified piece of input: a heading, or a line of body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Heading(SectionKind),
    Text(&'a str),
}

/// Classify every line of `text`. A heading with inline text yields the
/// heading followed by that text.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for line in text.lines() {
        match SectionKind::split_heading(line) {
            Some((kind, rest)) => {
                tokens.push(Token::Heading(kind));
                if !rest.is_empty() {
                    tokens.push(Token::Text(rest));
                }
            }
            None => tokens.push(Token::Text(line)),
        }
    }
    tokens
}

/// Direct / indirect / missing, each possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub direct: String,
    pub indirect: String,
    pub missing: String,
}

impl StructuredAnswer {
    /// Parse model output.
    ///
    /// Text before the first recognized heading is discarded; text after a
    /// heading accumulates until the next heading or end of input. A repeated
    /// heading continues the same section.
    pub fn parse(text: &str) -> Self {
        let mut buckets: [Vec<&str>; 3] = Default::default();
        let mut current: Option<SectionKind> = None;

        for token in tokenize(text) {
            match token {
                Token::Heading(kind) => current = Some(kind),
                Token::Text(line) => {
                    if let Some(kind) = current {
                        buckets[kind as usize].push(line);
                    }
                }
            }
        }

        let [direct, indirect, missing] = buckets.map(|lines| lines.join("\n").trim().to_string());
        Self {
            direct,
            indirect,
            missing,
        }
    }

    /// Whether any section carries text.
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.indirect.is_empty() && self.missing.is_empty()
    }

    pub fn section(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Direct => &self.direct,
            SectionKind::Indirect => &self.indirect,
            SectionKind::Missing => &self.missing,
        }
    }

    /// Render with canonical `##` headings in fixed order.
    pub fn render(&self) -> String {
        SectionKind::ALL
            .iter()
            .map(|kind| format!("## {}\n{}", kind.heading(), self.section(*kind).trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_variants() {
        assert_eq!(SectionKind::from_heading("## Direct Answer"), Some(SectionKind::Direct));
        assert_eq!(SectionKind::from_heading("DIRECT ANSWER:"), Some(SectionKind::Direct));
        assert_eq!(SectionKind::from_heading("**Indirect Insights:**"), Some(SectionKind::Indirect));
        assert_eq!(SectionKind::from_heading("### missing info"), Some(SectionKind::Missing));
        assert_eq!(SectionKind::from_heading("The direct answer is yes"), None);
        assert_eq!(SectionKind::from_heading(""), None);
    }

    #[test]
    fn test_parse_discards_preamble_and_keeps_order() {
        let raw = "Sure, here you go.\n\n## Direct Answer\nPrice on value.\n\n## Indirect Insights\n- Talk to customers\n\n## Missing Information\nNone.";
        let answer = StructuredAnswer::parse(raw);

        assert_eq!(answer.direct, "Price on value.");
        assert_eq!(answer.indirect, "- Talk to customers");
        assert_eq!(answer.missing, "None.");
    }

    #[test]
    fn test_heading_words_inside_body_are_text() {
        let raw = "## Direct Answer\nThe missing information here is the indirect cost.\n## Missing Information\nPricing data";
        let answer = StructuredAnswer::parse(raw);

        assert_eq!(answer.direct, "The missing information here is the indirect cost.");
        assert_eq!(answer.indirect, "");
        assert_eq!(answer.missing, "Pricing data");
    }

    #[test]
    fn test_inline_heading_text_starts_the_section() {
        let raw = "**Direct Answer:** Madhavan Ramanujam recommends pricing conversations early and three tiers.\n\n**Indirect Insights:** Anchor high.\n\n**Missing Information:** None.";
        let answer = StructuredAnswer::parse(raw);

        assert_eq!(
            answer.direct,
            "Madhavan Ramanujam recommends pricing conversations early and three tiers."
        );
        assert_eq!(answer.indirect, "Anchor high.");
        assert_eq!(answer.missing, "None.");
    }

    #[test]
    fn test_split_heading_forms() {
        assert_eq!(
            SectionKind::split_heading("Direct: talk about price first"),
            Some((SectionKind::Direct, "talk about price first"))
        );
        assert_eq!(
            SectionKind::split_heading("## **Missing Info**: B2C data"),
            Some((SectionKind::Missing, "B2C data"))
        );
        assert_eq!(
            SectionKind::split_heading("**Indirect Insights:**"),
            Some((SectionKind::Indirect, ""))
        );
        // Prefix of a longer word or a plain sentence
        assert_eq!(SectionKind::split_heading("Directly ask customers."), None);
        assert_eq!(SectionKind::split_heading("Direct sales teams push back."), None);
        assert_eq!(SectionKind::split_heading("**Direct Answer without closing"), None);
        assert_eq!(SectionKind::from_heading("**Direct Answer:** yes"), None);
    }

    #[test]
    fn test_inline_heading_mid_line_is_text() {
        let raw = "## Direct Answer\nSee the **Missing Information:** part below for gaps in coverage.";
        let answer = StructuredAnswer::parse(raw);

        assert_eq!(
            answer.direct,
            "See the **Missing Information:** part below for gaps in coverage."
        );
        assert_eq!(answer.missing, "");
    }

    #[test]
    fn test_no_headings_is_empty() {
        assert!(StructuredAnswer::parse("just prose").is_empty());
    }

    #[test]
    fn test_render_then_parse_roundtrip() {
        let answer = StructuredAnswer {
            direct: "Madhavan says to talk about price before building.\nTwo lines.".to_string(),
            indirect: "- Packaging matters\n- Anchor high".to_string(),
            missing: "No data on B2C.".to_string(),
        };

        let rendered = answer.render();
        assert!(rendered.starts_with("## Direct Answer\n"));
        assert_eq!(StructuredAnswer::parse(&rendered), answer);
    }
}
