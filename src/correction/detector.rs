//! Detector trait shared by the candidate detection strategies.

use crate::correction::identity::build_snippet;
use crate::correction::model::{Candidate, Occurrence, Span};
use crate::error::Result;
use crate::segment::Segment;

/// A strategy that proposes corrections without touching the segments.
pub trait Detector {
    /// Scan `segments` and return proposed corrections.
    ///
    /// `transcript_key` feeds the segment-id fallbacks so occurrences from
    /// different detectors agree on ids.
    fn detect(&mut self, segments: &[Segment], transcript_key: &str) -> Result<Vec<Candidate>>;

    /// Return the name of this detector for logging.
    fn name(&self) -> &str;
}

/// Occurrence for `text[start..end]` in `segment`, with timing copied over.
pub(crate) fn occurrence_at(segment: &Segment, segment_id: &str, start: usize, end: usize) -> Occurrence {
    let text = segment.text();
    let mut occurrence = Occurrence::new(
        segment_id,
        Some(Span::new(start, end)),
        build_snippet(text, start, end),
    );
    occurrence.speaker = segment.speaker.clone();
    occurrence.time_start = segment.start_secs();
    occurrence.time_end = segment.end_secs();
    occurrence.matched = text.get(start..end).map(str::to_string);
    occurrence
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn bounded_at(haystack: &str, start: usize, end: usize) -> bool {
    let bytes = haystack.as_bytes();
    let left_ok = start == 0 || !is_word_byte(bytes[start - 1]);
    let right_ok = end == bytes.len() || !is_word_byte(bytes[end]);
    left_ok && right_ok
}

/// Non-overlapping byte ranges of `needle` in `haystack` that are not
/// flanked by ASCII letters, digits or underscores.
pub(crate) fn find_bounded(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    if needle.is_empty() {
        return found;
    }

    // Lowercasing can shift byte offsets outside ASCII, so only the ASCII
    // case-insensitive path searches a lowered copy.
    if case_sensitive || haystack.is_ascii() {
        let (hay, pat) = if case_sensitive {
            (haystack.to_string(), needle.to_string())
        } else {
            (haystack.to_ascii_lowercase(), needle.to_lowercase())
        };
        let mut from = 0;
        while let Some(pos) = hay[from..].find(&pat) {
            let start = from + pos;
            let end = start + pat.len();
            if bounded_at(haystack, start, end) {
                found.push((start, end));
                from = end;
            } else {
                from = start + hay[start..].chars().next().map_or(1, char::len_utf8);
            }
        }
        return found;
    }

    let needle_lower = needle.to_lowercase();
    let needle_chars = needle_lower.chars().count();
    let mut resume = 0;
    for (start, _) in haystack.char_indices() {
        if start < resume {
            continue;
        }
        let end = haystack[start..]
            .char_indices()
            .nth(needle_chars)
            .map_or(haystack.len(), |(i, _)| start + i);
        if haystack[start..end].to_lowercase() == needle_lower && bounded_at(haystack, start, end) {
            found.push((start, end));
            resume = end;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Detector for Silent {
        fn detect(&mut self, _segments: &[Segment], _key: &str) -> Result<Vec<Candidate>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn detectors_are_object_safe() {
        let mut detectors: Vec<Box<dyn Detector>> = vec![Box::new(Silent)];
        for detector in &mut detectors {
            assert!(detector.detect(&[], "key").unwrap().is_empty());
            assert_eq!(detector.name(), "silent");
        }
    }

    #[test]
    fn occurrence_copies_segment_context() {
        let segment = Segment::new(Some("Alice"), "We use Kubernettes here.").with_times(1.0, 2.5);
        let occurrence = occurrence_at(&segment, "seg", 7, 18);
        assert_eq!(occurrence.matched.as_deref(), Some("Kubernettes"));
        assert_eq!(occurrence.speaker.as_deref(), Some("Alice"));
        assert_eq!(occurrence.time_start, Some(1.0));
        assert_eq!(occurrence.time_end, Some(2.5));
        assert_eq!(occurrence.span, Some(Span::new(7, 18)));
        assert_eq!(occurrence.snippet, "We use Kubernettes here.");
    }

    #[test]
    fn bounded_search_respects_word_edges() {
        assert_eq!(find_bounded("the report, reporting", "report", false), vec![(4, 10)]);
        assert_eq!(find_bounded("Report", "report", true), Vec::<(usize, usize)>::new());
        assert_eq!(find_bounded("Report", "report", false), vec![(0, 6)]);
    }

    #[test]
    fn bounded_search_handles_non_ascii_text() {
        let text = "Café mit Wren Twenty One";
        let found = find_bounded(text, "wren twenty one", false);
        assert_eq!(found.len(), 1);
        let (start, end) = found[0];
        assert_eq!(&text[start..end], "Wren Twenty One");
    }
}
