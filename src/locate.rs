use std::collections::BTreeSet;

use crate::verify::max_distance;

const MIN_SEGMENT_LEN: usize = 3;

struct Segment<'a> {
    text: &'a [char],
    start: usize,
}

// Cheap anchored scan over the normalized haystack. The pattern is cut into
// max_distance + 1 contiguous segments: any match within max_distance edits
// must contain at least one segment verbatim, so exact segment hits are the
// only places worth verifying. Every hit emits the aligned start plus a
// max_distance-wide neighborhood on both sides to absorb leading drift.
// Decoy hits are all emitted; picking between them is the verifier's job.
pub fn find_candidates(haystack: &[char], pattern: &[char]) -> Vec<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return Vec::new();
    }

    let tolerance = max_distance(pattern.len());
    let last_start = haystack.len() - pattern.len();
    let mut candidates = BTreeSet::new();

    for segment in split_segments(pattern, tolerance + 1) {
        for hit in occurrences(haystack, segment.text) {
            let aligned = hit as isize - segment.start as isize;
            let lo = (aligned - tolerance as isize).max(0) as usize;
            let hi = aligned + tolerance as isize;
            if hi < 0 {
                continue;
            }
            let hi = (hi as usize).min(last_start);
            for start in lo..=hi {
                candidates.insert(start);
            }
        }
    }

    candidates.into_iter().collect()
}

// Short patterns cannot carry max_distance + 1 useful anchors; shrink the
// segment count until each segment is at least MIN_SEGMENT_LEN chars.
fn split_segments(pattern: &[char], requested: usize) -> Vec<Segment<'_>> {
    let mut count = requested;
    if pattern.len() < MIN_SEGMENT_LEN * count {
        count = (pattern.len() / MIN_SEGMENT_LEN).max(1);
    }

    let base = pattern.len() / count;
    let mut remainder = pattern.len() % count;
    let mut segments = Vec::with_capacity(count);
    let mut pos = 0;
    for _ in 0..count {
        let len = if remainder > 0 {
            remainder -= 1;
            base + 1
        } else {
            base
        };
        if len > 0 {
            segments.push(Segment {
                text: &pattern[pos..pos + len],
                start: pos,
            });
        }
        pos += len;
    }
    segments
}

fn occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn exact_occurrence_is_a_candidate() {
        let haystack = chars("prefix text let total = compute(); suffix text here");
        let pattern = chars("let total = compute();");
        let start = 12;
        let candidates = find_candidates(&haystack, &pattern);
        assert!(candidates.contains(&start), "candidates: {candidates:?}");
    }

    #[test]
    fn neighborhood_around_hits_is_included() {
        let haystack = chars("aaaa let total = compute(); zzzz zzzz zzzz");
        let pattern = chars("let total = compute();");
        let candidates = find_candidates(&haystack, &pattern);
        assert!(candidates.contains(&5));
        assert!(candidates.contains(&(5 - 3)));
        assert!(candidates.contains(&(5 + 3)));
    }

    #[test]
    fn every_decoy_occurrence_is_reported() {
        let haystack = chars("call(a); filler filler call(a); filler filler call(a);!");
        let pattern = chars("call(a);");
        let candidates = find_candidates(&haystack, &pattern);
        for start in [0, 23, 46] {
            assert!(candidates.contains(&start), "missing {start}: {candidates:?}");
        }
    }

    #[test]
    fn no_shared_segment_means_no_candidates() {
        let haystack = chars("entirely unrelated content over here");
        let pattern = chars("zzqqxxyyvv");
        assert!(find_candidates(&haystack, &pattern).is_empty());
    }

    #[test]
    fn pattern_longer_than_haystack_yields_nothing() {
        let haystack = chars("short");
        let pattern = chars("much longer than the haystack");
        assert!(find_candidates(&haystack, &pattern).is_empty());
    }

    #[test]
    fn empty_pattern_yields_nothing() {
        assert!(find_candidates(&chars("text"), &[]).is_empty());
    }

    #[test]
    fn segments_cover_the_pattern_in_order() {
        let pattern = chars("abcdefghijklmnopqrstu");
        let segments = split_segments(&pattern, 6);
        let mut rebuilt = Vec::new();
        let mut expected_start = 0;
        for segment in &segments {
            assert_eq!(segment.start, expected_start);
            rebuilt.extend_from_slice(segment.text);
            expected_start += segment.text.len();
        }
        assert_eq!(rebuilt, pattern);
        assert!(segments.iter().all(|s| s.text.len() >= MIN_SEGMENT_LEN));
    }

    #[test]
    fn short_pattern_collapses_to_one_segment() {
        let pattern = chars("ab");
        let segments = split_segments(&pattern, 6);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, pattern.as_slice());
    }
}
