// Scores candidate positions by edit distance and promotes the single best
// one into original-text coordinates. One invocation yields at most one
// match: the most similar occurrence in the whole haystack, never every
// occurrence. Callers wanting several replacements run the operation once
// per target.

const BASE_DISTANCE: usize = 5;
const LENGTH_RATIO: usize = 10;

// Similarity threshold, proportional to pattern length with a floor so
// short patterns still tolerate a few edits. The locator derives its
// segment count and neighborhood radius from the same value.
pub fn max_distance(pattern_len: usize) -> usize {
    BASE_DISTANCE.max(pattern_len / LENGTH_RATIO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedMatch {
    pub start: usize,
    pub end: usize,
    pub distance: usize,
}

pub fn verify(
    haystack: &[char],
    pattern: &[char],
    candidates: &[usize],
    mapping: &[usize],
    raw_len: usize,
) -> Option<VerifiedMatch> {
    if pattern.is_empty() {
        return None;
    }

    let tolerance = max_distance(pattern.len());
    let mut best: Option<(usize, usize)> = None;

    // Candidates arrive sorted ascending, so strict `<` keeps the earliest
    // start on equal distance.
    for &start in candidates {
        if start + pattern.len() > haystack.len() {
            continue;
        }
        let window_end = (start + pattern.len() + tolerance).min(haystack.len());
        let window = &haystack[start..window_end];
        let Some(distance) = bounded_edit_distance(window, pattern, tolerance) else {
            continue;
        };
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((start, distance));
        }
    }

    let (winner, distance) = best?;

    // Tighten the span: walk the haystack from the winning candidate and
    // consume pattern chars in order. The first consumed char fixes the
    // start, the cursor after the last consumed char fixes the end. This
    // sheds the neighborhood slack the locator added around the hit.
    let mut hay_idx = winner;
    let mut pat_idx = 0;
    let mut match_start = None;
    while hay_idx < haystack.len() && pat_idx < pattern.len() {
        if haystack[hay_idx] == pattern[pat_idx] {
            pat_idx += 1;
            if match_start.is_none() {
                match_start = Some(hay_idx);
            }
        }
        hay_idx += 1;
    }
    let norm_start = match_start.unwrap_or(winner);
    let norm_end = hay_idx;

    let start = mapping[norm_start];
    let end = if norm_end >= haystack.len() {
        raw_len
    } else {
        mapping[norm_end - 1] + 1
    };

    Some(VerifiedMatch {
        start,
        end,
        distance,
    })
}

// Two-row Levenshtein. Bails out with None as soon as a full row exceeds
// the limit: no later prefix can come back under it.
fn bounded_edit_distance(a: &[char], b: &[char], limit: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > limit {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        let mut row_min = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        if row_min > limit {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= limit).then_some(distance)
}
