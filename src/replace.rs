use crate::error::ReplaceError;
use crate::locate::find_candidates;
use crate::normalize::{normalize, normalize_pattern};
use crate::verify::{VerifiedMatch, verify};

const SNIPPET_LIMIT: usize = 120;

// Verbatim one-occurrence replace. Zero occurrences or more than one are
// both refusals: guessing between duplicates is how edits land in the
// wrong place.
pub fn apply_exact_replace(
    file: &str,
    raw: &str,
    old: &str,
    new: &str,
) -> Result<String, ReplaceError> {
    if old.trim().is_empty() {
        return Err(ReplaceError::EmptyPattern {
            file: file.to_string(),
        });
    }

    let Some(first) = raw.find(old) else {
        return Err(ReplaceError::NoMatchFound {
            file: file.to_string(),
            pattern: pattern_snippet(old),
        });
    };
    if raw[first + old.len()..].contains(old) {
        return Err(ReplaceError::AmbiguousExactMatch {
            file: file.to_string(),
            count: raw.matches(old).count(),
        });
    }

    let mut result = String::with_capacity(raw.len() - old.len() + new.len());
    result.push_str(&raw[..first]);
    result.push_str(new);
    result.push_str(&raw[first + old.len()..]);
    Ok(result)
}

// Fuzzy replace: normalize both sides, locate candidate starts, keep the
// single most similar occurrence, splice into the untouched original.
// Despite the "global" name this patches exactly one occurrence per call.
pub fn apply_global_replace(
    file: &str,
    raw: &str,
    old: &str,
    new: &str,
) -> Result<String, ReplaceError> {
    if old.trim().is_empty() {
        return Err(ReplaceError::EmptyPattern {
            file: file.to_string(),
        });
    }

    let haystack = normalize(raw);
    let pattern = normalize_pattern(old);
    if pattern.is_empty() {
        // Comment-only patterns normalize away to nothing searchable.
        return Err(ReplaceError::EmptyPattern {
            file: file.to_string(),
        });
    }

    let candidates = find_candidates(&haystack.content, &pattern);
    let raw_len = raw.chars().count();
    let Some(found) = verify(
        &haystack.content,
        &pattern,
        &candidates,
        &haystack.mapping,
        raw_len,
    ) else {
        return Err(ReplaceError::NoMatchFound {
            file: file.to_string(),
            pattern: pattern_snippet(old),
        });
    };

    Ok(apply_replacements(raw, &[found], new))
}

// Splices `new_content` over each match span (char coordinates), walking
// right to left so earlier offsets stay valid. Everything outside the
// spans is untouched, including comments and formatting that existed only
// in the raw text.
pub fn apply_replacements(raw: &str, matches: &[VerifiedMatch], new_content: &str) -> String {
    let mut ordered: Vec<&VerifiedMatch> = matches.iter().collect();
    ordered.sort_by_key(|found| found.start);

    let mut result = raw.to_string();
    for found in ordered.iter().rev() {
        let start = char_to_byte(&result, found.start);
        let end = char_to_byte(&result, found.end);
        result.replace_range(start..end, new_content);
    }
    result
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn pattern_snippet(pattern: &str) -> String {
    if pattern.chars().count() <= SNIPPET_LIMIT {
        return pattern.to_string();
    }
    let mut snippet: String = pattern.chars().take(SNIPPET_LIMIT).collect();
    snippet.push_str("...");
    snippet
}
