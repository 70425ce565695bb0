use similar::{Algorithm, ChangeTag, TextDiff};

pub struct DiffDisplay {
    pub context: usize,
    pub colorize: bool,
}

pub fn print_diff(old: &str, new: &str, display: &DiffDisplay) {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    for (idx, group) in diff.grouped_ops(display.context).iter().enumerate() {
        if idx > 0 {
            println!("...");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, color) = match change.tag() {
                    ChangeTag::Delete => ("- ", "\x1b[31m"),
                    ChangeTag::Insert => ("+ ", "\x1b[32m"),
                    ChangeTag::Equal => ("  ", ""),
                };
                if display.colorize && !color.is_empty() {
                    print!("{color}{sign}{change}\x1b[0m");
                } else {
                    print!("{sign}{change}");
                }
            }
        }
    }
}

pub fn summarize_lines(old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);
    let mut added = 0usize;
    let mut removed = 0usize;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    format!("+{added} -{removed} lines")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_changed_lines() {
        let old = "a\nb\nc\n";
        let new = "a\nx\ny\nc\n";
        assert_eq!(summarize_lines(old, new), "+2 -1 lines");
    }

    #[test]
    fn identical_texts_summarize_to_zero() {
        assert_eq!(summarize_lines("same\n", "same\n"), "+0 -0 lines");
    }
}
