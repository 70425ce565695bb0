// Canonical comparison form for fuzzy matching. Comments, symbol-adjacent
// spacing, and whitespace runs are collapsed away, while `mapping` records
// for every surviving character the offset it came from, so a span found in
// normalized space can be translated back onto the untouched original.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub content: Vec<char>,
    pub mapping: Vec<usize>,
}

impl Normalized {
    fn with_capacity(cap: usize) -> Self {
        Normalized {
            content: Vec::with_capacity(cap),
            mapping: Vec::with_capacity(cap),
        }
    }

    fn push(&mut self, ch: char, source: usize) {
        self.content.push(ch);
        self.mapping.push(source);
    }

    fn pop(&mut self) {
        self.content.pop();
        self.mapping.pop();
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

pub fn normalize(text: &str) -> Normalized {
    let chars: Vec<char> = text.chars().collect();
    let no_comments = strip_comments(&chars);
    let no_symbol_spaces = strip_symbol_spaces(&no_comments.content);
    let collapsed = collapse_whitespace(&no_symbol_spaces.content);

    // Each stage maps into its own input; resolve the chain back to offsets
    // in the text passed to this function.
    let mapping = collapsed
        .mapping
        .iter()
        .map(|&idx| no_comments.mapping[no_symbol_spaces.mapping[idx]])
        .collect();

    Normalized {
        content: collapsed.content,
        mapping,
    }
}

pub fn normalize_pattern(pattern: &str) -> Vec<char> {
    normalize(pattern).content
}

// `//` comments drop up to (not including) the line-terminating newline, so
// line alignment of the surrounding code survives. `/* ... */` spans drop
// entirely, newlines included; an unterminated block drops to end of input.
// No string-literal awareness: this is a comparison transform, not a parser.
fn strip_comments(input: &[char]) -> Normalized {
    let mut out = Normalized::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == '/' && i + 1 < input.len() {
            match input[i + 1] {
                '/' => {
                    i += 2;
                    while i < input.len() && input[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '*' => {
                    i += 2;
                    while i + 1 < input.len() && !(input[i] == '*' && input[i + 1] == '/') {
                        i += 1;
                    }
                    i = if i + 1 < input.len() { i + 2 } else { input.len() };
                    continue;
                }
                _ => {}
            }
        }
        out.push(input[i], i);
        i += 1;
    }
    out
}

fn is_symbol(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-'
            | '/'
            | '*'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | ';'
            | '='
            | ','
            | '\''
            | '"'
            | '`'
            | '!'
            | '&'
            | '|'
            | '<'
            | '>'
    )
}

// Drops horizontal whitespace whose nearest non-whitespace neighbor on
// either side is a symbol. Newlines are never dropped here; whitespace
// between two ordinary tokens is left alone.
fn strip_symbol_spaces(input: &[char]) -> Normalized {
    let mut out = Normalized::with_capacity(input.len());
    let mut prev_non_ws: Option<char> = None;
    for (i, &ch) in input.iter().enumerate() {
        if ch.is_whitespace() && ch != '\n' {
            let before_symbol = prev_non_ws.is_some_and(is_symbol);
            let after_symbol = input[i + 1..]
                .iter()
                .find(|c| !c.is_whitespace())
                .copied()
                .is_some_and(is_symbol);
            if before_symbol || after_symbol {
                continue;
            }
        } else if !ch.is_whitespace() {
            prev_non_ws = Some(ch);
        }
        out.push(ch, i);
    }
    out
}

// Runs of horizontal whitespace become one space, runs of newlines (with
// any horizontal whitespace between them) become one newline, and the whole
// text is trimmed at both ends. A pending space maps to the first whitespace
// character of its run.
fn collapse_whitespace(input: &[char]) -> Normalized {
    let mut out = Normalized::with_capacity(input.len());
    let mut at_line_start = true;
    let mut pending_space: Option<usize> = None;

    for (i, &ch) in input.iter().enumerate() {
        if ch == '\n' {
            pending_space = None;
            if !out.is_empty() && out.content.last() != Some(&'\n') {
                out.push('\n', i);
            }
            at_line_start = true;
        } else if ch.is_whitespace() {
            if !at_line_start && pending_space.is_none() {
                pending_space = Some(i);
            }
        } else {
            if let Some(space_idx) = pending_space.take() {
                out.push(' ', space_idx);
            }
            out.push(ch, i);
            at_line_start = false;
        }
    }

    while out.content.last() == Some(&'\n') {
        out.pop();
    }
    out
}
