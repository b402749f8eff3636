//! DMN expression text pre-processing.
//!
//! DMN models in the wild write temporal constructors with unquoted literal
//! arguments: `date(2024-01-15)`, `duration(P3Y)`. FEEL requires string
//! arguments, so this pass rewrites them to `date("2024-01-15")` before
//! parsing. String literals are left untouched; an argument qualifies only
//! when it starts with a digit, `P`, or `T` followed by a digit, and consists
//! of literal characters (no commas, quotes, or nested parentheses — the
//! three-argument numeric form `date(2024, 1, 15)` must survive unchanged).

/// Constructors subject to the rewrite, longest name first.
const CONSTRUCTORS: &[&str] = &["date and time", "date", "time", "duration"];

pub fn rewrite_constructor_shorthand(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    let mut in_string = false;
    let mut prev_is_name_char = false;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            prev_is_name_char = false;
            continue;
        }
        if !prev_is_name_char && (c.is_alphabetic() || c == '_') {
            if let Some((name, arg, next)) = try_constructor(&chars, i) {
                out.push_str(name);
                out.push_str("(\"");
                out.push_str(&arg);
                out.push_str("\")");
                i = next;
                prev_is_name_char = false;
                continue;
            }
        }
        prev_is_name_char = c.is_alphanumeric() || c == '_';
        out.push(c);
        i += 1;
    }
    out
}

/// Try to match `constructor ( literal-arg )` at position `i`. Returns the
/// canonical constructor name, the argument text, and the index just past
/// the closing parenthesis.
fn try_constructor(chars: &[char], i: usize) -> Option<(&'static str, String, usize)> {
    for name in CONSTRUCTORS {
        if let Some(after_open) = match_words_then_paren(chars, i, name) {
            if let Some((arg, next)) = literal_argument(chars, after_open) {
                return Some((name, arg, next));
            }
        }
    }
    None
}

/// Match the constructor's words (whitespace-separated, word boundaries
/// honoured) followed by optional whitespace and `(`. Returns the index
/// just past the `(`.
fn match_words_then_paren(chars: &[char], start: usize, name: &str) -> Option<usize> {
    let mut i = start;
    let mut words = name.split(' ').peekable();
    while let Some(word) = words.next() {
        for expected in word.chars() {
            if chars.get(i) != Some(&expected) {
                return None;
            }
            i += 1;
        }
        // Word boundary: the next char must not extend the identifier.
        if chars
            .get(i)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            return None;
        }
        if words.peek().is_some() {
            let ws_start = i;
            while chars.get(i).is_some_and(|c| c.is_whitespace()) {
                i += 1;
            }
            if i == ws_start {
                return None;
            }
        }
    }
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    if chars.get(i) == Some(&'(') {
        Some(i + 1)
    } else {
        None
    }
}

/// Scan a qualifying unquoted literal argument up to `)`.
fn literal_argument(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut i = open;
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    let first = *chars.get(i)?;
    let second_is_digit = chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());
    let qualifies = first.is_ascii_digit() || first == 'P' || (first == 'T' && second_is_digit);
    if !qualifies {
        return None;
    }
    let mut arg = String::new();
    while let Some(&c) = chars.get(i) {
        if c == ')' {
            return Some((arg, i + 1));
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '+' | '-')) {
            return None;
        }
        arg.push(c);
        i += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
