//! Multi-word name resolution over the raw token stream.
//!
//! FEEL allows identifiers containing spaces ("string length", "Monthly
//! Salary"). The lexer emits each word as its own token; this pass merges
//! runs of name-like tokens into a single `Name` token whenever the run
//! matches a name known to the [`ParseScope`], longest match winning.

use crate::scope::ParseScope;
use crate::token::{Channel, Token, TokenKind};

/// Merge multi-word names and drop hidden-channel tokens.
///
/// Name-like tokens are `Name` plus the keywords that may appear inside
/// multi-word names (`and`, `in`, `of`, `not`). Words of a candidate name
/// must be separated only by hidden whitespace.
pub fn resolve_names(tokens: &[Token], scope: &ParseScope) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.channel == Channel::Hidden {
            i += 1;
            continue;
        }
        if !token.kind.is_name_like() {
            out.push(token.clone());
            i += 1;
            continue;
        }

        // Collect the contiguous run of name-like words starting here.
        let (words, positions) = collect_run(tokens, i);
        let matched = longest_match(scope, &words);
        if matched >= 2 {
            let merged = words[..matched].join(" ");
            out.push(Token::new(
                TokenKind::Name,
                merged,
                token.line,
                token.column,
            ));
            i = positions[matched - 1] + 1;
        } else {
            out.push(token.clone());
            i += 1;
        }
    }
    out
}

/// Consecutive name-like words from `start`, skipping hidden tokens between
/// them. Returns the word texts and the token index of each word.
fn collect_run(tokens: &[Token], start: usize) -> (Vec<String>, Vec<usize>) {
    let mut words = Vec::new();
    let mut positions = Vec::new();
    let mut i = start;
    while i < tokens.len() {
        let t = &tokens[i];
        if t.channel == Channel::Hidden {
            i += 1;
            continue;
        }
        if !t.kind.is_name_like() {
            break;
        }
        words.push(t.text.clone());
        positions.push(i);
        i += 1;
    }
    (words, positions)
}

/// Longest known-name prefix of `words`, in words; 0 when nothing matches.
fn longest_match(scope: &ParseScope, words: &[String]) -> usize {
    let Some(first) = words.first() else {
        return 0;
    };
    let mut best = 0;
    for candidate in scope.candidates(first) {
        if candidate.len() <= words.len()
            && candidate.len() > best
            && candidate
                .iter()
                .zip(words)
                .all(|(c, w)| c == w)
        {
            best = candidate.len();
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn resolve(source: &str, scope: &ParseScope) -> Vec<(TokenKind, String)> {
        let tokens = tokenize(source).unwrap();
        resolve_names(&tokens, scope)
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn merges_builtin_function_name() {
        let scope = ParseScope::new();
        let tokens = resolve("string length(\"x\")", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "string length".to_string()));
        assert_eq!(tokens[1].0, TokenKind::LParen);
    }

    #[test]
    fn longest_match_wins() {
        let mut scope = ParseScope::new();
        scope.add_name("date and");
        let tokens = resolve("date and time(x)", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "date and time".to_string()));
    }

    #[test]
    fn unknown_run_passes_through() {
        let scope = ParseScope::new();
        let tokens = resolve("foo bar", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "foo".to_string()));
        assert_eq!(tokens[1], (TokenKind::Name, "bar".to_string()));
    }

    #[test]
    fn keywords_inside_names_merge() {
        let scope = ParseScope::with_names(["not in list"]);
        let tokens = resolve("not in list", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "not in list".to_string()));
    }

    #[test]
    fn keyword_not_merged_without_scope_entry() {
        let scope = ParseScope::new();
        let tokens = resolve("x and y", &scope);
        assert_eq!(tokens[1].0, TokenKind::And);
    }

    #[test]
    fn user_variable_names_merge() {
        let scope = ParseScope::with_names(["Monthly Salary"]);
        let tokens = resolve("Monthly Salary * 12", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "Monthly Salary".to_string()));
        assert_eq!(tokens[1].0, TokenKind::Star);
    }

    #[test]
    fn hidden_tokens_are_dropped() {
        let scope = ParseScope::new();
        let tokens = resolve("1 + 2", &scope);
        assert_eq!(tokens.len(), 4); // 1, +, 2, eof
    }

    #[test]
    fn normalises_internal_whitespace() {
        let scope = ParseScope::with_names(["Monthly Salary"]);
        let tokens = resolve("Monthly   Salary", &scope);
        assert_eq!(tokens[0], (TokenKind::Name, "Monthly Salary".to_string()));
    }
}
