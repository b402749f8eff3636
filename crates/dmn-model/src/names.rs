//! Variable-name normalisation.
//!
//! DMN labels arrive with spaces, dashes, and punctuation; the variable
//! store keys on normalised names so FEEL expressions can reference them.

/// Normalise a DMN variable name:
/// - trim whitespace,
/// - collapse each run of whitespace or `-` into a single `_`,
/// - drop the characters `? # $ % & * ( )`,
/// - keep international letters.
///
/// Returns `None` when nothing normalisable remains or the first character
/// is not a letter or underscore.
pub fn normalise_variable_name(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.trim().chars() {
        if c.is_whitespace() || c == '-' {
            pending_separator = !out.is_empty();
            continue;
        }
        if matches!(c, '?' | '#' | '$' | '%' | '&' | '*' | '(' | ')') {
            continue;
        }
        if pending_separator {
            out.push('_');
            pending_separator = false;
        }
        out.push(c);
    }
    let mut chars = out.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return None,
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(out)
}

/// Soft predicate: can the name be normalised at all?
pub fn can_normalise_variable_name(name: &str) -> bool {
    normalise_variable_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_dashes_become_underscores() {
        assert_eq!(
            normalise_variable_name("CS Score").as_deref(),
            Some("CS_Score")
        );
        assert_eq!(
            normalise_variable_name("sole-trader flag").as_deref(),
            Some("sole_trader_flag")
        );
        assert_eq!(
            normalise_variable_name("  a   b  ").as_deref(),
            Some("a_b")
        );
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(
            normalise_variable_name("price ($)").as_deref(),
            Some("price")
        );
        assert_eq!(normalise_variable_name("pct%").as_deref(), Some("pct"));
    }

    #[test]
    fn leading_underscore_is_allowed() {
        assert_eq!(normalise_variable_name("_hidden").as_deref(), Some("_hidden"));
    }

    #[test]
    fn international_letters_survive() {
        assert_eq!(normalise_variable_name("prénom").as_deref(), Some("prénom"));
        assert_eq!(
            normalise_variable_name("名前 の").as_deref(),
            Some("名前_の")
        );
    }

    #[test]
    fn unusable_names_are_rejected() {
        assert!(!can_normalise_variable_name("123abc"));
        assert!(!can_normalise_variable_name("($)"));
        assert!(!can_normalise_variable_name(""));
        assert!(!can_normalise_variable_name("a.b"));
    }
}
