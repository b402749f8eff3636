use std::collections::HashMap;

/// Built-in multi-word function names the resolver must recognise even with
/// an empty user scope.
const BUILTIN_NAMES: &[&str] = &[
    "string length",
    "upper case",
    "lower case",
    "substring before",
    "substring after",
    "starts with",
    "ends with",
    "string join",
    "list contains",
    "insert before",
    "distinct values",
    "index of",
    "list replace",
    "round up",
    "round down",
    "round half up",
    "round half down",
    "date and time",
    "years and months duration",
    "day of year",
    "day of week",
    "month of year",
    "week of year",
    "get value",
    "get entries",
    "context put",
    "context merge",
    "met by",
    "overlaps before",
    "overlaps after",
    "started by",
    "finished by",
];

/// Registry of known names consulted by the name resolver when merging
/// adjacent name-like tokens into multi-word identifiers.
///
/// Seeded with the built-in multi-word function names; models add their own
/// multi-word variable names via [`ParseScope::add_name`].
#[derive(Debug, Clone)]
pub struct ParseScope {
    /// first word → known names starting with that word, each as a word list.
    by_first_word: HashMap<String, Vec<Vec<String>>>,
}

impl Default for ParseScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseScope {
    /// A scope containing only the built-in multi-word names.
    pub fn new() -> Self {
        let mut scope = Self {
            by_first_word: HashMap::new(),
        };
        for name in BUILTIN_NAMES {
            scope.add_name(name);
        }
        scope
    }

    /// A scope with the built-ins plus the given additional names.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Self::new();
        for name in names {
            scope.add_name(name.as_ref());
        }
        scope
    }

    /// Register a name. Single-word names are accepted but never require
    /// merging, so only multi-word names are stored.
    pub fn add_name(&mut self, name: &str) {
        let words: Vec<String> = name.split_whitespace().map(str::to_string).collect();
        if words.len() < 2 {
            return;
        }
        let entry = self.by_first_word.entry(words[0].clone()).or_default();
        if !entry.contains(&words) {
            entry.push(words);
        }
    }

    /// All known multi-word names whose first word is `word`.
    pub(crate) fn candidates(&self, word: &str) -> &[Vec<String>] {
        self.by_first_word
            .get(word)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
