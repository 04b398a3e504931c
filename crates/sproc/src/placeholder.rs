// Placeholder Expander
// Resolves @NAME@ / @NAME%type@ tokens against the replace-pair table and
// substitutes them (plus magic constants) into the routine source

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::{Diagnostic, Span};
use crate::error::CompileErrorKind;
use crate::source_scanner::SourceFile;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_.]+(?i:%type)?@").expect("placeholder pattern"));

pub const MAGIC_FILE: &str = "__FILE__";
pub const MAGIC_DIR: &str = "__DIR__";
pub const MAGIC_ROUTINE: &str = "__ROUTINE__";
pub const MAGIC_LINE: &str = "__LINE__";

/// Caller-supplied placeholder values. Tokens are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacePairs {
    /// Uppercased token → literal replacement
    pairs: HashMap<String, String>,
}

impl ReplacePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a placeholder value
    pub fn insert(&mut self, token: &str, value: impl Into<String>) {
        self.pairs.insert(token.to_uppercase(), value.into());
    }

    /// Add a placeholder value unless the token is already defined
    pub fn insert_if_absent(&mut self, token: &str, value: impl Into<String>) {
        self.pairs
            .entry(token.to_uppercase())
            .or_insert_with(|| value.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.pairs.get(&token.to_uppercase()).map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ReplacePairs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs = ReplacePairs::new();
        for (token, value) in iter {
            pairs.insert(token.as_ref(), value);
        }
        pairs
    }
}

/// Find every placeholder in the source and resolve it.
///
/// Returns the substitution map limited to the placeholders actually present,
/// keyed by the token as written and sorted by token. Entries of the table the
/// source doesn't use are ignored. All unresolved tokens are reported together.
pub fn expand_placeholders(
    source: &SourceFile,
    pairs: &ReplacePairs,
) -> Result<BTreeMap<String, String>, CompileErrorKind> {
    let mut resolved = BTreeMap::new();
    let mut unknown = BTreeSet::new();
    let mut occurrences = Vec::new();

    for (line_index, line) in source.lines.iter().enumerate() {
        for found in PLACEHOLDER.find_iter(line) {
            let token = found.as_str();
            match pairs.get(token) {
                Some(value) => {
                    resolved.insert(token.to_string(), value.to_string());
                }
                None => {
                    unknown.insert(token.to_string());
                    let column = line[..found.start()].chars().count();
                    occurrences.push(Diagnostic::error(
                        format!("Unknown placeholder '{}': {}", token, line.trim()),
                        Span::on_line(line_index, column, token.chars().count()),
                    ));
                }
            }
        }
    }

    if unknown.is_empty() {
        Ok(resolved)
    } else {
        Err(CompileErrorKind::UnknownPlaceholder {
            placeholders: unknown.into_iter().collect(),
            occurrences,
        })
    }
}

#[derive(Debug, Clone)]
enum Replacement {
    Literal(String),
    LineNumber,
}

/// The final substitution set applied to the source before loading.
///
/// Replacement is simultaneous and longest-key-first, so a replaced value is
/// never scanned again.
#[derive(Debug, Clone)]
pub struct Substitution {
    entries: Vec<(String, Replacement)>,
}

impl Substitution {
    /// Substitution of the expanded placeholders only
    pub fn new(placeholders: &BTreeMap<String, String>) -> Self {
        let mut substitution = Self {
            entries: Vec::new(),
        };
        for (token, value) in placeholders {
            substitution.push(token, Replacement::Literal(value.clone()));
        }
        substitution
    }

    /// Add the magic constants. `file`, `dir` and `routine` are inserted as
    /// given, so callers pass them already quoted as SQL literals.
    pub fn with_magic_constants(mut self, file: String, dir: String, routine: String) -> Self {
        self.push(MAGIC_FILE, Replacement::Literal(file));
        self.push(MAGIC_DIR, Replacement::Literal(dir));
        self.push(MAGIC_ROUTINE, Replacement::Literal(routine));
        self.push(MAGIC_LINE, Replacement::LineNumber);
        self
    }

    fn push(&mut self, key: &str, replacement: Replacement) {
        if key.is_empty() {
            return;
        }
        self.entries.retain(|(existing, _)| existing != key);
        self.entries.push((key.to_string(), replacement));
        self.entries
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    }

    /// Substitute a single line; `line_number` is 1-based
    pub fn apply_line(&self, line: &str, line_number: usize) -> String {
        let mut output = String::with_capacity(line.len());
        let mut rest = line;

        'scan: while !rest.is_empty() {
            for (key, replacement) in &self.entries {
                if rest.starts_with(key.as_str()) {
                    match replacement {
                        Replacement::Literal(value) => output.push_str(value),
                        Replacement::LineNumber => output.push_str(&line_number.to_string()),
                    }
                    rest = &rest[key.len()..];
                    continue 'scan;
                }
            }

            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                output.push(ch);
            }
            rest = chars.as_str();
        }

        output
    }

    /// Substitute all lines and join them back into one statement
    pub fn apply(&self, lines: &[String]) -> String {
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| self.apply_line(line, index + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
#[path = "placeholder/placeholder_tests.rs"]
mod placeholder_tests;
