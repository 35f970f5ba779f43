//! Environment snapshot and `${VAR}` placeholder substitution.
//!
//! The loader never reads the process environment on its own; callers capture
//! a snapshot once and pass it in.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Why a placeholder could not be substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstituteError {
    /// `${NAME}` where NAME is not in the snapshot
    Missing(String),
    /// Unterminated `${` or an invalid variable name
    Malformed,
}

/// Immutable copy of an environment variable table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Copy the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn capture() -> Self {
        let vars: BTreeMap<_, _> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        log::debug!("Captured environment snapshot with {} variables", vars.len());
        Self { vars }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Directories listed in `PATH`, in order
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.get("PATH")
            .map(|path| std::env::split_paths(path).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default()
    }

    /// Replace every `${NAME}` in `text` with its value.
    ///
    /// `$${` yields a literal `${`. A `$` not followed by `{` is kept as is.
    pub fn substitute(&self, text: &str) -> Result<String, SubstituteError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(escaped) = after.strip_prefix("${") {
                out.push_str("${");
                rest = escaped;
            } else if let Some(body) = after.strip_prefix('{') {
                let end = body.find('}').ok_or(SubstituteError::Malformed)?;
                let name = &body[..end];
                if !is_valid_name(name) {
                    return Err(SubstituteError::Malformed);
                }
                let value = self.get(name).ok_or_else(|| SubstituteError::Missing(name.to_string()))?;
                out.push_str(value);
                rest = &body[end + 1..];
            } else {
                out.push('$');
                rest = after;
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
