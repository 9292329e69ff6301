//! Input name expansion.
//!
//! Command-line input tokens name files three ways: a plain path, a glob
//! pattern, or `@file` naming a text file with one path per line. This
//! module expands all three into the flat, ordered path list the mosaic
//! paints in. Token order is preserved; glob matches expand in alphabetical
//! order at their token's position. Expansion never checks that a plain
//! path exists, so missing files surface later when they are opened.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while expanding input tokens.
#[derive(Debug, Error)]
pub enum InputError {
    /// An `@file` input list could not be read.
    #[error("Cannot open input list '{}'", path.display())]
    ListFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A glob token is not a valid pattern.
    #[error("Invalid glob pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A glob token expanded to nothing.
    #[error("No input files matched '{pattern}'")]
    NoMatch { pattern: String },

    /// A matched directory entry could not be read while globbing.
    #[error(transparent)]
    Walk(#[from] glob::GlobError),
}

/// Expands input tokens into an ordered path list.
///
/// # Arguments
///
/// * `tokens` - Raw input arguments: plain paths, glob patterns, or
///   `@file` list references
///
/// # Errors
///
/// Returns `InputError` if a list file cannot be read, a glob pattern is
/// malformed or matches nothing, or a matched entry cannot be read.
pub fn expand_inputs(tokens: &[String]) -> Result<Vec<PathBuf>, InputError> {
    let mut paths = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(list) = token.strip_prefix('@') {
            expand_list_file(list, &mut paths)?;
        } else if has_glob_meta(token) {
            expand_pattern(token, &mut paths)?;
        } else {
            paths.push(PathBuf::from(token));
        }
    }
    Ok(paths)
}

/// Appends every non-empty line of a list file, verbatim after trimming.
fn expand_list_file(list: &str, paths: &mut Vec<PathBuf>) -> Result<(), InputError> {
    let path = PathBuf::from(list);
    let contents = std::fs::read_to_string(&path).map_err(|source| InputError::ListFile {
        path: path.clone(),
        source,
    })?;
    for line in contents.lines() {
        let line = line.trim();
        if !line.is_empty() {
            paths.push(PathBuf::from(line));
        }
    }
    Ok(())
}

/// Appends glob matches in the alphabetical order the walker yields them.
fn expand_pattern(pattern: &str, paths: &mut Vec<PathBuf>) -> Result<(), InputError> {
    let matches = glob::glob(pattern).map_err(|source| InputError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let before = paths.len();
    for entry in matches {
        paths.push(entry?);
    }
    if paths.len() == before {
        return Err(InputError::NoMatch {
            pattern: pattern.to_string(),
        });
    }
    Ok(())
}

#[inline]
fn has_glob_meta(token: &str) -> bool {
    token.contains(['*', '?', '['])
}
