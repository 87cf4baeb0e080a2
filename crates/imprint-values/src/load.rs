//! Assembling the values tree from every source.
//!
//! Precedence, lowest to highest:
//!
//! 1. values files, merged left to right
//! 2. `KEY=VALUE` overrides, dot-expanded
//! 3. a structured payload piped on stdin

use std::path::Path;

use tracing::debug;

use crate::dotpath::expand;
use crate::env::StdinReader;
use crate::error::{Result, ValuesError};
use crate::formats::{load_files, Format};
use crate::merge::{deep_merge, ValueTree};

/// Reads a structured payload from stdin when it is piped.
///
/// Returns `Ok(None)` when stdin is a terminal or the payload is blank.
pub fn read_piped<R: StdinReader + ?Sized>(reader: &R, format: Format) -> Result<Option<ValueTree>> {
    if reader.is_terminal() {
        return Ok(None);
    }
    let content = reader.read_to_string().map_err(ValuesError::StdinFailed)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    format.parse(&content, "<stdin>").map(Some)
}

/// Builds the unified values tree.
///
/// `overrides` holds dot-notation keys as produced by
/// [`parse_assignments`](crate::autocast::parse_assignments).
pub fn load_values<P: AsRef<Path>>(
    files: &[P],
    overrides: &ValueTree,
    piped: Option<&ValueTree>,
) -> Result<ValueTree> {
    let mut bundle = load_files(files)?;

    if !overrides.is_empty() {
        debug!(keys = ?overrides.keys().collect::<Vec<_>>(), "Expanding dot-notation values");
        let expanded = expand(overrides)?;
        deep_merge(&mut bundle, &expanded);
    }

    if let Some(piped) = piped {
        debug!(keys = piped.len(), "Merging piped values");
        deep_merge(&mut bundle, piped);
    }

    Ok(bundle)
}
