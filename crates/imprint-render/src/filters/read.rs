//! The `read` filter: `{{ "LICENSE" | read }}` inlines a text file.
//!
//! Relative paths resolve against the process working directory.

use std::fs;

use minijinja::{Error, ErrorKind};

pub fn read(path: String) -> Result<String, Error> {
    fs::read_to_string(&path).map_err(|err| {
        Error::new(ErrorKind::InvalidOperation, format!("cannot read `{path}`")).with_source(err)
    })
}
