//! Layered value trees for imprint.
//!
//! `imprint-values` builds the nested mapping that templates see as `values`,
//! and the configuration tree that drives imprint itself. Both are produced the
//! same way: zero or more structured sources merged left to right.
//!
//! # Quick Start
//!
//! ```ignore
//! use imprint_values::{load_values, parse_assignments, read_piped, Format, RealStdin};
//!
//! let overrides = parse_assignments(["name=World", "db.port=5432"])?;
//! let piped = read_piped(&RealStdin, Format::Yaml)?;
//! let values = load_values(&["values.toml"], &overrides, piped.as_ref())?;
//! ```
//!
//! # Merge Semantics
//!
//! [`deep_merge`] never replaces a nested mapping wholesale: mappings present on
//! both sides are merged key by key, and any non-mapping value overwrites what
//! was there before. See [`merge`] for details.
//!
//! # Testing
//!
//! Stdin and environment access go through [`StdinReader`] and [`EnvReader`],
//! with [`MockStdin`] and [`MockEnv`] for tests.

pub mod autocast;
pub mod dotpath;
pub mod env;
mod error;
pub mod formats;
mod load;
pub mod merge;

pub use autocast::{autocast, booleanize, parse_assignments};
pub use dotpath::{expand, flatten};
pub use env::{EnvReader, MockEnv, MockStdin, RealEnv, RealStdin, StdinReader};
pub use error::{Result, ValuesError};
pub use formats::{load_file, load_files, Format};
pub use load::{load_values, read_piped};
pub use merge::{deep_merge, merge_all, subtree, ValueTree};
