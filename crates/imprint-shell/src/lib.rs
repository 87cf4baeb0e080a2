//! External command execution for imprint.
//!
//! Path-dependent namespaces resolve their data by running programs such as
//! `git` inside the directory being rendered. [`ShellCommand`] runs one such
//! program to completion, with a timeout, and tells apart a program that is not
//! installed ([`ShellError::NotFound`]) from one that ran and failed.

pub mod shell;

pub use shell::{ShellCommand, ShellError};
