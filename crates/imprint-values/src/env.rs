//! Process state behind traits: piped stdin and the environment.
//!
//! [`read_piped`](crate::read_piped) and the `env` namespace read process
//! state only through [`StdinReader`] and [`EnvReader`], so tests can hand
//! them a [`MockStdin`] or [`MockEnv`] instead.

use std::io::{self, IsTerminal, Read};

pub trait StdinReader: Send + Sync {
    /// `true` when nothing is piped in.
    fn is_terminal(&self) -> bool;

    /// Drains stdin. Only meaningful when [`is_terminal`](Self::is_terminal)
    /// is `false`.
    fn read_to_string(&self) -> io::Result<String>;
}

pub trait EnvReader: Send + Sync {
    /// Every variable whose name and value are valid unicode.
    fn vars(&self) -> Vec<(String, String)>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealStdin;

impl StdinReader for RealStdin {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_to_string(&self) -> io::Result<String> {
        let mut payload = String::new();
        io::stdin().lock().read_to_string(&mut payload)?;
        Ok(payload)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

/// Stdin stand-in: either a terminal or a fixed piped payload.
#[derive(Debug, Clone)]
pub struct MockStdin {
    payload: Option<String>,
}

impl MockStdin {
    pub fn terminal() -> Self {
        Self { payload: None }
    }

    pub fn piped(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }
}

impl StdinReader for MockStdin {
    fn is_terminal(&self) -> bool {
        self.payload.is_none()
    }

    fn read_to_string(&self) -> io::Result<String> {
        Ok(self.payload.clone().unwrap_or_default())
    }
}

/// Environment stand-in. Variables keep insertion order; setting a name
/// twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: Vec<(String, String)>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.vars.retain(|(existing, _)| *existing != name);
        self.vars.push((name, value.into()));
        self
    }
}

impl EnvReader for MockEnv {
    fn vars(&self) -> Vec<(String, String)> {
        self.vars.clone()
    }
}
