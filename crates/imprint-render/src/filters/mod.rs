//! Filter tables.
//!
//! A [`Filter`] is any minijinja-callable function of `(value, ...args)`.
//! Filters are collected into a [`FilterTable`] by whoever assembles a render
//! session, and [`install`] registers the whole table on each per-call
//! environment.
//!
//! Two filters ship with the engine:
//!
//! - `comment(style="python", **overrides)` comments out text, see [`comment`]
//! - `read` returns the content of a UTF-8 text file, see [`read`]
//!
//! A third kind, [`Filter::from_template`], turns a template string into a
//! filter; the string is rendered with `value` and `args` bound.

pub mod comment;
pub mod read;

use std::fmt;

use indexmap::IndexMap;
use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult, Rest};
use minijinja::{context, Environment, Error, State, Value};

/// Filters by name, in registration order.
pub type FilterTable = IndexMap<String, Filter>;

/// A named-capability filter, cheap to clone.
#[derive(Clone)]
pub struct Filter {
    callable: Value,
}

impl Filter {
    /// Wraps a plain Rust function with minijinja argument conversion.
    pub fn new<F, Rv, Args>(f: F) -> Self
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        Self {
            callable: Value::from_function::<F, Rv, Args>(f),
        }
    }

    /// A filter whose body is a template. `value` is the filtered value and
    /// `args` the list of extra arguments.
    pub fn from_template(source: impl Into<String>) -> Self {
        let source = source.into();
        Self::new(
            move |state: &State, value: Value, args: Rest<Value>| -> Result<String, Error> {
                state
                    .env()
                    .render_str(&source, context! { value => value, args => args.0 })
            },
        )
    }

    pub fn call(&self, state: &State, args: &[Value]) -> Result<Value, Error> {
        self.callable.call(state, args)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// Built-in filters as `(name, constructor)` pairs.
pub fn builtins() -> [(&'static str, fn() -> Filter); 2] {
    [
        ("comment", || Filter::new(comment::comment)),
        ("read", || Filter::new(read::read)),
    ]
}

/// Registers every filter in `table` on `env`.
pub fn install(env: &mut Environment<'_>, table: &FilterTable) {
    for (name, filter) in table {
        let filter = filter.clone();
        env.add_filter(
            name.clone(),
            move |state: &State, value: Value, args: Rest<Value>| -> Result<Value, Error> {
                let mut argv = Vec::with_capacity(args.len() + 1);
                argv.push(value);
                argv.extend(args.0);
                filter.call(state, &argv)
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(table: &FilterTable, source: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        install(&mut env, table);
        env.render_str(source, context! { name => "world" })
    }

    #[test]
    fn test_plain_function_filter() {
        let mut table = FilterTable::new();
        table.insert(
            "shout".into(),
            Filter::new(|value: String| value.to_uppercase()),
        );
        assert_eq!(render(&table, "{{ name | shout }}").unwrap(), "WORLD");
    }

    #[test]
    fn test_filter_with_arguments() {
        let mut table = FilterTable::new();
        table.insert(
            "wrap".into(),
            Filter::new(|value: String, left: String, right: String| format!("{left}{value}{right}")),
        );
        assert_eq!(
            render(&table, "{{ name | wrap('<', '>') }}").unwrap(),
            "<world>"
        );
    }

    #[test]
    fn test_template_filter() {
        let mut table = FilterTable::new();
        table.insert(
            "greet".into(),
            Filter::from_template("{{ args[0] }}, {{ value }}!"),
        );
        assert_eq!(
            render(&table, "{{ name | greet('Hello') }}").unwrap(),
            "Hello, world!"
        );
    }

    #[test]
    fn test_builtins_install() {
        let table: FilterTable = builtins()
            .into_iter()
            .map(|(name, make)| (name.to_string(), make()))
            .collect();
        assert_eq!(
            render(&table, "{{ name | comment }}").unwrap(),
            "# world"
        );
    }

    #[test]
    fn test_unknown_filter_fails() {
        assert!(render(&FilterTable::new(), "{{ name | nope }}").is_err());
    }
}
