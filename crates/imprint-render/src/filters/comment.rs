//! The `comment` filter.
//!
//! ```text
//! {{ license | comment }}                     -> # line one / # line two
//! {{ license | comment('cblock') }}           -> /* / * line one / */
//! {{ license | comment('sql', prefix_count=1) }}
//! ```
//!
//! Styles come in families that share the same decoration:
//!
//! | Family  | Styles |
//! |---------|--------|
//! | pound   | `python`, `bash`, `ruby`, `perl`, `yaml`, `toml`, `powershell` |
//! | percent | `erlang` |
//! | csingle | `c`, `cpp`, `csharp`, `java`, `javascript`, `js`, `swift`, `openscad` |
//! | cblock  | `cblock`, `cppblock`, `csharpblock`, `javablock`, `javascriptblock`, `jsblock`, `swiftblock`, `openscadblock` |
//! | cdoc    | `cdoc`, `doxygen`, `javadoc`, `phpdoc`, `jsdoc` |
//! | pydoc   | `pydoc` |
//! | markup  | `html`, `xml` |
//! | db      | `sql` |
//!
//! A falsy style (`''` or `false`) returns the text untouched, which keeps
//! conditional use short: `comment(style if wanted else '')`.

use minijinja::value::Kwargs;
use minijinja::{Error, ErrorKind, Value};

pub const DEFAULT_STYLE: &str = "python";

struct Family {
    beginning: &'static str,
    decoration: &'static str,
    end: &'static str,
    prefix_count: usize,
    styles: &'static [&'static str],
}

const FAMILIES: &[Family] = &[
    Family {
        beginning: "",
        decoration: "# ",
        end: "",
        prefix_count: 0,
        styles: &["python", "bash", "ruby", "perl", "yaml", "toml", "powershell"],
    },
    Family {
        beginning: "",
        decoration: "% ",
        end: "",
        prefix_count: 0,
        styles: &["erlang"],
    },
    Family {
        beginning: "",
        decoration: "// ",
        end: "",
        prefix_count: 0,
        styles: &["c", "cpp", "csharp", "java", "javascript", "js", "swift", "openscad"],
    },
    Family {
        beginning: "/*",
        decoration: " * ",
        end: " */",
        prefix_count: 0,
        styles: &[
            "cblock",
            "cppblock",
            "csharpblock",
            "javablock",
            "javascriptblock",
            "jsblock",
            "swiftblock",
            "openscadblock",
        ],
    },
    Family {
        beginning: "/**",
        decoration: " * ",
        end: " */",
        prefix_count: 0,
        styles: &["cdoc", "doxygen", "javadoc", "phpdoc", "jsdoc"],
    },
    Family {
        beginning: "\"\"\"",
        decoration: "",
        end: "\"\"\"",
        prefix_count: 1,
        styles: &["pydoc"],
    },
    Family {
        beginning: "<!--",
        decoration: " - ",
        end: "-->",
        prefix_count: 0,
        styles: &["html", "xml"],
    },
    Family {
        beginning: "",
        decoration: "-- ",
        end: "",
        prefix_count: 0,
        styles: &["sql"],
    },
];

/// Every style name `comment` accepts.
pub fn styles() -> impl Iterator<Item = &'static str> {
    FAMILIES.iter().flat_map(|family| family.styles.iter().copied())
}

/// Fully resolved comment layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStyle {
    pub newline: String,
    pub beginning: String,
    pub prefix: String,
    pub prefix_count: usize,
    pub decoration: String,
    pub postfix: String,
    pub postfix_count: usize,
    pub end: String,
}

impl CommentStyle {
    /// Looks up a style by name. Prefix and postfix default to the
    /// decoration with trailing whitespace removed.
    pub fn named(style: &str) -> Option<Self> {
        let family = FAMILIES
            .iter()
            .find(|family| family.styles.contains(&style))?;
        let bar = family.decoration.trim_end().to_string();
        Some(Self {
            newline: "\n".into(),
            beginning: family.beginning.into(),
            prefix: bar.clone(),
            prefix_count: family.prefix_count,
            decoration: family.decoration.into(),
            postfix: bar,
            postfix_count: 0,
            end: family.end.into(),
        })
    }

    fn with_overrides(mut self, kwargs: &Kwargs) -> Result<Self, Error> {
        if let Some(decoration) = kwargs.get::<Option<String>>("decoration")? {
            let bar = decoration.trim_end().to_string();
            self.prefix = bar.clone();
            self.postfix = bar;
            self.decoration = decoration;
        }
        if let Some(newline) = kwargs.get::<Option<String>>("newline")? {
            self.newline = newline;
        }
        if let Some(beginning) = kwargs.get::<Option<String>>("beginning")? {
            self.beginning = beginning;
        }
        if let Some(prefix) = kwargs.get::<Option<String>>("prefix")? {
            self.prefix = prefix;
        }
        if let Some(count) = kwargs.get::<Option<usize>>("prefix_count")? {
            self.prefix_count = count;
        }
        if let Some(postfix) = kwargs.get::<Option<String>>("postfix")? {
            self.postfix = postfix;
        }
        if let Some(count) = kwargs.get::<Option<usize>>("postfix_count")? {
            self.postfix_count = count;
        }
        if let Some(end) = kwargs.get::<Option<String>>("end")? {
            self.end = end;
        }
        if self.newline.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "comment newline must not be empty",
            ));
        }
        Ok(self)
    }

    pub fn apply(&self, text: &str) -> String {
        let nl = self.newline.as_str();
        let mut out = String::with_capacity(text.len() * 2);

        if !self.beginning.is_empty() {
            out.push_str(&self.beginning);
            out.push_str(nl);
        }

        if !self.prefix.is_empty() {
            for _ in 0..self.prefix_count {
                if self.prefix != nl {
                    out.push_str(&self.prefix);
                }
                out.push_str(nl);
            }
        }

        let decorated = format!(
            "{}{}",
            self.decoration,
            text.replace(nl, &format!("{}{}", nl, self.decoration))
        );
        // Lines holding only the decoration lose its trailing whitespace.
        let bare = format!("{}{}", self.decoration.trim_end(), nl);
        out.push_str(&decorated.replace(&format!("{}{}", self.decoration, nl), &bare));

        for _ in 0..self.postfix_count {
            out.push_str(nl);
            out.push_str(&self.postfix);
        }

        if !self.end.is_empty() {
            out.push_str(nl);
            out.push_str(&self.end);
        }

        out
    }
}

/// `{{ text | comment(style="python", **overrides) }}`
pub fn comment(text: String, style: Option<Value>, kwargs: Kwargs) -> Result<String, Error> {
    let style = match style {
        Some(style) => style,
        None => kwargs
            .get::<Option<Value>>("style")?
            .unwrap_or_else(|| Value::from(DEFAULT_STYLE)),
    };
    if !style.is_true() {
        return Ok(text);
    }
    let name = style.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("comment style must be a string, got {}", style.kind()),
        )
    })?;
    let layout = CommentStyle::named(name)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!(
                    "unknown comment style `{}`, expected one of: {}",
                    name,
                    styles().collect::<Vec<_>>().join(", ")
                ),
            )
        })?
        .with_overrides(&kwargs)?;
    kwargs.assert_all_used()?;
    Ok(layout.apply(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::{context, Environment};

    fn render(source: &str, text: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        env.add_filter("comment", comment);
        env.render_str(source, context! { text => text })
    }

    #[test]
    fn test_default_is_python() {
        assert_eq!(
            render("{{ text | comment }}", "one\ntwo").unwrap(),
            "# one\n# two"
        );
    }

    #[test]
    fn test_blank_lines_lose_trailing_space() {
        assert_eq!(
            render("{{ text | comment('sql') }}", "a\n\nb").unwrap(),
            "-- a\n--\n-- b"
        );
    }

    #[test]
    fn test_block_styles() {
        assert_eq!(
            render("{{ text | comment('cblock') }}", "a\nb").unwrap(),
            "/*\n * a\n * b\n */"
        );
        assert_eq!(
            render("{{ text | comment('javadoc') }}", "a").unwrap(),
            "/**\n * a\n */"
        );
        assert_eq!(
            render("{{ text | comment('html') }}", "a").unwrap(),
            "<!--\n - a\n-->"
        );
    }

    #[test]
    fn test_pydoc_has_no_decoration() {
        assert_eq!(
            render("{{ text | comment('pydoc') }}", "a\nb").unwrap(),
            "\"\"\"\na\nb\n\"\"\""
        );
    }

    #[test]
    fn test_prefix_and_postfix_counts() {
        assert_eq!(
            render(
                "{{ text | comment('bash', prefix_count=1, postfix_count=2) }}",
                "x"
            )
            .unwrap(),
            "#\n# x\n#\n#"
        );
    }

    #[test]
    fn test_style_as_keyword() {
        assert_eq!(
            render("{{ text | comment(style='erlang') }}", "x").unwrap(),
            "% x"
        );
    }

    #[test]
    fn test_falsy_style_returns_text() {
        assert_eq!(render("{{ text | comment('') }}", "x").unwrap(), "x");
        assert_eq!(render("{{ text | comment(false) }}", "x").unwrap(), "x");
    }

    #[test]
    fn test_unknown_style_fails() {
        let err = render("{{ text | comment('cobol') }}", "x").unwrap_err();
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_unknown_override_fails() {
        assert!(render("{{ text | comment(colour='red') }}", "x").is_err());
    }

    #[test]
    fn test_every_style_resolves() {
        for style in styles() {
            assert!(CommentStyle::named(style).is_some(), "{style}");
        }
        assert_eq!(styles().count(), 33);
    }
}
