//! Parser for the `name` / `name(arg, ...)` syntax used to select mergers and
//! modifiers by name.

use crate::error::{Error, Result};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<String>,
}

impl Call {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (name, args) = match input.find('(') {
            None => (input, Vec::new()),
            Some(open) => {
                let body = input[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| Error::validation(format!("unclosed argument list in `{input}`")))?;
                (&input[..open], split_args(body)?)
            }
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation(format!("missing name in `{input}`")));
        }

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    /// Ensure exactly `n` arguments were supplied.
    pub fn expect_args(&self, n: usize) -> Result<()> {
        if self.args.len() == n {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "`{}` takes {n} argument(s), got {}",
                self.name,
                self.args.len()
            )))
        }
    }

    pub fn arg<T: std::str::FromStr>(&self, index: usize) -> Result<T> {
        let raw = self.args.get(index).ok_or_else(|| {
            Error::validation(format!("`{}` is missing argument {}", self.name, index + 1))
        })?;
        raw.parse().map_err(|_| {
            Error::validation(format!(
                "`{}` argument {} is not valid: `{raw}`",
                self.name,
                index + 1
            ))
        })
    }

    /// A count argument. Negative values parse but are a configuration error.
    pub fn count_arg(&self, index: usize) -> Result<usize> {
        let value: i64 = self.arg(index)?;
        usize::try_from(value).map_err(|_| {
            Error::configuration(format!(
                "`{}` argument {} must not be negative, got {value}",
                self.name,
                index + 1
            ))
        })
    }
}

/// Render an argument so that [`Call::parse`] reads it back unchanged.
pub fn quote_arg(arg: &str) -> Cow<'_, str> {
    let needs_quotes = arg.is_empty()
        || arg.starts_with(char::is_whitespace)
        || arg.ends_with(char::is_whitespace)
        || arg.contains([',', '"', '\\', '(', ')']);
    if !needs_quotes {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

// Arguments are comma separated; a double-quoted argument is taken literally,
// commas and surrounding whitespace included. Inside quotes `\"` and `\\`
// stand for a quote and a backslash.
fn split_args(body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            '\\' if quoted => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ',' if !quoted => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if quoted {
        return Err(Error::validation(format!("unterminated quote in `({body})`")));
    }
    pieces.push(current);

    Ok(pieces.iter().map(|piece| unquote(piece.trim())).collect())
}

fn unquote(arg: &str) -> String {
    let Some(inner) = arg.strip_prefix('"').and_then(|a| a.strip_suffix('"')) else {
        return arg.to_string();
    };
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => unescaped.extend(chars.next()),
            _ => unescaped.push(c),
        }
    }
    unescaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name() {
        let call = Call::parse("alternate").unwrap();
        assert_eq!(call.name, "alternate");
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_name_with_args() {
        let call = Call::parse("probabilistic(1000, 0.8)").unwrap();
        assert_eq!(call.name, "probabilistic");
        assert_eq!(call.args, vec!["1000", "0.8"]);
        assert_eq!(call.arg::<usize>(0).unwrap(), 1000);
        assert_eq!(call.arg::<f64>(1).unwrap(), 0.8);
    }

    #[test]
    fn test_quoted_argument_keeps_comma() {
        let call = Call::parse(r#"addSuffix(",")"#).unwrap();
        assert_eq!(call.args, vec![","]);
    }

    #[test]
    fn test_quoted_argument_keeps_whitespace() {
        let call = Call::parse(r#"addPrefix(" > ")"#).unwrap();
        assert_eq!(call.args, vec![" > "]);
    }

    #[test]
    fn test_escaped_quote_inside_quotes() {
        let call = Call::parse(r#"addSuffix("say \"hi\", \\o/")"#).unwrap();
        assert_eq!(call.args, vec![r#"say "hi", \o/"#]);
    }

    #[test]
    fn test_quote_arg_only_when_needed() {
        assert_eq!(quote_arg("."), ".");
        assert_eq!(quote_arg(","), r#"",""#);
        assert_eq!(quote_arg(" > "), r#"" > ""#);
        assert_eq!(quote_arg(""), r#""""#);
        assert_eq!(quote_arg(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn test_quoted_args_parse_back() {
        for arg in [",", " > ", "", "(x)", r#"a"b"#, r"back\slash", "plain"] {
            let call = Call::parse(&format!("addSuffix({})", quote_arg(arg))).unwrap();
            assert_eq!(call.args, vec![arg.to_string()], "{arg:?}");
        }
    }

    #[test]
    fn test_negative_count_is_configuration_error() {
        let call = Call::parse("interleaveChunks(-3, x)").unwrap();
        assert!(matches!(call.count_arg(0), Err(Error::Configuration(_))));
        assert!(matches!(call.count_arg(1), Err(Error::Validation(_))));
        assert_eq!(Call::parse("f(7)").unwrap().count_arg(0).unwrap(), 7);
    }

    #[test]
    fn test_empty_parens() {
        let call = Call::parse("trim()").unwrap();
        assert_eq!(call.name, "trim");
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_unclosed_parens_rejected() {
        assert!(Call::parse("interleaveChunks(2").is_err());
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(Call::parse("(2)").is_err());
        assert!(Call::parse("   ").is_err());
    }

    #[test]
    fn test_bad_argument_type() {
        let call = Call::parse("interleaveChunks(two)").unwrap();
        assert!(call.arg::<usize>(0).is_err());
        assert!(call.expect_args(1).is_ok());
        assert!(call.expect_args(2).is_err());
    }
}
