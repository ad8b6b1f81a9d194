use crate::call::{quote_arg, Call};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Names accepted by [`Modifier::parse`], in the form shown to users.
pub const MODIFIER_NAMES: [&str; 9] = [
    "uppercase",
    "lowercase",
    "reverse",
    "capitalize",
    "trim",
    "removeSpaces",
    "noSpaces",
    "addPrefix(prefix)",
    "addSuffix(suffix)",
];

/// A per-word transformation. Every modifier maps `n` words to `n` words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Uppercase,
    Lowercase,
    /// Reverse the characters of each word.
    Reverse,
    /// Uppercase the first letter of each word.
    Capitalize,
    Trim,
    /// Strip all whitespace inside each word. Also accepted as `noSpaces`.
    RemoveSpaces,
    AddPrefix(String),
    AddSuffix(String),
}

impl Modifier {
    pub fn parse(input: &str) -> Result<Self> {
        let call = Call::parse(input)?;
        let modifier = match call.name.as_str() {
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "reverse" => Self::Reverse,
            "capitalize" => Self::Capitalize,
            "trim" => Self::Trim,
            "removeSpaces" | "noSpaces" => Self::RemoveSpaces,
            "addPrefix" => {
                call.expect_args(1)?;
                return Ok(Self::AddPrefix(call.arg(0)?));
            }
            "addSuffix" => {
                call.expect_args(1)?;
                return Ok(Self::AddSuffix(call.arg(0)?));
            }
            _ => {
                return Err(Error::UnknownModifier {
                    name: call.name,
                    valid: MODIFIER_NAMES.iter().map(|n| n.to_string()).collect(),
                })
            }
        };
        call.expect_args(0)?;
        Ok(modifier)
    }

    pub fn apply_word(&self, word: &str) -> String {
        match self {
            Self::Uppercase => word.to_uppercase(),
            Self::Lowercase => word.to_lowercase(),
            Self::Reverse => word.chars().rev().collect(),
            Self::Capitalize => capitalize_first_letter(word),
            Self::Trim => word.trim().to_string(),
            Self::RemoveSpaces => word.chars().filter(|c| !c.is_whitespace()).collect(),
            Self::AddPrefix(prefix) => format!("{prefix}{word}"),
            Self::AddSuffix(suffix) => format!("{word}{suffix}"),
        }
    }

    pub fn apply(&self, words: Vec<String>) -> Vec<String> {
        words.iter().map(|word| self.apply_word(word)).collect()
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uppercase => write!(f, "uppercase"),
            Self::Lowercase => write!(f, "lowercase"),
            Self::Reverse => write!(f, "reverse"),
            Self::Capitalize => write!(f, "capitalize"),
            Self::Trim => write!(f, "trim"),
            Self::RemoveSpaces => write!(f, "removeSpaces"),
            Self::AddPrefix(prefix) => write!(f, "addPrefix({})", quote_arg(prefix)),
            Self::AddSuffix(suffix) => write!(f, "addSuffix({})", quote_arg(suffix)),
        }
    }
}

impl FromStr for Modifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Ordered list of modifiers; an empty chain leaves words untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierChain {
    modifiers: Vec<Modifier>,
}

impl ModifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every name up front; nothing is applied if any name is invalid.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let modifiers = names
            .iter()
            .map(|name| Modifier::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { modifiers })
    }

    pub fn then(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Names in application order.
    pub fn names(&self) -> Vec<String> {
        self.modifiers.iter().map(ToString::to_string).collect()
    }

    pub fn apply(&self, words: Vec<String>) -> Vec<String> {
        self.modifiers
            .iter()
            .fold(words, |current, modifier| modifier.apply(current))
    }
}

impl From<Vec<Modifier>> for ModifierChain {
    fn from(modifiers: Vec<Modifier>) -> Self {
        Self { modifiers }
    }
}

fn capitalize_first_letter(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        _ => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_modifiers() {
        let input = words(&["Hello", "wORLD"]);
        assert_eq!(Modifier::Uppercase.apply(input.clone()), words(&["HELLO", "WORLD"]));
        assert_eq!(Modifier::Lowercase.apply(input), words(&["hello", "world"]));
    }

    #[test]
    fn test_reverse_within_word() {
        assert_eq!(
            Modifier::Reverse.apply(words(&["abc", "héllo"])),
            words(&["cba", "olléh"])
        );
    }

    #[test]
    fn test_capitalize_first_letter() {
        assert_eq!(
            Modifier::Capitalize.apply(words(&["hello", "éclair", "1st", ""])),
            words(&["Hello", "Éclair", "1st", ""])
        );
    }

    #[test]
    fn test_trim_and_remove_spaces() {
        assert_eq!(Modifier::Trim.apply(words(&["  a b  "])), words(&["a b"]));
        assert_eq!(
            Modifier::RemoveSpaces.apply(words(&[" ice cream\t"])),
            words(&["icecream"])
        );
    }

    #[test]
    fn test_affixes() {
        let prefixed = Modifier::AddPrefix("#".into()).apply(words(&["tag"]));
        assert_eq!(prefixed, words(&["#tag"]));
        let suffixed = Modifier::AddSuffix("!".into()).apply(words(&["wow"]));
        assert_eq!(suffixed, words(&["wow!"]));
    }

    #[test]
    fn test_modifiers_preserve_length() {
        let input = words(&["a", " b ", "", "dd"]);
        for name in ["uppercase", "reverse", "trim", "noSpaces", "addSuffix(.)"] {
            let modifier = Modifier::parse(name).unwrap();
            assert_eq!(modifier.apply(input.clone()).len(), input.len(), "{name}");
        }
    }

    #[test]
    fn test_no_spaces_alias() {
        assert_eq!(Modifier::parse("noSpaces").unwrap(), Modifier::RemoveSpaces);
        assert_eq!(Modifier::parse("removeSpaces").unwrap(), Modifier::RemoveSpaces);
    }

    #[test]
    fn test_chain_applies_in_order() {
        let chain = ModifierChain::parse(&["addSuffix(x)", "uppercase"]).unwrap();
        assert_eq!(chain.apply(words(&["a"])), words(&["AX"]));

        let chain = ModifierChain::parse(&["uppercase", "addSuffix(x)"]).unwrap();
        assert_eq!(chain.apply(words(&["a"])), words(&["Ax"]));
        assert_eq!(chain.names(), vec!["uppercase", "addSuffix(x)"]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = ModifierChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(words(&["Keep", " me "])), words(&["Keep", " me "]));
    }

    #[test]
    fn test_unknown_modifier_rejected_with_valid_names() {
        let err = ModifierChain::parse(&["uppercase", "sparkle"]).unwrap_err();
        assert_matches!(err, Error::UnknownModifier { name, valid } => {
            assert_eq!(name, "sparkle");
            assert!(valid.contains(&"noSpaces".to_string()));
            assert!(valid.contains(&"addPrefix(prefix)".to_string()));
        });
    }

    #[test]
    fn test_affix_requires_argument() {
        assert_matches!(Modifier::parse("addPrefix"), Err(Error::Validation(_)));
        assert_matches!(Modifier::parse("uppercase(1)"), Err(Error::Validation(_)));
    }

    #[test]
    fn test_recorded_names_parse_back() {
        let chain = ModifierChain::from(vec![
            Modifier::AddSuffix(",".into()),
            Modifier::AddPrefix(" > ".into()),
            Modifier::AddSuffix("\"".into()),
            Modifier::AddPrefix(String::new()),
            Modifier::AddSuffix(".".into()),
            Modifier::RemoveSpaces,
        ]);
        let names = chain.names();
        assert_eq!(names[0], r#"addSuffix(",")"#);
        assert_eq!(names[4], "addSuffix(.)");
        assert_eq!(ModifierChain::parse(&names).unwrap(), chain);
    }

    #[test]
    fn test_chain_builder() {
        let chain = ModifierChain::new()
            .then(Modifier::Capitalize)
            .then(Modifier::AddPrefix(">".into()));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.apply(words(&["go"])), words(&[">Go"]));
    }
}
