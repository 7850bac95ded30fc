//! Field extraction rules and the `key:"value"` tag syntax.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Where a field's raw text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Own text of the matched nodes, child element text stripped.
    Content,
    /// Named attribute of the first matched node.
    Attribute(String),
}

impl FromStr for Source {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "content" {
            return Ok(Source::Content);
        }

        let name = s
            .strip_prefix("attr=")
            .or_else(|| s.strip_prefix("attribute="))
            .or_else(|| s.strip_prefix("attribute:"))
            .ok_or_else(|| RuleError::UnknownSource(s.to_string()))?;

        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RuleError::UnknownSource(s.to_string()));
        }
        Ok(Source::Attribute(name.to_string()))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Content => f.write_str("content"),
            Source::Attribute(name) => write!(f, "attr={name}"),
        }
    }
}

/// `{selector, source, parser?}` attached to one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub selector: String,
    pub source: Source,
    pub parser: Option<String>,
}

impl FieldRule {
    /// Own text of the nodes matching `selector`.
    pub fn content(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            source: Source::Content,
            parser: None,
        }
    }

    /// Attribute `name` of the nodes matching `selector`.
    pub fn attr(selector: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            source: Source::Attribute(name.into()),
            parser: None,
        }
    }

    /// Convert through the registry entry `name` instead of the built-in conversion.
    pub fn with_parser(mut self, name: impl Into<String>) -> Self {
        self.parser = Some(name.into());
        self
    }
}

impl FromStr for FieldRule {
    type Err = RuleError;

    /// Parse `selector:"<css>" source:"attr=<name>" parser:"<name>"`.
    ///
    /// `source` defaults to `content`; `parser` is optional. Inside a value,
    /// `\"` and `\\` escape a quote and a backslash.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &'static str| RuleError::Malformed {
            tag: tag.to_string(),
            reason,
        };

        let mut selector = None;
        let mut source = None;
        let mut parser = None;

        let mut rest = tag.trim_start();
        while !rest.is_empty() {
            let colon = rest.find(':').ok_or_else(|| malformed("expected key:\"value\""))?;
            let key = &rest[..colon];
            if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
                return Err(malformed("invalid key"));
            }

            let body = rest[colon + 1..]
                .strip_prefix('"')
                .ok_or_else(|| malformed("value must be quoted"))?;
            let (value, consumed) = read_quoted(body).ok_or_else(|| malformed("unterminated value"))?;

            let after = &body[consumed..];
            if !after.is_empty() && !after.starts_with(char::is_whitespace) {
                return Err(malformed("pairs must be separated by whitespace"));
            }
            rest = after.trim_start();

            match key {
                "selector" => selector = Some(value),
                "source" => source = Some(value.parse::<Source>()?),
                "parser" => parser = Some(value).filter(|p| !p.is_empty()),
                other => return Err(RuleError::UnknownKey(other.to_string())),
            }
        }

        let selector = selector
            .filter(|s| !s.trim().is_empty())
            .ok_or(RuleError::MissingSelector)?;

        Ok(FieldRule {
            selector,
            source: source.unwrap_or(Source::Content),
            parser,
        })
    }
}

/// Read up to the closing quote, returning the unescaped value and the bytes consumed.
fn read_quoted(body: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, i + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                out.push(escaped);
            }
            _ => out.push(c),
        }
    }
    None
}

/// A rule declaration that could not be understood.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("malformed rule tag `{tag}`: {reason}")]
    Malformed { tag: String, reason: &'static str },

    #[error("unknown rule key `{0}`")]
    UnknownKey(String),

    #[error("rule has no selector")]
    MissingSelector,

    #[error("unrecognized source `{0}`")]
    UnknownSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_tag() {
        let rule: FieldRule = r#"selector:"div.match-header-vs > a" source:"attr=href" parser:"team_id""#
            .parse()
            .unwrap();
        assert_eq!(rule.selector, "div.match-header-vs > a");
        assert_eq!(rule.source, Source::Attribute("href".into()));
        assert_eq!(rule.parser.as_deref(), Some("team_id"));
    }

    #[test]
    fn test_source_defaults_to_content() {
        let rule: FieldRule = r#"selector:"span.score""#.parse().unwrap();
        assert_eq!(rule, FieldRule::content("span.score"));
    }

    #[test]
    fn test_attribute_spellings() {
        for source in ["attr=data-id", "attribute=data-id", "attribute:data-id"] {
            assert_eq!(source.parse::<Source>().unwrap(), Source::Attribute("data-id".into()));
        }
        assert!("href".parse::<Source>().is_err());
        assert!("attr=".parse::<Source>().is_err());
        assert!("attr=a b".parse::<Source>().is_err());
    }

    #[test]
    fn test_escaped_quotes() {
        let rule: FieldRule = r#"selector:"a[title=\"x\"]" source:"content""#.parse().unwrap();
        assert_eq!(rule.selector, r#"a[title="x"]"#);
    }

    #[test]
    fn test_rejects_bad_tags() {
        assert_eq!("source:\"content\"".parse::<FieldRule>(), Err(RuleError::MissingSelector));
        assert_eq!(
            "selector:\"a\" format:\"x\"".parse::<FieldRule>(),
            Err(RuleError::UnknownKey("format".into()))
        );
        assert!(matches!(
            "selector:a".parse::<FieldRule>(),
            Err(RuleError::Malformed { .. })
        ));
        assert!(matches!(
            "selector:\"a".parse::<FieldRule>(),
            Err(RuleError::Malformed { .. })
        ));
        assert!(matches!(
            "selector:\"a\"parser:\"int\"".parse::<FieldRule>(),
            Err(RuleError::Malformed { .. })
        ));
    }
}
