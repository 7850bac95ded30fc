//! Field extraction and conversion.

use crate::decode::config::DecodeConfig;
use crate::decode::error::{DecodeError, ErrorKind};
use crate::decode::field::Field;
use crate::decode::rule::{FieldRule, Source};
use crate::decode::schema::{schema_of, Record};
use crate::dom::{Document, Selection};

/// Populate `record` from `node`.
///
/// On error the record may be partly written and should be discarded.
pub fn decode<R: Record>(record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError> {
    schema_of::<R>().apply(record, node, cfg)
}

/// Populate `record` from the root of `doc`.
pub fn decode_document<R: Record>(record: &mut R, doc: &Document, cfg: &DecodeConfig) -> Result<(), DecodeError> {
    decode(record, &doc.root(), cfg)
}

/// Parse `markup` and populate `record` from it.
pub fn decode_str<R: Record>(record: &mut R, markup: &str, cfg: &DecodeConfig) -> Result<(), DecodeError> {
    let doc = Document::parse(markup);
    decode_document(record, &doc, cfg)
}

/// Raw text for `rule` under `node`; empty when nothing matched and that is allowed.
pub(crate) fn extract_raw(rule: &FieldRule, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<String, ErrorKind> {
    let matched = node.find(&rule.selector)?;
    if matched.is_empty() {
        if cfg.forbid_empty_selection {
            return Err(ErrorKind::EmptySelection {
                selector: rule.selector.clone(),
            });
        }
        return Ok(String::new());
    }

    match &rule.source {
        Source::Content => Ok(matched.own_text()),
        Source::Attribute(name) => match matched.attr(name) {
            Some(value) => Ok(value.to_string()),
            None if cfg.forbid_missing_attribute => Err(ErrorKind::MissingAttribute {
                attribute: name.clone(),
                selector: rule.selector.clone(),
            }),
            None => Ok(String::new()),
        },
    }
}

/// Write `raw` into `field` through the rule's parser, or the built-in conversion.
pub(crate) fn convert(field: &mut dyn Field, rule: &FieldRule, raw: &str, cfg: &DecodeConfig) -> Result<(), ErrorKind> {
    if let Some(name) = &rule.parser {
        let parser = cfg
            .parsers
            .get(name)
            .ok_or_else(|| ErrorKind::UnknownParser(name.clone()))?;
        let value = parser(raw).map_err(|source| ErrorKind::Parse {
            parser: Some(name.clone()),
            source,
        })?;
        return field.assign(value, cfg);
    }

    // Empty means absent.
    if raw.trim().is_empty() {
        return Ok(());
    }
    field.parse_text(raw, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::schema::Schema;
    use crate::parsers::{default_if_empty, parser, ParseError, Value};

    const MATCH_PAGE: &str = r#"
        <div class="match-header">
          <div class="match-header-event">
            <div style="font-weight: 700;">  Champions Tour 2025: Masters Toronto  </div>
          </div>
          <div class="match-header-date">
            <div class="moment-tz-convert" data-utc-ts="2025-06-22T18:30:00+02:00">Sunday, June 22nd</div>
          </div>
          <a class="match-header-link mod-1" href="/team/624/paper-rex">
            <div class="wf-title-med">Paper Rex <span>(PRX)</span></div>
          </a>
          <div class="match-header-vs-score">
            <span class="winner">2</span><span>:</span><span class="loser">1</span>
          </div>
          <div class="rating"></div>
          <div class="patch">Patch 10.11</div>
        </div>
    "#;

    #[derive(Default, Debug, PartialEq)]
    struct Header {
        event: String,
        played_at: chrono::DateTime<chrono::FixedOffset>,
        team_path: String,
        team: String,
        winner_score: i64,
        loser_score: u32,
    }

    impl Record for Header {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .tagged("event", r#"selector:".match-header-event div""#, |h| &mut h.event)
                .tagged(
                    "played_at",
                    r#"selector:".moment-tz-convert" source:"attr=data-utc-ts""#,
                    |h| &mut h.played_at,
                )
                .tagged("team_path", r#"selector:"a.mod-1" source:"attr=href""#, |h| &mut h.team_path)
                .tagged("team", r#"selector:"a.mod-1 .wf-title-med""#, |h| &mut h.team)
                .tagged("winner_score", r#"selector:"span.winner""#, |h| &mut h.winner_score)
                .tagged("loser_score", r#"selector:"span.loser""#, |h| &mut h.loser_score)
        }
    }

    #[test]
    fn test_fixture_decodes() {
        let mut header = Header::default();
        decode_str(&mut header, MATCH_PAGE, &DecodeConfig::default()).unwrap();

        assert_eq!(header.event, "Champions Tour 2025: Masters Toronto");
        assert_eq!(header.played_at.to_rfc3339(), "2025-06-22T18:30:00+02:00");
        assert_eq!(header.team_path, "/team/624/paper-rex");
        assert_eq!(header.team, "Paper Rex");
        assert_eq!(header.winner_score, 2);
        assert_eq!(header.loser_score, 1);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let doc = Document::parse(MATCH_PAGE);
        let cfg = DecodeConfig::default();
        let mut first = Header::default();
        let mut second = Header::default();
        decode_document(&mut first, &doc, &cfg).unwrap();
        decode_document(&mut second, &doc, &cfg).unwrap();
        assert_eq!(first, second);
    }

    #[derive(Default, Debug)]
    struct Extras {
        rating: f64,
        missing: String,
        patch: String,
    }

    impl Record for Extras {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .tagged("rating", r#"selector:".rating" parser:"rating""#, |e| &mut e.rating)
                .tagged("missing", r#"selector:".no-such-node""#, |e| &mut e.missing)
                .tagged("patch", r#"selector:".patch" parser:"patch""#, |e| &mut e.patch)
        }
    }

    fn extras_config() -> DecodeConfig {
        DecodeConfig::default()
            .parser("rating", default_if_empty(0.0, parser(crate::parsers::builtin::float)))
            .parser(
                "patch",
                parser(|raw| {
                    raw.trim()
                        .strip_prefix("Patch ")
                        .map(Value::from)
                        .ok_or_else(|| ParseError::msg(format!("no patch in `{raw}`")))
                }),
            )
    }

    #[test]
    fn test_parsers_and_empty_selection() {
        let mut extras = Extras::default();
        decode_str(&mut extras, MATCH_PAGE, &extras_config()).unwrap();
        assert_eq!(extras.rating, 0.0);
        assert_eq!(extras.missing, "");
        assert_eq!(extras.patch, "10.11");
    }

    #[test]
    fn test_forbid_empty_selection() {
        let mut extras = Extras::default();
        let cfg = extras_config().forbid_empty_selection(true);
        let err = decode_str(&mut extras, MATCH_PAGE, &cfg).unwrap_err();
        assert_eq!(err.path, "missing");
        assert!(matches!(err.kind, ErrorKind::EmptySelection { .. }));
    }

    #[test]
    fn test_unknown_parser() {
        let mut extras = Extras::default();
        let err = decode_str(&mut extras, MATCH_PAGE, &DecodeConfig::default()).unwrap_err();
        assert_eq!(err.path, "rating");
        assert!(matches!(err.kind, ErrorKind::UnknownParser(ref name) if name == "rating"));
    }

    #[test]
    fn test_missing_attribute_policy() {
        let rule = FieldRule::attr("span.winner", "title");
        let doc = Document::parse(MATCH_PAGE);
        let root = doc.root();

        let lenient = DecodeConfig::default();
        assert_eq!(extract_raw(&rule, &root, &lenient).unwrap(), "");

        let strict = DecodeConfig::default().forbid_missing_attribute(true);
        assert!(matches!(
            extract_raw(&rule, &root, &strict),
            Err(ErrorKind::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_empty_raw_leaves_zero() {
        let rule = FieldRule::content(".rating");
        let mut score: i64 = 0;
        convert(&mut score, &rule, "   ", &DecodeConfig::default()).unwrap();
        assert_eq!(score, 0);

        let err = convert(&mut score, &rule, "abc", &DecodeConfig::default()).unwrap_err();
        assert!(matches!(err, ErrorKind::Parse { parser: None, .. }));
    }
}
