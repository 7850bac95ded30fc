//! Decoder behaviour over realistic match-page markup.

use chrono::{Datelike, NaiveDate, Timelike};
use scrape_pipeline::decode::{decode, decode_str, DecodeConfig, ErrorKind, FieldRule, Record, Schema};
use scrape_pipeline::dom::Document;
use scrape_pipeline::parsers::{default_if_empty, parser, Value};

const MATCH_PAGE: &str = r#"
<html><body>
  <div class="match-header">
    <div class="match-header-event"><div>  VCT 2025: Pacific Stage 2  </div></div>
    <div class="match-header-date"><div class="moment-tz-convert" data-utc-ts="2025-06-22 16:30:00">Sunday, June 22nd</div></div>
    <a class="match-header-link mod-1" href="/team/624/paper-rex">
      <div class="wf-title-med">Paper Rex</div>
    </a>
    <a class="match-header-link mod-2" href="/team/2/fnatic">
      <div class="wf-title-med">FNATIC</div>
    </a>
    <div class="match-header-vs-score"><span class="winner">2</span><span class="loser">1</span></div>
    <div class="match-header-note">Bo3</div>
  </div>
  <table class="wf-table-inset mod-overview">
    <tr>
      <td class="mod-player"><div class="text-of">f0rsakeN</div></td>
      <td class="mod-agents"><img title="Jett" src="/img/jett.png"></td>
      <td class="mod-stat rating"><span>1.23</span></td>
      <td class="mod-stat acs"><span> 245 </span></td>
      <td class="mod-stat hs"><span>31%</span></td>
      <td class="mod-stat fk"><span></span></td>
    </tr>
  </table>
</body></html>
"#;

#[derive(Debug, Default, PartialEq)]
struct Team {
    name: String,
    href: String,
}

impl Record for Team {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .tagged("name", r#"selector:".wf-title-med""#, |t| &mut t.name)
            .tagged("href", r#"selector:"*" source:"attr=href""#, |t| &mut t.href)
    }
}

#[derive(Debug, Default, PartialEq)]
struct Header {
    event: String,
    date: Option<NaiveDate>,
    score: i64,
    format: String,
}

impl Record for Header {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .tagged("event", r#"selector:".match-header-event div""#, |h| &mut h.event)
            .field(
                "date",
                FieldRule::attr(".match-header-date .moment-tz-convert", "data-utc-ts").with_parser("utc"),
                |h| &mut h.date,
            )
            .tagged("score", r#"selector:".match-header-vs-score .winner" parser:"int""#, |h| &mut h.score)
            .untagged("format", |h| &mut h.format)
    }
}

#[derive(Debug, Default, PartialEq)]
struct PlayerLine {
    name: String,
    agent: String,
    rating: f64,
    acs: u32,
    headshots: f64,
    first_kills: i64,
}

impl Record for PlayerLine {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .tagged("name", r#"selector:".mod-player .text-of""#, |p| &mut p.name)
            .tagged("agent", r#"selector:".mod-agents img" source:"attribute=title""#, |p| &mut p.agent)
            .tagged("rating", r#"selector:".rating span" parser:"float""#, |p| &mut p.rating)
            .tagged("acs", r#"selector:".acs span""#, |p| &mut p.acs)
            .tagged("headshots", r#"selector:".hs span" parser:"float""#, |p| &mut p.headshots)
            .tagged("first_kills", r#"selector:".fk span" parser:"int0""#, |p| &mut p.first_kills)
    }
}

#[derive(Debug, Default)]
struct Overview {
    header: Header,
    player: PlayerLine,
}

impl Record for Overview {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().nested("header", |o| &mut o.header).nested("player", |o| &mut o.player)
    }
}

#[derive(Debug, Default)]
struct WithOptionalTeam {
    home: Option<Team>,
}

impl Record for WithOptionalTeam {
    fn schema() -> Schema<Self> {
        Schema::new().nested_opt("home", |w| &mut w.home)
    }
}

#[derive(Debug, Default)]
struct BadTag {
    name: String,
}

impl Record for BadTag {
    fn schema() -> Schema<Self> {
        Schema::new().tagged("name", r#"selector:".x" colour:"red""#, |b| &mut b.name)
    }
}

#[derive(Debug, Default)]
struct Nullable {
    note: Option<String>,
}

impl Record for Nullable {
    fn schema() -> Schema<Self> {
        Schema::new().field(
            "note",
            FieldRule::content(".match-header-note").with_parser("absent"),
            |n| &mut n.note,
        )
    }
}

fn config() -> DecodeConfig {
    DecodeConfig::new()
        .parser("utc", scrape_pipeline::parsers::timestamp("%Y-%m-%d %H:%M:%S"))
        .parser("int0", default_if_empty(0i64, parser(scrape_pipeline::parsers::builtin::int)))
}

#[test]
fn test_overview_round_trip() {
    let mut overview = Overview::default();
    decode_str(&mut overview, MATCH_PAGE, &config()).unwrap();

    let header = &overview.header;
    assert_eq!(header.event, "VCT 2025: Pacific Stage 2");
    assert_eq!(header.score, 2);
    let date = header.date.unwrap();
    assert_eq!((date.year(), date.month(), date.day()), (2025, 6, 22));
    assert_eq!(header.format, "");

    let player = &overview.player;
    assert_eq!(player.name, "f0rsakeN");
    assert_eq!(player.agent, "Jett");
    assert_eq!(player.rating, 1.23);
    assert_eq!(player.acs, 245);
    assert_eq!(player.headshots, 31.0);
    assert_eq!(player.first_kills, 0);
}

#[test]
fn test_teams_from_sub_selections() {
    let doc = Document::parse(MATCH_PAGE);
    let links = doc.root().find(".match-header-link").unwrap();
    assert_eq!(links.len(), 2);

    let teams: Vec<Team> = links
        .iter()
        .map(|link| {
            let mut team = Team::default();
            decode(&mut team, &link, &DecodeConfig::default()).unwrap();
            team
        })
        .collect();

    assert_eq!(teams[0].name, "Paper Rex");
    assert_eq!(teams[1].name, "FNATIC");
    assert_eq!(teams[1].href, "");
}

#[test]
fn test_decode_twice_is_identical() {
    let doc = Document::parse(MATCH_PAGE);
    let mut first = PlayerLine::default();
    let mut second = PlayerLine::default();
    decode(&mut first, &doc.root(), &config()).unwrap();
    decode(&mut second, &doc.root(), &config()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_require_all_fields_tagged() {
    let mut header = Header::default();
    decode_str(&mut header, MATCH_PAGE, &config()).unwrap();

    let strict = config().require_all_fields_tagged(true);
    let err = decode_str(&mut Header::default(), MATCH_PAGE, &strict).unwrap_err();
    assert_eq!(err.path, "format");
    assert!(matches!(err.kind, ErrorKind::MissingRule));
}

#[test]
fn test_nested_error_path() {
    let cfg = DecodeConfig::new();
    let err = decode_str(&mut Overview::default(), MATCH_PAGE, &cfg).unwrap_err();
    assert_eq!(err.path, "header.date");
    assert!(matches!(err.kind, ErrorKind::UnknownParser(ref name) if name == "utc"));
}

#[test]
fn test_forbid_nested_traversal() {
    let cfg = DecodeConfig::new().forbid_nested_traversal(true);
    let mut overview = Overview::default();
    decode_str(&mut overview, MATCH_PAGE, &cfg).unwrap();
    assert_eq!(overview.header, Header::default());
}

#[test]
fn test_optional_nested_record() {
    let markup = r#"<div class="wf-title-med">Paper Rex</div>"#;

    let err = decode_str(&mut WithOptionalTeam::default(), markup, &DecodeConfig::new()).unwrap_err();
    assert_eq!(err.path, "home");
    assert!(matches!(err.kind, ErrorKind::TypeError(_)));

    let mut with = WithOptionalTeam::default();
    decode_str(&mut with, markup, &DecodeConfig::new().allow_pointer_target(true)).unwrap();
    assert_eq!(with.home.unwrap().name, "Paper Rex");
}

#[test]
fn test_malformed_tag_reported_on_decode() {
    let err = decode_str(&mut BadTag::default(), MATCH_PAGE, &DecodeConfig::new()).unwrap_err();
    assert_eq!(err.path, "name");
    assert!(matches!(err.kind, ErrorKind::InvalidRule(_)));
}

#[test]
fn test_sentinel_on_optional_field() {
    let cfg = DecodeConfig::new().parser("absent", parser(|_| Ok(Value::None)));

    let mut nullable = Nullable {
        note: Some("stale".into()),
    };
    decode_str(&mut nullable, MATCH_PAGE, &cfg.clone().allow_nil_pointer(true)).unwrap();
    assert_eq!(nullable.note, None);

    let mut zeroed = Nullable::default();
    decode_str(&mut zeroed, MATCH_PAGE, &cfg).unwrap();
    assert_eq!(zeroed.note, Some(String::new()));
}

#[test]
fn test_type_mismatch_from_parser() {
    #[derive(Default)]
    struct Score {
        value: i64,
    }

    impl Record for Score {
        fn schema() -> Schema<Self> {
            Schema::new().tagged("value", r#"selector:".match-header-note" parser:"string""#, |s| &mut s.value)
        }
    }

    let err = decode_str(&mut Score::default(), MATCH_PAGE, &DecodeConfig::new()).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: "integer",
            found: "string"
        }
    ));
}

#[test]
fn test_default_date_format_accepts_utc_designator() {
    #[derive(Default)]
    struct Kickoff {
        at: chrono::DateTime<chrono::Utc>,
        local: chrono::DateTime<chrono::FixedOffset>,
    }

    impl Record for Kickoff {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .tagged("at", r#"selector:"time.utc" source:"attr=datetime""#, |k| &mut k.at)
                .tagged("local", r#"selector:"time.local" source:"attr=datetime""#, |k| &mut k.local)
        }
    }

    let markup = r#"
        <time class="utc" datetime="2025-06-22T16:30:00Z"></time>
        <time class="local" datetime="2025-06-22T18:30:00+02:00"></time>
    "#;

    let mut kickoff = Kickoff::default();
    decode_str(&mut kickoff, markup, &DecodeConfig::default()).unwrap();
    assert_eq!(kickoff.at.hour(), 16);
    assert_eq!(kickoff.at, kickoff.local);
}
