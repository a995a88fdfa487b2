use std::time::Duration;

use roster_terminal::player_fetch::{
    FetchError, parse_players_page_json, players_query, retry_after_hint,
};

const PAGE_JSON: &str = r#"{
  "data": [
    {
      "id": 237,
      "first_name": "LeBron",
      "last_name": "James",
      "position": "F",
      "height": "6-9",
      "team": { "id": 14, "abbreviation": "LAL", "name": "Lakers", "full_name": "Los Angeles Lakers" }
    },
    {
      "id": 115,
      "first_name": "Stephen",
      "last_name": "Curry",
      "position": null,
      "team": { "id": 10, "name": "Warriors" }
    }
  ],
  "meta": { "next_cursor": 25, "per_page": 2 }
}"#;

#[test]
fn parses_players_and_numeric_cursor() {
    let page = parse_players_page_json(PAGE_JSON).expect("valid page");
    assert_eq!(page.players.len(), 2);
    assert_eq!(page.players[0].id, 237);
    assert_eq!(page.players[0].full_name(), "LeBron James");
    assert_eq!(page.players[0].team.name, "Lakers");
    assert_eq!(page.players[1].position, "");
    assert_eq!(page.next_cursor.as_deref(), Some("25"));
}

#[test]
fn missing_or_null_cursor_ends_the_list() {
    let no_meta = parse_players_page_json(r#"{"data":[]}"#).expect("no meta");
    assert!(no_meta.next_cursor.is_none());

    let null_cursor =
        parse_players_page_json(r#"{"data":[],"meta":{"next_cursor":null}}"#).expect("null");
    assert!(null_cursor.next_cursor.is_none());

    let blank = parse_players_page_json(r#"{"data":[],"meta":{"next_cursor":"  "}}"#)
        .expect("blank string");
    assert!(blank.next_cursor.is_none());

    let text = parse_players_page_json(r#"{"data":[],"meta":{"next_cursor":"c2"}}"#)
        .expect("string cursor");
    assert_eq!(text.next_cursor.as_deref(), Some("c2"));
}

#[test]
fn empty_body_is_an_empty_page() {
    for raw in ["", "  ", "null"] {
        let page = parse_players_page_json(raw).expect("empty body");
        assert!(page.players.is_empty());
        assert!(page.next_cursor.is_none());
    }
}

#[test]
fn malformed_body_is_an_error() {
    assert!(parse_players_page_json("{not json").is_err());
    assert!(parse_players_page_json(r#"{"data":[{"first_name":"No id"}]}"#).is_err());
}

fn page_url(base: &str, cursor: Option<&str>, per_page: u32) -> reqwest::Url {
    reqwest::Url::parse_with_params(base, &players_query(cursor, per_page)).expect("valid url")
}

#[test]
fn builds_page_urls() {
    let base = "https://api.balldontlie.io/v1/players";
    assert_eq!(
        page_url(base, None, 10).as_str(),
        "https://api.balldontlie.io/v1/players?per_page=10"
    );
    assert_eq!(
        page_url(base, Some("c2"), 10).as_str(),
        "https://api.balldontlie.io/v1/players?per_page=10&cursor=c2"
    );
    assert_eq!(
        page_url("http://localhost/players?search=jo", Some(" "), 5).as_str(),
        "http://localhost/players?search=jo&per_page=5"
    );
}

#[test]
fn cursor_with_reserved_characters_stays_one_value() {
    let base = "https://api.balldontlie.io/v1/players";
    let url = page_url(base, Some("a&per_page=100 x#y"), 10);
    assert!(url.fragment().is_none());

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![
            ("per_page".to_string(), "10".to_string()),
            ("cursor".to_string(), "a&per_page=100 x#y".to_string()),
        ]
    );
}

#[test]
fn classifies_http_failures() {
    assert_eq!(FetchError::from_status(429, "slow down"), FetchError::RateLimited);
    assert_eq!(FetchError::RateLimited.status(), Some(429));

    let err = FetchError::from_status(500, "");
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "http 500");
    assert!(!err.is_rate_limited());

    let long = "x".repeat(300);
    let err = FetchError::from_status(502, &long);
    assert_eq!(err.to_string().len(), "http 502: ".len() + 120);
}

#[test]
fn formats_retry_hints() {
    assert_eq!(retry_after_hint(Duration::from_millis(500)), "500ms");
    assert_eq!(retry_after_hint(Duration::from_millis(2000)), "2s");
}
