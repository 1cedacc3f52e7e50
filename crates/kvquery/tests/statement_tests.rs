use kvquery::{
    execute_query, parse_query, Engine, EngineConfig, Error, Keyspace, MemoryKeyspace, ParseError,
    Statement, TtlOperator, NO_EXPIRATION,
};

fn users() -> MemoryKeyspace {
    let ks = MemoryKeyspace::new();
    ks.set_value("user:1", "alice", 0).unwrap();
    ks.set_value("user:2", "bob", 5000).unwrap();
    ks
}

fn select(ks: &MemoryKeyspace, text: &str) -> Vec<(String, String)> {
    let condition = parse_query(text).unwrap();
    execute_query(&condition, ks).unwrap().into_iter().collect()
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

#[test]
fn test_select_by_key_like() {
    let ks = users();
    assert_eq!(
        select(&ks, "select from main where key like 'user:%'"),
        vec![pair("user:1", "alice"), pair("user:2", "bob")]
    );
}

#[test]
fn test_select_by_ttl() {
    let ks = users();
    assert_eq!(
        select(&ks, "select from main where ttl > 0"),
        vec![pair("user:2", "bob")]
    );
    assert_eq!(
        select(&ks, "select from main where ttl == -1"),
        vec![pair("user:1", "alice")]
    );
    assert!(select(&ks, "select from main where ttl < -1").is_empty());
}

#[test]
fn test_select_without_where_returns_everything() {
    let ks = users();
    ks.set_value("order:9", "pending", 0).unwrap();
    assert_eq!(select(&ks, "select from main").len(), 3);
}

#[test]
fn test_select_combines_clauses() {
    let ks = users();
    ks.set_value("user:3", "bobby", 0).unwrap();

    assert_eq!(
        select(&ks, "SELECT FROM main WHERE value LIKE 'bob%' AND ttl == -1"),
        vec![pair("user:3", "bobby")]
    );
    assert_eq!(
        select(&ks, "select from main where value regex '^b' and key like 'user:_'"),
        vec![pair("user:2", "bob"), pair("user:3", "bobby")]
    );
}

#[test]
fn test_like_is_anchored_and_literal() {
    let ks = MemoryKeyspace::new();
    ks.set_value("a.b", "1", 0).unwrap();
    ks.set_value("axb", "2", 0).unwrap();
    ks.set_value("xa.b", "3", 0).unwrap();

    assert_eq!(select(&ks, "select from main where key like 'a.b'"), vec![pair("a.b", "1")]);
    assert_eq!(
        select(&ks, "select from main where key like 'a_b'"),
        vec![pair("a.b", "1"), pair("axb", "2")]
    );
}

#[test]
fn test_and_inside_pattern_is_not_a_separator() {
    let ks = MemoryKeyspace::new();
    ks.set_value("brand:acme", "sand and stone", 0).unwrap();
    ks.set_value("brand:other", "water", 0).unwrap();

    assert_eq!(
        select(&ks, "select from main where value like '% and %' and key like 'brand:%'"),
        vec![pair("brand:acme", "sand and stone")]
    );
}

#[test]
fn test_pattern_case_is_preserved() {
    let ks = MemoryKeyspace::new();
    ks.set_value("User:1", "x", 0).unwrap();
    ks.set_value("user:1", "y", 0).unwrap();

    assert_eq!(select(&ks, "select from main where key like 'User:%'"), vec![pair("User:1", "x")]);
}

#[test]
fn test_malformed_ttl_operator() {
    let err = parse_query("select from main where ttl >> 5").unwrap_err();
    assert_eq!(err, ParseError::InvalidTtlOperator(">>".to_string()));
}

#[test]
fn test_malformed_statements() {
    assert_eq!(
        parse_query("select main").unwrap_err(),
        ParseError::MissingFromClause
    );
    assert!(matches!(
        parse_query("select from main where ttl > soon"),
        Err(ParseError::InvalidTtlValue(_))
    ));
    assert!(matches!(
        parse_query("select from main where key regex '('"),
        Err(ParseError::InvalidPattern { .. })
    ));
    assert!(matches!(
        parse_query("select from main where colour like 'red'"),
        Err(ParseError::InvalidPatternClause(_))
    ));
}

#[test]
fn test_statement_dispatch() {
    let stmt = Statement::parse("select from main where ttl < 100").unwrap();
    let filter = stmt.condition().ttl.unwrap();
    assert_eq!(filter.operator, TtlOperator::LessThan);
    assert_eq!(filter.millis, 100);
    assert!(!stmt.is_mutation());

    assert!(Statement::parse("drop table main").is_err());
}

#[test]
fn test_engine_select_disconnected() {
    let ks = users();
    ks.disconnect();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();
    assert!(matches!(
        engine.select("select from main"),
        Err(Error::NotConnected)
    ));
}

#[test]
fn test_expired_keys_are_not_returned() {
    let ks = users();
    ks.set_value("flash", "gone soon", 1).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));

    let keys: Vec<String> = select(&ks, "select from main").into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["user:1".to_string(), "user:2".to_string()]);
    assert_eq!(ks.get_ttl("user:1").unwrap(), NO_EXPIRATION);
}
