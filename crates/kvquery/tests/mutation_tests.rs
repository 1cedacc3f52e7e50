use kvquery::{
    parse_delete_query, parse_update_query, plan_delete, Engine, EngineConfig, Error, Keyspace,
    MemoryKeyspace, MutationSummary, Outcome, ParseError, Result, UpdateKind, NO_EXPIRATION,
};
use std::cell::Cell;
use std::collections::HashSet;

fn users() -> MemoryKeyspace {
    let ks = MemoryKeyspace::new();
    ks.set_value("user:1", "alice", 0).unwrap();
    ks.set_value("user:2", "bob", 5000).unwrap();
    ks
}

/// Wraps a keyspace and refuses to write or delete selected keys.
struct ReadOnlyKeys<'a> {
    inner: &'a MemoryKeyspace,
    locked: HashSet<&'static str>,
}

impl Keyspace for ReadOnlyKeys<'_> {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn list_all_keys(&self) -> Result<Vec<String>> {
        self.inner.list_all_keys()
    }

    fn get_value(&self, key: &str) -> Result<String> {
        self.inner.get_value(key)
    }

    fn get_ttl(&self, key: &str) -> Result<i64> {
        self.inner.get_ttl(key)
    }

    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()> {
        if self.locked.contains(key) {
            return Err(Error::write(key, "read-only key"));
        }
        self.inner.set_value(key, value, ttl_millis)
    }

    fn delete_key(&self, key: &str) -> Result<bool> {
        if self.locked.contains(key) {
            return Err(Error::write(key, "read-only key"));
        }
        self.inner.delete_key(key)
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        self.inner.key_exists(key)
    }
}

/// Loses its connection after a fixed number of per-key operations.
struct Dropping {
    inner: MemoryKeyspace,
    budget: Cell<usize>,
}

impl Dropping {
    fn new(inner: MemoryKeyspace, budget: usize) -> Self {
        Self {
            inner,
            budget: Cell::new(budget),
        }
    }

    fn reconnect(&self) {
        self.budget.set(usize::MAX);
        self.inner.connect();
    }

    fn tick(&self) {
        match self.budget.get() {
            0 => self.inner.disconnect(),
            left => self.budget.set(left - 1),
        }
    }
}

impl Keyspace for Dropping {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn list_all_keys(&self) -> Result<Vec<String>> {
        self.inner.list_all_keys()
    }

    fn get_value(&self, key: &str) -> Result<String> {
        self.tick();
        self.inner.get_value(key)
    }

    fn get_ttl(&self, key: &str) -> Result<i64> {
        self.tick();
        self.inner.get_ttl(key)
    }

    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()> {
        self.tick();
        self.inner.set_value(key, value, ttl_millis)
    }

    fn delete_key(&self, key: &str) -> Result<bool> {
        self.tick();
        self.inner.delete_key(key)
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        self.tick();
        self.inner.key_exists(key)
    }
}

fn three_users() -> MemoryKeyspace {
    let ks = users();
    ks.set_value("user:3", "carol", 0).unwrap();
    ks
}

#[test]
fn test_update_value_scenario() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    let summary = engine
        .update("update main set value = 'carol' where key like 'user:1'")
        .unwrap();

    assert_eq!(summary, MutationSummary { applied: 1, skipped: 0 });
    assert_eq!(ks.get_value("user:1").unwrap(), "carol");
    assert_eq!(ks.get_ttl("user:1").unwrap(), NO_EXPIRATION);
    assert_eq!(ks.get_value("user:2").unwrap(), "bob");
}

#[test]
fn test_update_parse() {
    let query = parse_update_query("UPDATE main SET key = 'member:1' WHERE key like 'user:1'").unwrap();
    assert_eq!(query.kind, UpdateKind::Key);
    assert_eq!(query.new_value, "member:1");
    assert_eq!(query.source, "main");

    assert!(matches!(
        parse_update_query("update main set colour = 'red' where key like '%'"),
        Err(ParseError::InvalidUpdateType(_))
    ));
    assert_eq!(
        parse_update_query("update main set value = 'x'").unwrap_err(),
        ParseError::MissingWhereClause
    );
    assert_eq!(
        parse_update_query("update main value = 'x' where key like '%'").unwrap_err(),
        ParseError::MissingSetClause
    );
    assert!(matches!(
        parse_update_query("update main set ttl = 'soon' where key like '%'"),
        Err(ParseError::InvalidTtlValue(_))
    ));
}

#[test]
fn test_update_ttl_then_select() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    engine
        .update("update main set ttl = 0 where ttl > 0")
        .unwrap();

    let persistent = engine.select("select from main where ttl == -1").unwrap();
    assert_eq!(persistent.len(), 2);
}

#[test]
fn test_rename_keeps_value_and_ttl() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    engine
        .update("update main set key = 'archived:2' where value like 'bob'")
        .unwrap();

    assert!(!ks.key_exists("user:2").unwrap());
    assert_eq!(ks.get_value("archived:2").unwrap(), "bob");
    let ttl = ks.get_ttl("archived:2").unwrap();
    assert!(ttl > 0 && ttl <= 5000);
}

#[test]
fn test_update_failures_are_counted() {
    let ks = users();
    let guarded = ReadOnlyKeys {
        inner: &ks,
        locked: HashSet::from(["user:1"]),
    };
    let engine = Engine::new(&guarded, EngineConfig::default()).unwrap();

    let summary = engine
        .update("update main set value = 'x' where key like 'user:%'")
        .unwrap();

    assert_eq!(summary, MutationSummary { applied: 1, skipped: 1 });
    assert_eq!(ks.get_value("user:1").unwrap(), "alice");
    assert_eq!(ks.get_value("user:2").unwrap(), "x");
}

#[test]
fn test_delete_scenario() {
    let ks = users();
    let query = parse_delete_query("delete from main where key like 'user:%'").unwrap();

    let mut plan = plan_delete(&ks, &query).unwrap();
    assert_eq!(plan.keys(), ["user:1", "user:2"]);

    let summary = plan.confirm().unwrap();
    assert_eq!(summary.applied, 2);

    let remaining = ks.list_all_keys().unwrap();
    assert!(!remaining.contains(&"user:1".to_string()));
    assert!(!remaining.contains(&"user:2".to_string()));
}

#[test]
fn test_second_confirm_is_noop() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();
    let mut plan = engine
        .plan_delete("delete from main where key like 'user:%'")
        .unwrap();

    plan.confirm().unwrap();
    ks.set_value("user:1", "back again", 0).unwrap();

    assert_eq!(plan.confirm().unwrap(), MutationSummary::default());
    assert!(ks.key_exists("user:1").unwrap());
}

#[test]
fn test_unconfirmed_plan_deletes_nothing() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    let plan = engine.plan_delete("delete from main where ttl > 0").unwrap();
    assert_eq!(plan.keys(), ["user:2"]);
    drop(plan);

    assert_eq!(ks.len().unwrap(), 2);
}

#[test]
fn test_delete_failures_are_counted() {
    let ks = users();
    let guarded = ReadOnlyKeys {
        inner: &ks,
        locked: HashSet::from(["user:2"]),
    };
    let query = parse_delete_query("delete from main where key like 'user:%'").unwrap();

    let mut plan = plan_delete(&guarded, &query).unwrap();
    let summary = plan.confirm().unwrap();

    assert_eq!(summary, MutationSummary { applied: 1, skipped: 1 });
    assert_eq!(ks.list_all_keys().unwrap(), vec!["user:2".to_string()]);
}

#[test]
fn test_delete_requires_where() {
    assert_eq!(
        parse_delete_query("delete from main").unwrap_err(),
        ParseError::MissingWhereClause
    );
    assert_eq!(
        parse_delete_query("delete main where key like '%'").unwrap_err(),
        ParseError::MissingFromClause
    );
}

#[test]
fn test_run_mixed_statements() {
    let ks = users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    let statements = [
        "update main set value = 'gone' where key like 'user:2'",
        "delete from main where value like 'gone'",
    ];

    for text in statements {
        match engine.run(text).unwrap() {
            Outcome::Updated(summary) => assert_eq!(summary.applied, 1),
            Outcome::PendingDelete(mut plan) => {
                assert_eq!(plan.keys(), ["user:2"]);
                assert_eq!(plan.confirm().unwrap().applied, 1);
            }
            Outcome::Rows(rows) => panic!("unexpected rows {:?}", rows),
        }
    }

    assert_eq!(ks.list_all_keys().unwrap(), vec!["user:1".to_string()]);
}

#[test]
fn test_mutations_refuse_disconnected_keyspace() {
    let ks = users();
    ks.disconnect();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    assert!(matches!(
        engine.update("update main set value = 'x' where key like '%'"),
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        engine.plan_delete("delete from main where key like '%'"),
        Err(Error::NotConnected)
    ));
}

#[test]
fn test_select_fails_when_connection_drops_mid_scan() {
    let ks = Dropping::new(three_users(), 1);
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    assert!(matches!(
        engine.select("select from main"),
        Err(Error::NotConnected)
    ));

    ks.reconnect();
    assert_eq!(engine.select("select from main").unwrap().len(), 3);
}

#[test]
fn test_update_fails_when_connection_drops() {
    // Three value reads for the scan, then the first TTL read drops.
    let ks = Dropping::new(three_users(), 3);
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    assert!(matches!(
        engine.update("update main set value = 'x' where key like 'user:%'"),
        Err(Error::NotConnected)
    ));

    ks.reconnect();
    assert_eq!(ks.inner.get_value("user:1").unwrap(), "alice");
}

#[test]
fn test_interrupted_deletion_can_be_retried() {
    // Three value reads for the scan and one delete before the drop.
    let ks = Dropping::new(three_users(), 4);
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();
    let mut plan = engine
        .plan_delete("delete from main where key like 'user:%'")
        .unwrap();

    assert!(matches!(plan.confirm(), Err(Error::NotConnected)));
    assert!(!plan.is_confirmed());
    assert_eq!(plan.remaining(), ["user:2", "user:3"]);

    ks.reconnect();
    assert_eq!(
        plan.confirm().unwrap(),
        MutationSummary { applied: 3, skipped: 0 }
    );
    assert!(ks.inner.is_empty().unwrap());
    assert_eq!(plan.confirm().unwrap(), MutationSummary::default());
}

#[test]
fn test_rename_of_many_keys_keeps_the_rest() {
    let ks = three_users();
    let engine = Engine::new(&ks, EngineConfig::default()).unwrap();

    let summary = engine
        .update("update main set key = 'merged' where key like 'user:%'")
        .unwrap();

    assert_eq!(summary, MutationSummary { applied: 1, skipped: 2 });
    assert_eq!(ks.get_value("merged").unwrap(), "alice");
    let mut keys = ks.list_all_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["merged", "user:2", "user:3"]);
}
