#![no_main]

use arbitrary::Arbitrary;
use kvquery::{Engine, EngineConfig, Keyspace, MemoryKeyspace};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Set { key: String, value: String, ttl: u16 },
    Run(String),
    Confirm(String),
}

fuzz_target!(|ops: Vec<Op>| {
    let keyspace = MemoryKeyspace::new();
    let engine = match Engine::new(&keyspace, EngineConfig::default().with_max_statement_length(4096)) {
        Ok(engine) => engine,
        Err(_) => return,
    };

    for op in ops.into_iter().take(64) {
        match op {
            Op::Set { key, value, ttl } => {
                let _ = keyspace.set_value(&key, &value, u64::from(ttl));
            }
            Op::Run(text) => {
                let _ = engine.run(&text);
            }
            Op::Confirm(text) => {
                if let Ok(mut plan) = engine.plan_delete(&text) {
                    let planned = plan.len();
                    if let Ok(summary) = plan.confirm() {
                        assert_eq!(summary.applied + summary.skipped, planned);
                    }
                    // A confirmed plan never runs twice
                    if let Ok(again) = plan.confirm() {
                        assert_eq!(again.applied, 0);
                    }
                }
            }
        }
    }
});
