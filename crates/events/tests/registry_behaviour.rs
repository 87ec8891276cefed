use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, OnceLock};

use proptest::prelude::*;
use tinybus_events::{
    Handler, HandlerMap, MissingHandlerPolicy, Registry, RegistryConfig, Unsubscribed,
    WildcardHandler,
};

type Log = Arc<Mutex<Vec<String>>>;

fn registry() -> Registry<&'static str, i32> {
    tinybus_observability::init_for_tests();
    Registry::new()
}

fn recorder(log: &Log, name: &'static str) -> Handler<i32> {
    let log = log.clone();
    Handler::new(move |v: &i32| log.lock().unwrap().push(format!("{name}:{v}")))
}

fn wildcard_recorder(log: &Log, name: &'static str) -> WildcardHandler<&'static str, i32> {
    let log = log.clone();
    WildcardHandler::new(move |t: &&'static str, v: &i32| {
        log.lock().unwrap().push(format!("{name}:{t}:{v}"))
    })
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn type_isolation() {
    let reg = registry();
    let log = Log::default();
    reg.subscribe("a", recorder(&log, "h"));

    reg.publish("b", 1);
    assert!(entries(&log).is_empty());
}

#[test]
fn wildcard_receives_every_event_in_order() {
    let reg = registry();
    let log = Log::default();
    reg.subscribe_wildcard(wildcard_recorder(&log, "w"));
    reg.subscribe("a", recorder(&log, "a"));

    reg.publish("a", 1);
    reg.publish("b", 2);
    assert_eq!(entries(&log), vec!["a:1", "w:a:1", "w:b:2"]);
}

#[test]
fn cleared_type_remains_usable() {
    let reg = registry();
    let log = Log::default();
    reg.subscribe("a", recorder(&log, "h"));

    reg.unsubscribe(&"a", None);
    reg.publish("a", 1);
    assert!(entries(&log).is_empty());

    reg.subscribe("a", recorder(&log, "h2"));
    reg.publish("a", 2);
    assert_eq!(entries(&log), vec!["h2:2"]);
}

#[test]
fn targeted_removal_keeps_the_others() {
    let reg = registry();
    let log = Log::default();
    let h1 = recorder(&log, "h1");
    reg.subscribe("a", h1.clone());
    reg.subscribe("a", recorder(&log, "h2"));

    assert_eq!(reg.unsubscribe(&"a", Some(&h1)), Unsubscribed::Removed);
    reg.publish("a", 1);
    assert_eq!(entries(&log), vec!["h2:1"]);
}

#[test]
fn duplicate_handlers_are_invoked_independently() {
    let reg = registry();
    let log = Log::default();
    let h = recorder(&log, "h");
    reg.subscribe("a", h.clone());
    reg.subscribe("a", h);

    reg.publish("a", 5);
    assert_eq!(entries(&log), vec!["h:5", "h:5"]);
}

#[test]
fn handler_removing_itself_runs_once() {
    let reg = registry();
    let log = Log::default();
    let slot: Arc<OnceLock<Handler<i32>>> = Arc::default();

    let (r, me, l) = (reg.clone(), slot.clone(), log.clone());
    let handler = Handler::new(move |v: &i32| {
        l.lock().unwrap().push(format!("self:{v}"));
        if let Some(h) = me.get() {
            r.unsubscribe(&"a", Some(h));
        }
    });
    slot.set(handler.clone()).unwrap();

    reg.subscribe("a", handler);
    reg.subscribe("a", recorder(&log, "other"));

    reg.publish("a", 1);
    reg.publish("a", 2);
    assert_eq!(entries(&log), vec!["self:1", "other:1", "other:2"]);
}

#[test]
fn mutations_during_publish_apply_to_the_next_publish() {
    let reg = registry();
    let log = Log::default();
    let victim = recorder(&log, "victim");

    let (r, v, l) = (reg.clone(), victim.clone(), log.clone());
    reg.on("a", move |_| {
        r.unsubscribe(&"a", Some(&v));
        r.subscribe("a", recorder(&l, "late"));
    });
    reg.subscribe("a", victim);

    reg.publish("a", 1);
    assert_eq!(entries(&log), vec!["victim:1"]);

    reg.publish("a", 2);
    assert_eq!(entries(&log), vec!["victim:1", "late:2"]);
}

#[test]
fn wildcard_added_by_typed_handler_runs_in_same_publish() {
    let reg = registry();
    let log = Log::default();
    let late = wildcard_recorder(&log, "w");

    let (r, w) = (reg.clone(), late.clone());
    let adder = reg.on("a", move |_| r.subscribe_wildcard(w.clone()));

    reg.publish("a", 1);
    assert_eq!(entries(&log), vec!["w:a:1"]);

    reg.unsubscribe(&"a", Some(&adder));
    reg.publish("b", 2);
    assert_eq!(entries(&log), vec!["w:a:1", "w:b:2"]);
}

#[test]
fn wildcard_removed_by_typed_handler_skips_same_publish() {
    let reg = registry();
    let log = Log::default();
    let w = wildcard_recorder(&log, "w");
    reg.subscribe_wildcard(w.clone());

    let r = reg.clone();
    reg.on("a", move |_| {
        r.unsubscribe_wildcard(Some(&w));
    });

    reg.publish("a", 1);
    assert!(entries(&log).is_empty());
    assert_eq!(reg.summary().wildcard_handlers, Some(0));
}

#[test]
fn wildcard_removing_itself_runs_once() {
    let reg = registry();
    let log = Log::default();
    let slot: Arc<OnceLock<WildcardHandler<&'static str, i32>>> = Arc::default();

    let (r, me, l) = (reg.clone(), slot.clone(), log.clone());
    let handler = WildcardHandler::new(move |t: &&'static str, v: &i32| {
        l.lock().unwrap().push(format!("self:{t}:{v}"));
        if let Some(h) = me.get() {
            assert_eq!(r.unsubscribe_wildcard(Some(h)), Unsubscribed::Removed);
        }
    });
    slot.set(handler.clone()).unwrap();

    reg.subscribe_wildcard(handler);
    reg.subscribe_wildcard(wildcard_recorder(&log, "other"));

    reg.publish("a", 1);
    reg.publish("b", 2);
    assert_eq!(entries(&log), vec!["self:a:1", "other:a:1", "other:b:2"]);
}

#[test]
fn nested_publish_completes_before_outer_continues() {
    let reg = registry();
    let log = Log::default();

    let (r, l) = (reg.clone(), log.clone());
    reg.on("outer", move |v| {
        l.lock().unwrap().push(format!("outer-start:{v}"));
        r.publish("inner", v + 1);
        l.lock().unwrap().push(format!("outer-end:{v}"));
    });
    reg.subscribe("inner", recorder(&log, "inner"));
    reg.subscribe("outer", recorder(&log, "outer-next"));

    reg.publish("outer", 1);
    assert_eq!(
        entries(&log),
        vec!["outer-start:1", "inner:2", "outer-end:1", "outer-next:1"]
    );
}

#[test]
fn panicking_handler_aborts_the_rest_of_the_publish() {
    let reg = registry();
    let log = Log::default();
    reg.subscribe("a", recorder(&log, "before"));
    let bomb = reg.on("a", |_| panic!("handler failed"));
    reg.subscribe("a", recorder(&log, "after"));
    reg.subscribe_wildcard(wildcard_recorder(&log, "w"));

    let result = catch_unwind(AssertUnwindSafe(|| reg.publish("a", 1)));
    assert!(result.is_err());
    assert_eq!(entries(&log), vec!["before:1"]);

    // the map is untouched and the registry still works
    reg.unsubscribe(&"a", Some(&bomb));
    reg.publish("a", 2);
    assert_eq!(entries(&log), vec!["before:1", "before:2", "after:2", "w:a:2"]);
}

#[test]
fn unsubscribing_unknown_types_has_no_side_effects() {
    let reg = registry();
    let log = Log::default();
    reg.subscribe("a", recorder(&log, "h"));
    let stranger = recorder(&log, "stranger");

    assert_eq!(reg.unsubscribe(&"never", None), Unsubscribed::UnknownType);
    assert_eq!(reg.unsubscribe(&"never", Some(&stranger)), Unsubscribed::UnknownType);

    let summary = reg.summary();
    assert_eq!(summary.event_types.len(), 1);
    assert_eq!(summary.total_handlers(), 1);

    reg.publish("a", 1);
    assert_eq!(entries(&log), vec!["h:1"]);
}

#[test]
fn missing_handler_quirk_is_opt_in() {
    let log = Log::default();
    let stranger = recorder(&log, "stranger");

    let plain: Registry<&str, i32> = Registry::new();
    plain.subscribe("a", recorder(&log, "h1"));
    assert_eq!(plain.unsubscribe(&"a", Some(&stranger)), Unsubscribed::NotFound);
    assert_eq!(plain.summary().total_handlers(), 1);

    let config = RegistryConfig::from_json(r#"{"missing_handler":"remove_first"}"#).unwrap();
    let compat: Registry<&str, i32> = Registry::with_config(config);
    compat.subscribe("a", recorder(&log, "h1"));
    compat.subscribe("a", recorder(&log, "h2"));
    assert_eq!(
        compat.unsubscribe(&"a", Some(&stranger)),
        Unsubscribed::RemovedFirstInstead
    );
    compat.publish("a", 1);
    assert_eq!(entries(&log), vec!["h2:1"]);
    assert_eq!(compat.config().missing_handler, MissingHandlerPolicy::RemoveFirst);
}

#[test]
fn registries_over_one_map_share_handlers() {
    tinybus_observability::init_for_tests();
    let log = Log::default();

    let mut seeded: HandlerMap<&'static str, i32> = HandlerMap::new();
    seeded.push("a", recorder(&log, "seeded"));
    let shared = seeded.into_shared();

    let first = Registry::with_map(shared.clone());
    let second = Registry::with_map(shared.clone());

    second.subscribe("a", recorder(&log, "late"));
    first.publish("a", 1);
    assert_eq!(entries(&log), vec!["seeded:1", "late:1"]);

    let map = shared.read().unwrap();
    assert_eq!(map.handler_count(&"a"), 2);
    assert_eq!(map.event_types().collect::<Vec<_>>(), vec![&"a"]);
}

#[test]
fn subscribe_from_many_threads() {
    let reg = registry();
    let log = Log::default();

    std::thread::scope(|s| {
        for _ in 0..8 {
            let (reg, log) = (&reg, &log);
            s.spawn(move || reg.subscribe("a", recorder(log, "t")));
        }
    });

    reg.publish("a", 0);
    assert_eq!(entries(&log).len(), 8);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: publish invokes handlers exactly in subscription order, duplicates included.
    #[test]
    fn invocation_order_matches_subscription_order(
        picks in proptest::collection::vec(0usize..4, 0..32),
        payload in any::<i32>()
    ) {
        let reg: Registry<&str, i32> = Registry::new();
        let log = Log::default();
        let pool = [
            recorder(&log, "h0"),
            recorder(&log, "h1"),
            recorder(&log, "h2"),
            recorder(&log, "h3"),
        ];
        for &i in &picks {
            reg.subscribe("topic", pool[i].clone());
        }

        reg.publish("topic", payload);

        let expected: Vec<String> = picks.iter().map(|i| format!("h{i}:{payload}")).collect();
        prop_assert_eq!(entries(&log), expected);
    }

    /// Property: removing a handler drops exactly its first occurrence.
    #[test]
    fn removal_drops_first_occurrence(
        picks in proptest::collection::vec(0usize..3, 1..24),
        target in 0usize..3
    ) {
        let reg: Registry<&str, i32> = Registry::new();
        let log = Log::default();
        let pool = [recorder(&log, "h0"), recorder(&log, "h1"), recorder(&log, "h2")];
        for &i in &picks {
            reg.subscribe("topic", pool[i].clone());
        }

        let outcome = reg.unsubscribe(&"topic", Some(&pool[target]));

        let mut expected = picks.clone();
        match expected.iter().position(|&i| i == target) {
            Some(idx) => {
                expected.remove(idx);
                prop_assert_eq!(outcome, Unsubscribed::Removed);
            }
            None => prop_assert_eq!(outcome, Unsubscribed::NotFound),
        }

        reg.publish("topic", 0);
        let expected: Vec<String> = expected.iter().map(|i| format!("h{i}:0")).collect();
        prop_assert_eq!(entries(&log), expected);
    }
}
