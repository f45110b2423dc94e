use std::cell::{Cell, RefCell};
use std::io;

use try_this::{invoke, ActionToken, Fault, InvokeExt, Try, TryAction};

fn save(store: &RefCell<Vec<String>>, key: &str, value: &str) -> io::Result<()> {
    if key.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty key"));
    }
    store.borrow_mut().push(format!("{key}={value}"));
    Ok(())
}

#[test]
fn invoke_runs_the_action_with_its_arguments() {
    let store = RefCell::new(Vec::new());
    let done = TryAction::invoke(save, (&store, "a", "1"));
    assert!(done.is_success());
    assert_eq!(store.borrow().as_slice(), ["a=1"]);

    let failed = TryAction::invoke_with_cause(save, (&store, "", "1"), "persisting settings");
    let failure = failed.error().unwrap();
    assert_eq!(failure.cause(), Some("persisting settings"));
    assert_eq!(failure.underlying().downcast_ref::<io::Error>().map(io::Error::kind), Some(io::ErrorKind::InvalidInput));
}

#[test]
fn tap_counts_exactly_once_per_outcome() {
    let successes = Cell::new(0);
    let failures = Cell::new(0);

    for fail in [false, true, false] {
        TryAction::invoke(|f: bool| -> () { if f { panic!("failed") } }, (fail,))
            .tap(|| successes.set(successes.get() + 1), |_| failures.set(failures.get() + 1));
    }

    assert_eq!((successes.get(), failures.get()), (2, 1));
}

#[test]
fn equality_needs_the_same_action() {
    fn flush() {}
    fn close() {}

    assert_eq!(TryAction::invoke(flush, ()), TryAction::invoke(flush, ()));
    assert_ne!(TryAction::invoke(flush, ()), TryAction::invoke(close, ()));
    assert_eq!(TryAction::invoke(flush, ()).token(), ActionToken::of_val(&flush));
}

#[test]
fn failed_action_maps_to_failed_try() {
    let t: Try<&str> = TryAction::invoke(|| Err::<(), _>(io::Error::from(io::ErrorKind::TimedOut)), ())
        .map(|| "unreachable");
    assert_eq!(t.error().unwrap().flag(), "TRY_CREATE");
    assert!(t.error().unwrap().underlying().is::<io::Error>());
}

#[test]
fn invoke_range_passes_index_driven_arguments() {
    let seen = RefCell::new(Vec::new());
    let results: Vec<TryAction> = TryAction::invoke_range(
        vec![1, 2, 3],
        |item: i32, scaled: usize| seen.borrow_mut().push((item, scaled)),
        (|i: usize| i * 10,),
    )
    .collect();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(TryAction::is_success));
    assert_eq!(seen.borrow()[1], (2, 10));
}

#[test]
fn invoke_range_has_many_factories() {
    let seen = RefCell::new(Vec::new());
    let _: Vec<_> = ["x", "y"]
        .invoke_each(
            |item: &str, a: usize, b: String, c: bool| seen.borrow_mut().push(format!("{item}{a}{b}{c}")),
            (|i: usize| i + 1, |i: usize| "-".repeat(i), |i: usize| i % 2 == 0),
        )
        .collect();
    assert_eq!(seen.into_inner(), ["x1true", "y2-false"]);
}

#[test]
fn invoke_macro_wraps_a_block() {
    let log = RefCell::new(Vec::new());
    let t = invoke! {
        cause = "writing log";
        let n: u32 = "12".parse()?;
        log.borrow_mut().push(n);
    };
    assert!(t.is_success());
    assert_eq!(log.into_inner(), [12]);
}

#[tokio::test]
async fn invoke_async_awaits_the_action_first() {
    let called = Cell::new(false);
    let resolve = async {
        tokio::task::yield_now().await;
        Ok::<_, io::Error>(|| called.set(true))
    };
    let t = TryAction::invoke_async(resolve, ()).await;
    assert!(t.is_success());
    assert!(called.get());
}

#[tokio::test]
async fn invoke_async_captures_the_action_failure() {
    let resolve = async { Ok::<_, io::Error>(|code: i32| -> Result<(), io::Error> { Err(io::Error::from_raw_os_error(code)) }) };
    let t = TryAction::invoke_async_with_cause(resolve, (2,), "running hook").await;
    let failure = t.error().unwrap();
    assert_eq!(failure.cause(), Some("running hook"));
    assert_eq!(failure.code(), 0x0C02);
}

#[test]
fn invoke_range_with_missing_action_fails_every_element() {
    let results: Vec<TryAction> = TryAction::invoke_range([1, 2], None::<fn(i32)>, ()).collect();

    assert_eq!(results.len(), 2);
    for t in &results {
        let failure = t.error().unwrap();
        assert!(matches!(failure.underlying().downcast_ref::<Fault>(), Some(Fault::Missing("callable"))));
    }
}

#[test]
fn handler_table_entries_keep_distinct_tokens() {
    fn flush() -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "flush failed"))
    }
    fn close() -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "close failed"))
    }

    let handlers: Vec<fn() -> io::Result<()>> = vec![flush, close];
    let outcomes: Vec<TryAction> = handlers.iter().map(|h| TryAction::invoke(*h, ())).collect();
    assert_ne!(outcomes[0].token(), outcomes[1].token());

    let optional = [Some(handlers[0]), Some(handlers[1])];
    assert_ne!(TryAction::invoke(optional[0], ()).token(), TryAction::invoke(optional[1], ()).token());
}
