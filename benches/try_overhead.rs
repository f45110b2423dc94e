//! Benchmarks for the capture boundary.
//!
//! Compares Try/TryAction against plain `Result` handling doing the same work.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io;
use try_this::{Acceptance, InvokeExt, Try, TryAction};

// ============================================================
// Test helpers
// ============================================================

#[inline(never)]
fn io_err(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, msg)
}

#[inline(never)]
fn fallible_ok() -> Result<i32, io::Error> {
    Ok(42)
}

#[inline(never)]
fn fallible_err() -> Result<i32, io::Error> {
    Err(io_err("fail"))
}

// ============================================================
// 1. Success path
// ============================================================

fn bench_success_try(c: &mut Criterion) {
    c.bench_function("success_try", |b| {
        b.iter(|| black_box(Try::create(fallible_ok, ()).value_or(0)))
    });
}

fn bench_success_rust(c: &mut Criterion) {
    c.bench_function("success_rust", |b| {
        b.iter(|| black_box(fallible_ok().unwrap_or(0)))
    });
}

// ============================================================
// 2. Failure path
// ============================================================

fn bench_failure_try(c: &mut Criterion) {
    c.bench_function("failure_try", |b| {
        b.iter(|| black_box(Try::create(fallible_err, ()).recover(|_| -1).value_or(0)))
    });
}

fn bench_failure_try_with_cause(c: &mut Criterion) {
    c.bench_function("failure_try_with_cause", |b| {
        b.iter(|| {
            let t = Try::create_with_cause(fallible_err, (), "loading");
            black_box(t.try_get_value_or(0, Acceptance::Fallback))
        })
    });
}

fn bench_failure_rust(c: &mut Criterion) {
    c.bench_function("failure_rust", |b| {
        b.iter(|| {
            let e: Result<i32, Box<dyn std::error::Error + Send + Sync>> = fallible_err().map_err(Into::into);
            black_box(e.unwrap_or(-1))
        })
    });
}

// ============================================================
// 3. Panic capture
// ============================================================

fn bench_panic_try(c: &mut Criterion) {
    std::panic::set_hook(Box::new(|_| {}));
    c.bench_function("panic_try", |b| {
        b.iter(|| black_box(Try::create(|d: i32| Ok::<_, io::Error>(10 / d), (black_box(0),)).is_failure()))
    });
    let _ = std::panic::take_hook();
}

// ============================================================
// 4. Sequences
// ============================================================

fn bench_invoke_range(c: &mut Criterion) {
    c.bench_function("invoke_range_100", |b| {
        b.iter(|| {
            let mut total = 0;
            let ok = (0..100)
                .invoke_each(|n: i32| total += n, ())
                .filter(TryAction::is_success)
                .count();
            black_box((ok, total))
        })
    });
}

fn bench_loop_rust(c: &mut Criterion) {
    c.bench_function("loop_rust_100", |b| {
        b.iter(|| {
            let mut total = 0;
            for n in 0..100 {
                total += n;
            }
            black_box(total)
        })
    });
}

// ============================================================
// Benchmark groups
// ============================================================

criterion_group!(success_path, bench_success_try, bench_success_rust);

criterion_group!(
    failure_path,
    bench_failure_try,
    bench_failure_try_with_cause,
    bench_failure_rust,
);

criterion_group!(panics, bench_panic_try);

criterion_group!(sequences, bench_invoke_range, bench_loop_rust);

criterion_main!(success_path, failure_path, panics, sequences);
