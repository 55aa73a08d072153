//! Link table binding benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use uxlink::guid::InterfaceGuid;
use uxlink::linkage::{BinderTable, LibraryLinkage, LinkTable, LinkTableEntry, RawPointer, cap};

unsafe extern "C" fn noop() {}
unsafe extern "C" fn noop_f64(_: f64) {}

/// A table with every known capability first and `unknown` future records after it.
fn table(unknown: usize) -> LinkTable {
    let known = [
        LinkTableEntry::publish::<cap::Save>(noop),
        LinkTableEntry::publish::<cap::Restore>(noop),
        LinkTableEntry::publish::<cap::Identity>(noop),
        LinkTableEntry::publish::<cap::NotifyComplete>(noop),
        LinkTableEntry::publish::<cap::Rotate>(noop_f64),
    ];
    let future = (0..unknown).map(|i| {
        let guid = InterfaceGuid::from_u128(0x7578_6775_6910_4001_8000_0001_0000_0000 | i as u128);
        LinkTableEntry::new(guid, noop as RawPointer)
    });
    LinkTable::from_entries(known.into_iter().chain(future))
}

fn bench_bind_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_table");
    let binders = BinderTable::standard();

    for unknown in [0, 16, 256, 4096] {
        let table = table(unknown);

        group.throughput(Throughput::Elements(table.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(unknown), &table, |b, table| {
            b.iter(|| {
                let mut linkage = LibraryLinkage::default();
                let report = unsafe { binders.bind_table(table, &mut linkage) };
                std::hint::black_box(report);
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("binder_lookup");
    let binders = BinderTable::standard();
    let known = uxlink::guid::alias::FN_NOTIFY_COMPLETE;
    let unknown = InterfaceGuid::from_u128(u128::MAX - 1);

    group.bench_function("known", |b| b.iter(|| std::hint::black_box(binders.lookup(&known))));
    group.bench_function("unknown", |b| b.iter(|| std::hint::black_box(binders.lookup(&unknown))));

    group.finish();
}

criterion_group!(benches, bench_bind_table, bench_lookup);
criterion_main!(benches);
