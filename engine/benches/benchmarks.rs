//! Performance benchmarks for rowset-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rowset_engine::{
    Context, FieldDescriptor, FieldSet, RecordGroup, RecordId, RemoteService, Result, Row,
    Session, Values,
};
use serde_json::json;
use std::rc::Rc;

/// Remote that synthesizes rows on demand.
struct Synthetic;

impl RemoteService for Synthetic {
    fn read(&self, _: &str, ids: &[RecordId], fields: &[String], _: &Context) -> Result<Vec<Row>> {
        Ok(ids
            .iter()
            .map(|id| {
                let mut row = Row::new();
                row.insert("id".into(), json!(id));
                for field in fields {
                    row.insert(field.clone(), json!(format!("{field} {id}")));
                }
                row
            })
            .collect())
    }

    fn default_get(&self, _: &str, _: &[String], _: &Context) -> Result<Values> {
        Ok(Values::new())
    }

    fn create(&self, _: &str, _: &Values, _: &Context) -> Result<RecordId> {
        Ok(1)
    }

    fn write(&self, _: &str, _: &[RecordId], _: &Values, _: &Context) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _: &str, _: &[RecordId], _: &Context) -> Result<()> {
        Ok(())
    }

    fn call(&self, _: &str, _: &str, _: RecordId, _: &Context) -> Result<Vec<RecordId>> {
        Ok(Vec::new())
    }
}

fn field_set() -> FieldSet {
    ["name", "email", "city"]
        .into_iter()
        .map(|name| (name.to_string(), FieldDescriptor::new(name, "char")))
        .collect()
}

fn new_group() -> RecordGroup {
    RecordGroup::new(
        "party",
        &field_set(),
        Rc::new(Synthetic),
        Rc::new(Session::new()),
    )
    .unwrap()
}

fn bench_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("loading");

    for size in [10, 100, 1000].iter() {
        let ids: Vec<RecordId> = (1..=*size).collect();

        group.bench_with_input(BenchmarkId::new("load", size), &ids, |b, ids| {
            b.iter(|| {
                let mut records = new_group();
                records.load(black_box(ids), true).unwrap();
                records
            })
        });

        group.bench_with_input(BenchmarkId::new("pre_load", size), &ids, |b, ids| {
            b.iter(|| {
                let mut records = new_group();
                records.pre_load(black_box(ids), false).unwrap();
                records
            })
        });
    }

    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");
    let ids: Vec<RecordId> = (1..=1000).collect();

    group.bench_function("next_1000", |b| {
        let mut records = new_group();
        records.pre_load(&ids, false).unwrap();
        b.iter(|| {
            for _ in 0..1000 {
                black_box(records.next());
            }
        })
    });

    group.bench_function("get_by_id", |b| {
        let mut records = new_group();
        records.pre_load(&ids, false).unwrap();
        b.iter(|| records.get_by_id(black_box(750)))
    });

    group.bench_function("clear_1000", |b| {
        b.iter(|| {
            let mut records = new_group();
            records.pre_load(&ids, false).unwrap();
            records.clear();
            records
        })
    });

    group.finish();
}

fn bench_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema");
    let ids: Vec<RecordId> = (1..=500).collect();
    let extra: FieldSet = ["street", "zip", "country"]
        .into_iter()
        .map(|name| (name.to_string(), FieldDescriptor::new(name, "char")))
        .collect();

    group.bench_function("add_fields_500", |b| {
        b.iter(|| {
            let mut records = new_group();
            records.load(&ids, false).unwrap();
            records
                .add_fields(black_box(&extra), &Context::new())
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_loading, bench_collection, bench_schema);
criterion_main!(benches);
