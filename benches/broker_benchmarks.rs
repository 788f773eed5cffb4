use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use ctxbroker::context::interface::memory_context;
use ctxbroker::context::{Context, ContextBroker, ContextValue, InterfaceRef, PluginId, Selector};

struct Bank(String);

impl Context for Bank {
    fn interfaces(&self) -> Vec<InterfaceRef> {
        vec![memory_context()]
    }

    fn id(&self) -> Option<&str> {
        Some(self.0.as_str())
    }
}

fn populated_broker(count: usize) -> ContextBroker {
    let broker = ContextBroker::new();
    let mem = memory_context();
    for i in 0..count {
        let value = ContextValue::new(Arc::new(Bank(format!("bank{}", i % 4))));
        let owner = PluginId((i % 8) as u64);
        broker
            .register(owner, &value, &mem)
            .expect("fixture registers");
    }
    broker.set_trust_token("bench");
    broker.bind_topology("bench", Arc::new(|_: PluginId, _: PluginId| true));
    broker
}

fn bench_lookups(c: &mut Criterion) {
    let broker = populated_broker(64);
    let mem = memory_context();

    c.bench_function("lookup_first", |b| {
        b.iter(|| broker.get(black_box(PluginId(99)), &mem, Selector::First))
    });
    c.bench_function("lookup_ordinal", |b| {
        b.iter(|| broker.get(PluginId(99), &mem, Selector::Ordinal(black_box(63))))
    });
    c.bench_function("lookup_id_ordinal", |b| {
        b.iter(|| broker.get(PluginId(99), &mem, Selector::IdOrdinal(black_box("bank3"), 15)))
    });
}

criterion_group!(benches, bench_lookups);
criterion_main!(benches);
