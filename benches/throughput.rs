use cmdbus::config::RateLimitConfig;
use cmdbus::db::Repositories;
use cmdbus::handlers::{CommandRegistry, MiddlewarePipeline, builtin_registry};
use cmdbus::middleware::default_stack;
use cmdbus::security::{PermissionService, RateLimitService};
use cmdbus::{Command, CommandBus};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::sync::Arc;
use tokio::runtime::Runtime;

// Measures dispatch overhead for a zero-cooldown command, with and without
// the default middleware stack in front of the handler.

fn bare_bus() -> CommandBus {
    CommandBus::new(Arc::new(builtin_registry()), MiddlewarePipeline::default())
}

fn stacked_bus(rt: &Runtime) -> CommandBus {
    let registry: CommandRegistry = builtin_registry();
    let repos = Repositories::memory();
    let permissions = PermissionService::from_repositories(&repos);
    rt.block_on(async {
        for name in registry.names() {
            permissions.enable(name).await.unwrap();
        }
    });
    let cooldowns = RateLimitService::from_repositories(&repos, RateLimitConfig::default());
    let pipeline = default_stack(permissions, cooldowns, Arc::clone(&repos.audit));
    CommandBus::new(Arc::new(registry), pipeline)
}

fn dispatch_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let bus = bare_bus();
    group.bench_function("ping_bare", |b| {
        b.to_async(&rt)
            .iter(|| async { bus.execute(Command::new("ping", "bench")).await.unwrap() })
    });

    let bus = stacked_bus(&rt);
    group.bench_function("ping_default_stack", |b| {
        b.to_async(&rt)
            .iter(|| async { bus.execute(Command::new("ping", "bench")).await.unwrap() })
    });

    group.bench_function("unknown_command", |b| {
        b.to_async(&rt)
            .iter(|| async { bus.execute(Command::new("missing", "bench")).await.is_err() })
    });

    group.finish();
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let raw: &[u8] = concat!(
        r#"{"name":"echo","userId":"u1","channelId":"general","#,
        r#""args":["hello","world"],"metadata":{"roles":["member"]}}"#,
    )
    .as_bytes();
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("command_json", |b| {
        b.iter(|| serde_json::from_slice::<Command>(raw).unwrap())
    });

    group.finish();
}

criterion_group!(benches, dispatch_benchmark, decode_benchmark);
criterion_main!(benches);
