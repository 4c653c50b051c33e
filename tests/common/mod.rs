//! Integration test common infrastructure.
//!
//! Provides an in-process bus with inspectable state, scripted handlers,
//! and a socket server/client pair for gateway tests.

#![allow(dead_code)]

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

use async_trait::async_trait;
use cmdbus::config::RateLimitConfig;
use cmdbus::db::{
    MemoryAuditRepository, MemoryCommandRepository, MemoryPermissionRepository,
    MemoryRateLimitRepository, Repositories,
};
use cmdbus::handlers::{CommandRegistry, Handler, RegisterOptions, register_builtins};
use cmdbus::middleware::default_stack;
use cmdbus::security::{ManualClock, PermissionService, RateLimitService};
use cmdbus::{BusError, BusResult, Command, CommandBus, CommandResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Start of the manual clock used by [`TestBus`].
pub const T0: i64 = 1_700_000_000_000;

/// Bus on the canonical stack with in-memory state and a manual clock.
pub struct TestBus {
    pub bus: CommandBus,
    pub permissions: PermissionService,
    pub audit: Arc<MemoryAuditRepository>,
    pub rate_limits: Arc<MemoryRateLimitRepository>,
    pub clock: Arc<ManualClock>,
}

impl TestBus {
    /// Built-ins plus whatever `extend` registers; every registered command
    /// is enabled with empty allow-lists.
    pub async fn new(extend: impl FnOnce(&mut CommandRegistry)) -> Self {
        Self::with_config(RateLimitConfig::default(), extend).await
    }

    pub async fn with_config(
        config: RateLimitConfig,
        extend: impl FnOnce(&mut CommandRegistry),
    ) -> Self {
        let audit = Arc::new(MemoryAuditRepository::new());
        let rate_limits = Arc::new(MemoryRateLimitRepository::new());
        let repos = Repositories {
            commands: Arc::new(MemoryCommandRepository::new()),
            permissions: Arc::new(MemoryPermissionRepository::new()),
            rate_limits: rate_limits.clone(),
            audit: audit.clone(),
        };

        let mut registry = CommandRegistry::new();
        let catalog = register_builtins(&mut registry);
        extend(&mut registry);
        catalog.publish(&registry);

        let permissions = PermissionService::from_repositories(&repos);
        for name in registry.names() {
            permissions.enable(name).await.unwrap();
        }

        let clock = Arc::new(ManualClock::new(T0));
        let cooldowns =
            RateLimitService::from_repositories(&repos, config).with_clock(clock.clone());
        let pipeline = default_stack(permissions.clone(), cooldowns, repos.audit.clone());

        Self {
            bus: CommandBus::new(Arc::new(registry), pipeline),
            permissions,
            audit,
            rate_limits,
            clock,
        }
    }

    pub async fn execute(&self, command: Command) -> BusResult<CommandResult> {
        self.bus.execute(command).await
    }
}

/// Handler returning a fixed result and counting its calls.
#[derive(Clone)]
pub struct ScriptedHandler {
    outcome: Arc<dyn Fn() -> BusResult<CommandResult> + Send + Sync>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedHandler {
    pub fn ok(data: serde_json::Value) -> Self {
        Self::new(move || Ok(CommandResult::ok(data.clone())))
    }

    pub fn fail(error: &'static str) -> Self {
        Self::new(move || Ok(CommandResult::fail(error)))
    }

    pub fn throws(message: &'static str) -> Self {
        Self::new(move || Err(BusError::handler(anyhow::anyhow!(message))))
    }

    fn new(outcome: impl Fn() -> BusResult<CommandResult> + Send + Sync + 'static) -> Self {
        Self {
            outcome: Arc::new(outcome),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Register a clone under `name`.
    pub fn register(&self, registry: &mut CommandRegistry, name: &str, options: RegisterOptions) {
        registry.register(name, Arc::new(self.clone()), options);
    }
}

#[async_trait]
impl Handler for ScriptedHandler {
    async fn handle(&self, _command: &Command) -> BusResult<CommandResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}
