//! Command handlers and the dispatch core they plug into.
//!
//! [`core`] holds the registry, the middleware pipeline, and the traits at
//! their seams. The handlers beside it are the built-in commands every
//! deployment gets.

pub mod core;
mod echo;
mod help;
mod ping;

pub use self::core::{
    CommandInfo, CommandMeta, CommandRegistry, DEFAULT_CATEGORY, DEFAULT_GROUP, Handler,
    Middleware, MiddlewarePipeline, Next, OptionSpec, PermissionRequirement, PipelineContext,
    RegisterOptions, Terminal,
};
pub use echo::EchoHandler;
pub use help::{HelpCatalog, HelpHandler};
pub use ping::PingHandler;

use std::sync::Arc;

/// Register the built-in commands and return the help catalog.
///
/// Call [`HelpCatalog::publish`] once every other command is registered.
pub fn register_builtins(registry: &mut CommandRegistry) -> HelpCatalog {
    let catalog = HelpCatalog::default();

    registry.register(
        "ping",
        Arc::new(PingHandler),
        RegisterOptions::default()
            .description("Check that the bus is alive")
            .usage("ping")
            .example("ping"),
    );
    registry.register(
        "help",
        Arc::new(HelpHandler::new(catalog.clone())),
        RegisterOptions::default()
            .description("List commands, or describe one")
            .usage("help [command]")
            .example("help")
            .example("help echo")
            .option(OptionSpec::optional("command", "Command to describe")),
    );
    registry.register(
        "echo",
        Arc::new(EchoHandler),
        RegisterOptions::default()
            .category("messaging")
            .group("fun")
            .description("Repeat the given text")
            .usage("echo <text...>")
            .example("echo hello world")
            .option(OptionSpec::required("text", "Text to repeat"))
            .cooldown("3s"),
    );

    catalog
}

/// Registry with only the built-in commands, catalog already published.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    let catalog = register_builtins(&mut registry);
    catalog.publish(&registry);
    registry
}
