//! Security module for the command bus.
//!
//! Provides the two decision services the pipeline consults:
//! - **Permission**: category policy, global enable flag, and opt-in
//!   role/channel/user allow-lists
//! - **Rate Limiting**: per-command cooldowns resolved by category
//!
//! # Architecture
//!
//! ```text
//! PermissionService                     RateLimitService
//!   category policy                       category -> cooldown table
//!   -> enabled -> users                   atomic try_set_if_older_than
//!   -> channels -> roles                  Clock (system / manual)
//! ```

pub mod clock;
pub mod permission;
pub mod rate_limit;

pub use clock::{Clock, ManualClock, SystemClock};
pub use permission::{CategoryPolicy, PermissionService};
pub use rate_limit::RateLimitService;
