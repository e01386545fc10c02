/// Crate name
pub const APP_NAME: &str = "singular";

/// Crate version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unit name reserved for the engine's self reference
pub const SELF_UNIT_NAME: &str = "singular";

/// First id handed out by the thread id allocator
pub const FIRST_THREAD_ID: u64 = 1;
