//! Shared wiring for the orderflow binaries.

pub mod watch;
