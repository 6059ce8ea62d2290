//! CLI subcommand implementations.

pub mod summary;
pub mod timeline;
pub mod util;
pub mod window;
