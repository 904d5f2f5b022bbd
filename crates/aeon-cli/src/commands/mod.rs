//! CLI subcommand implementations.

pub mod init;
pub mod report;
pub mod status;
pub mod track;
pub mod util;
pub mod vacation;
