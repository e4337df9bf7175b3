//! Command dispatch: bridges CLI args -> core session calls -> output formatting.

pub mod config_cmd;
pub mod download;
pub mod list;
pub mod report;
pub mod watch;

use fwdms_core::SessionConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a DMS-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(args, config, global).await,
        Command::Download(args) => download::handle(args, config, global).await,
        Command::Report(args) => report::handle(args, &config, global).await,
        Command::Watch(args) => watch::handle(args, config, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
