//! `fwdms report` handler.
//!
//! Unlike library callers, the CLI waits for the service's answer so the
//! user sees whether the report landed.

use fwdms_core::{InstallReporter, SessionConfig};

use crate::cli::{GlobalOpts, ReportArgs};
use crate::error::CliError;

pub async fn handle(
    args: ReportArgs,
    config: &SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.device_uuid.trim().is_empty() || args.bundle_id.trim().is_empty() {
        return Err(CliError::Validation {
            field: "report".into(),
            reason: "device UUID and bundle id must not be empty".into(),
        });
    }

    let reporter = InstallReporter::new(config)?;
    reporter.send(&args.device_uuid, &args.bundle_id).await?;

    if !global.quiet {
        eprintln!(
            "✓ Reported {} installed on {}",
            args.bundle_id, args.device_uuid
        );
    }
    Ok(())
}
