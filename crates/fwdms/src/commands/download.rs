//! `fwdms download` handler.

use std::io::IsTerminal;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use fwdms_core::{DmsSession, DownloadProgress, SessionConfig};

use crate::cli::{DownloadArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

const BAR_TEMPLATE: &str =
    "{spinner:.cyan} {msg} [{bar:32.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

#[derive(Debug, Serialize)]
struct DownloadSummary {
    device_id: String,
    version: String,
    path: String,
    size_bytes: u64,
}

fn progress_bar(version: &str, hidden: bool) -> ProgressBar {
    if hidden || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let bar = ProgressBar::new(0).with_style(style);
    bar.set_message(version.to_owned());
    bar
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: DownloadArgs,
    config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = DmsSession::new(args.device_id, config)?;

    let bar = progress_bar(&args.version, global.quiet || args.no_progress);
    let ticker = bar.clone();
    let result = session
        .load_firmware_version_with_progress(&args.version, move |p: DownloadProgress| {
            if let Some(total) = p.total {
                ticker.set_length(total);
            }
            ticker.set_position(p.written);
        })
        .await;
    bar.finish_and_clear();
    let path = result?;

    let size_bytes = tokio::fs::metadata(&path).await?.len();
    if !global.quiet {
        eprintln!(
            "✓ Downloaded {} ({})",
            args.version,
            ByteSize(size_bytes)
        );
    }

    let summary = DownloadSummary {
        device_id: session.device_id().to_string(),
        version: args.version,
        path: path.display().to_string(),
        size_bytes,
    };
    let out = output::render_single(
        &global.output,
        &summary,
        |s| s.path.clone(),
        |s| s.path.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
