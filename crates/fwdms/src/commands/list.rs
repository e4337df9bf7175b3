//! `fwdms list` handler.

use bytesize::ByteSize;
use tabled::Tabled;

use fwdms_core::{DmsSession, FirmwareVersionEntry, SessionConfig};

use crate::cli::{GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FirmwareRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&FirmwareVersionEntry> for FirmwareRow {
    fn from(e: &FirmwareVersionEntry) -> Self {
        Self {
            version: e.version.clone(),
            tag: e.tag.clone(),
            size: ByteSize(e.size_bytes).to_string(),
            description: e.description.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    args: ListArgs,
    config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let session = DmsSession::new(args.device_id, config)?;
    let list = session.retrieve_available_versions().await?;

    let entries: Vec<FirmwareVersionEntry> = match args.tag {
        Some(ref tag) => list.with_tag(tag).cloned().collect(),
        None => list.to_vec(),
    };

    if entries.is_empty() && !global.quiet {
        eprintln!("No firmware versions offered for {}", session.device_id());
    }

    let out = output::render_list(&global.output, &entries, |e| FirmwareRow::from(e), |e| {
        e.version.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
