//! `fwdms watch` handler: streams session events until Ctrl-C.

use std::time::Duration;

use chrono::{Local, SecondsFormat};
use futures_util::StreamExt;
use serde_json::json;
use tracing::warn;

use fwdms_core::{DmsSession, ReachabilityState, SessionConfig, SessionEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: WatchArgs,
    mut config: SessionConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.probe_interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "probe-interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        config = config.with_probe_interval(Duration::from_secs(secs));
    }

    let session = DmsSession::new(args.device_id, config)?;
    let mut events = session.events();
    let color = output::should_color(&global.color);

    if !global.quiet {
        eprintln!(
            "Watching {} for {} (Ctrl-C to stop)",
            session.config().base_url,
            session.device_id()
        );
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            next = events.next() => {
                let Some(event) = next else { break };
                output::print_output(&render_event(&event, &global.output, color), global.quiet);

                if args.refresh && event == SessionEvent::ReachabilityChanged(true) {
                    // The list itself arrives as a NewFirmwareList event.
                    if let Err(e) = session.retrieve_available_versions().await {
                        warn!(error = %e, "firmware list refresh failed");
                    }
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn render_event(event: &SessionEvent, format: &OutputFormat, color: bool) -> String {
    let now = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let value = match event {
                SessionEvent::ReachabilityChanged(reachable) => json!({
                    "time": now,
                    "event": "reachability_changed",
                    "reachable": reachable,
                }),
                SessionEvent::NewFirmwareList(list) => json!({
                    "time": now,
                    "event": "new_firmware_list",
                    "versions": list,
                }),
            };
            // One object per line so the stream stays line-delimited.
            value.to_string()
        }
        OutputFormat::Table | OutputFormat::Plain => match event {
            SessionEvent::ReachabilityChanged(reachable) => format!(
                "{now} {}",
                output::reachability_label(ReachabilityState::from(*reachable), color)
            ),
            SessionEvent::NewFirmwareList(list) => {
                let versions: Vec<&str> = list.iter().map(|e| e.version.as_str()).collect();
                format!(
                    "{now} firmware list: {} version(s) [{}]",
                    list.len(),
                    versions.join(", ")
                )
            }
        },
    }
}
