use crate::segment::{Activity, ChannelReport};
use crate::util::format_amps;
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const TITLE: &str = "Data Report:\r\n\n";
const COLUMNS: &str = "start (sec), finish(sec), current(amps) \r\n";
const EXCEEDED: &str = "***Current Exceeded*** \r\n";
const NOT_USED: &str = "Not Used\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(anyhow::anyhow!("unknown report format '{}' (expected text or json)", other)),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        })
    }
}

pub fn render(reports: &[ChannelReport], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(reports)),
        ReportFormat::Json => render_json(reports),
    }
}

/// The plain-text motor report: one section per channel, tab-separated
/// `start, end, average` lines, a marker line before any pulse that went over
/// the maximum, and `Not Used` for a motor that never left idle.
pub fn render_text(reports: &[ChannelReport]) -> String {
    let mut out = String::from(TITLE);

    for report in reports {
        out.push_str(&format!("Motor: {}\n{}", report.channel, COLUMNS));
        match &report.activity {
            Activity::Pulses(pulses) => {
                for pulse in pulses {
                    if pulse.exceeded {
                        out.push_str(EXCEEDED);
                    }
                    out.push_str(&format!(
                        "\t{},\t\t{},\t\t{}\r\n",
                        pulse.start,
                        pulse.end,
                        format_amps(pulse.average)
                    ));
                }
            }
            Activity::NotUsed => out.push_str(NOT_USED),
        }
        out.push_str("\r\n");
    }

    out
}

pub fn render_json(reports: &[ChannelReport]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(reports).context("Failed to serialize report")?;
    json.push('\n');
    Ok(json)
}

pub fn write_report<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    info!("Saving report to {}", path.display());
    fs::write(path, contents)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
