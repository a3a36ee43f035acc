use crate::report::ReportFormat;
use crate::segment::{ExceededRule, SegmentOptions, TrailingPulse};
use crate::table::TableOptions;
use crate::util::{channel_range_parser, delimiter_parser, format_amps};
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use knuffel::Decode;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "Logger.csv";
pub const DEFAULT_OUTPUT: &str = "Report.txt";
const CONFIG_FILE: &str = "config.kdl";

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorlogConfig {
    #[knuffel(child)]
    pub thresholds: Option<ThresholdsConfig>,
    #[knuffel(child)]
    pub table: Option<TableConfig>,
    #[knuffel(child)]
    pub report: Option<ReportConfig>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[knuffel(property)]
    pub idle: Option<f64>,
    #[knuffel(property)]
    pub max: Option<f64>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[knuffel(property)]
    pub rows: Option<usize>,
    #[knuffel(property)]
    pub columns: Option<usize>,
    #[knuffel(property)]
    pub delimiter: Option<String>,
    #[knuffel(property)]
    pub header: Option<bool>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[knuffel(property)]
    pub trailing: Option<String>,
    #[knuffel(property)]
    pub exceeded: Option<String>,
    #[knuffel(property)]
    pub format: Option<String>,
    #[knuffel(property)]
    pub channels: Option<String>,
}

impl MotorlogConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config = knuffel::parse(CONFIG_FILE, content)?;
        Ok(config)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "motorlog", "motorlog")
        .context("Could not determine project directories")?;
    Ok(proj_dirs.config_dir().join(CONFIG_FILE))
}

/// Loads `explicit` if given; otherwise the per-user config file, when present.
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<MotorlogConfig>> {
    if let Some(path) = explicit {
        info!("Loading config from {}", path.display());
        return MotorlogConfig::load(path).map(Some);
    }

    let path = match default_config_path() {
        Ok(path) => path,
        Err(e) => {
            debug!("No default config location: {}", e);
            return Ok(None);
        }
    };
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(None);
    }
    info!("Loading config from {}", path.display());
    MotorlogConfig::load(&path).map(Some)
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub idle: Option<f64>,
    pub max: Option<f64>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub delimiter: Option<char>,
    pub header: Option<bool>,
    pub channels: Option<RangeInclusive<usize>>,
    pub trailing: Option<TrailingPulse>,
    pub exceeded: Option<ExceededRule>,
    pub format: Option<ReportFormat>,
}

/// Everything one run needs, after defaults, config file and command line
/// have been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub table: TableOptions,
    pub segment: SegmentOptions,
    /// `None` means every channel in the table.
    pub channels: Option<RangeInclusive<usize>>,
    pub format: ReportFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            table: TableOptions::default(),
            segment: SegmentOptions::default(),
            channels: None,
            format: ReportFormat::default(),
        }
    }
}

impl Settings {
    pub fn resolve(overrides: &Overrides, file: Option<&MotorlogConfig>) -> Result<Self> {
        let mut settings = Settings::default();
        if let Some(file) = file {
            settings.apply_file(file)?;
        }
        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_file(&mut self, file: &MotorlogConfig) -> Result<()> {
        if let Some(thresholds) = &file.thresholds {
            if let Some(idle) = thresholds.idle {
                self.segment.idle_threshold = idle;
            }
            if let Some(max) = thresholds.max {
                self.segment.max_threshold = max;
            }
        }

        if let Some(table) = &file.table {
            if table.rows.is_some() {
                self.table.rows = table.rows;
            }
            if table.columns.is_some() {
                self.table.columns = table.columns;
            }
            if let Some(delimiter) = &table.delimiter {
                self.table.delimiter = delimiter_parser(delimiter).map_err(|e| anyhow!(e))?;
            }
            if let Some(header) = table.header {
                self.table.header = header;
            }
        }

        if let Some(report) = &file.report {
            if let Some(trailing) = &report.trailing {
                self.segment.trailing = trailing.parse()?;
            }
            if let Some(exceeded) = &report.exceeded {
                self.segment.exceeded = exceeded.parse()?;
            }
            if let Some(format) = &report.format {
                self.format = format.parse()?;
            }
            if let Some(channels) = &report.channels {
                self.channels = Some(channel_range_parser(channels).map_err(|e| anyhow!(e))?);
            }
        }

        Ok(())
    }

    fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(input) = &o.input {
            self.input = input.clone();
        }
        if let Some(output) = &o.output {
            self.output = output.clone();
        }
        if let Some(idle) = o.idle {
            self.segment.idle_threshold = idle;
        }
        if let Some(max) = o.max {
            self.segment.max_threshold = max;
        }
        if o.rows.is_some() {
            self.table.rows = o.rows;
        }
        if o.columns.is_some() {
            self.table.columns = o.columns;
        }
        if let Some(delimiter) = o.delimiter {
            self.table.delimiter = delimiter;
        }
        if let Some(header) = o.header {
            self.table.header = header;
        }
        if o.channels.is_some() {
            self.channels = o.channels.clone();
        }
        if let Some(trailing) = o.trailing {
            self.segment.trailing = trailing;
        }
        if let Some(exceeded) = o.exceeded {
            self.segment.exceeded = exceeded;
        }
        if let Some(format) = o.format {
            self.format = format;
        }
    }

    fn validate(&self) -> Result<()> {
        let (idle, max) = (self.segment.idle_threshold, self.segment.max_threshold);
        if !idle.is_finite() || !max.is_finite() {
            return Err(anyhow!("Thresholds must be finite numbers"));
        }
        if max < idle {
            return Err(anyhow!(
                "Max threshold {}A is below idle threshold {}A",
                max,
                idle
            ));
        }
        if self.table.columns.is_some_and(|c| c < 2) {
            return Err(anyhow!("A table needs at least 2 columns (time and one channel)"));
        }
        Ok(())
    }

    /// The thresholds and table/report options in config-file form.
    pub fn to_kdl(&self) -> String {
        let mut table = format!(
            "table delimiter={:?} header={}",
            delimiter_name(self.table.delimiter),
            self.table.header
        );
        if let Some(rows) = self.table.rows {
            table.push_str(&format!(" rows={}", rows));
        }
        if let Some(columns) = self.table.columns {
            table.push_str(&format!(" columns={}", columns));
        }

        let mut report = format!(
            "report trailing=\"{}\" exceeded=\"{}\" format=\"{}\"",
            self.segment.trailing, self.segment.exceeded, self.format
        );
        if let Some(channels) = &self.channels {
            report.push_str(&format!(" channels=\"{}-{}\"", channels.start(), channels.end()));
        }

        format!(
            "thresholds idle={} max={}\n{}\n{}\n",
            format_amps(self.segment.idle_threshold),
            format_amps(self.segment.max_threshold),
            table,
            report
        )
    }
}

fn delimiter_name(delimiter: char) -> String {
    match delimiter {
        '\t' => "tab".to_string(),
        c => c.to_string(),
    }
}
