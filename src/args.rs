use crate::config::Overrides;
use crate::report::ReportFormat;
use crate::segment::{ExceededRule, TrailingPulse};
use crate::util::{channel_range_parser, delimiter_parser};
use clap::{Parser, Subcommand};
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Per-motor current pulse report from a logger table.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logger table to read [default: Logger.csv]
    #[arg(index = 1)]
    pub in_file: Option<PathBuf>,
    /// Where to write the report [default: Report.txt]
    #[arg(index = 2)]
    pub out_file: Option<PathBuf>,

    /// Config file (KDL) [default: config.kdl in the user config directory]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Current at or below which a motor is idle, in amps
    #[arg(long, global = true)]
    pub idle: Option<f64>,
    /// Current above which a pulse is flagged, in amps
    #[arg(long, global = true)]
    pub max: Option<f64>,

    /// Number of data rows to read
    #[arg(long, global = true)]
    pub rows: Option<usize>,
    /// Number of columns every row must have, time included
    #[arg(long, global = true)]
    pub columns: Option<usize>,
    #[arg(long, global = true, value_parser = delimiter_parser)]
    pub delimiter: Option<char>,
    /// Skip the first line of the table (`--header=false` to read it as data)
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub header: Option<bool>,

    /// Channels to report, e.g. `3` or `1-7` [default: all]
    #[arg(long, global = true, value_parser = channel_range_parser)]
    pub channels: Option<RangeInclusive<usize>>,
    /// What to do with a pulse still active at the end of the table: drop or close
    #[arg(long, global = true)]
    pub trailing: Option<TrailingPulse>,
    /// Which samples can flag a pulse: first-sample or any-sample
    #[arg(long, global = true)]
    pub exceeded: Option<ExceededRule>,
    /// Report format: text or json
    #[arg(long, global = true)]
    pub format: Option<ReportFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file to the user config directory
    Init {
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            input: self.in_file.clone(),
            output: self.out_file.clone(),
            idle: self.idle,
            max: self.max,
            rows: self.rows,
            columns: self.columns,
            delimiter: self.delimiter,
            header: self.header,
            channels: self.channels.clone(),
            trailing: self.trailing,
            exceeded: self.exceeded,
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_and_flags() {
        let cli = Cli::try_parse_from([
            "motorlog",
            "data.csv",
            "out.txt",
            "--idle",
            "0.5",
            "--channels",
            "2-3",
            "--trailing",
            "close",
            "--exceeded",
            "any-sample",
            "--format",
            "json",
            "--delimiter",
            ";",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        let o = cli.overrides();
        assert_eq!(o.input, Some(PathBuf::from("data.csv")));
        assert_eq!(o.output, Some(PathBuf::from("out.txt")));
        assert_eq!(o.idle, Some(0.5));
        assert_eq!(o.max, None);
        assert_eq!(o.channels, Some(2..=3));
        assert_eq!(o.trailing, Some(TrailingPulse::Close));
        assert_eq!(o.exceeded, Some(ExceededRule::AnySample));
        assert_eq!(o.format, Some(ReportFormat::Json));
        assert_eq!(o.delimiter, Some(';'));
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["motorlog"]).unwrap();
        let o = cli.overrides();
        assert!(o.input.is_none());
        assert_eq!(o.header, None);
    }

    #[test]
    fn test_header_flag() {
        let cli = Cli::try_parse_from(["motorlog", "--header", "data.csv"]).unwrap();
        assert_eq!(cli.header, Some(true));
        assert_eq!(cli.in_file, Some(PathBuf::from("data.csv")));

        let cli = Cli::try_parse_from(["motorlog", "--header=false"]).unwrap();
        assert_eq!(cli.overrides().header, Some(false));
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["motorlog", "config", "show", "--max", "9.5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
        assert_eq!(cli.max, Some(9.5));

        let cli = Cli::try_parse_from(["motorlog", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init { force: true }
            })
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Cli::try_parse_from(["motorlog", "--channels", "0"]).is_err());
        assert!(Cli::try_parse_from(["motorlog", "--trailing", "keep"]).is_err());
        assert!(Cli::try_parse_from(["motorlog", "--idle", "low"]).is_err());
    }
}
