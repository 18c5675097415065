#![warn(clippy::pedantic, rust_2018_idioms)]

mod collect;
mod convert;
mod demo;
mod filter;
mod mapping;
mod read_dir;
mod split;
mod summary;
mod time;
mod util;
mod weapon;
mod xes;

use crate::convert::{Converter, Options};
use crate::demo::{load_rounds, Team};
use crate::filter::Filter;
use crate::mapping::Style;
use crate::summary::Summary;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Converts round-by-round demo exports into XES event logs.
#[derive(Parser)]
#[command(name = "round-xes", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one round export into an XES log
    Convert {
        input: PathBuf,
        /// Output path; `.gz` compresses. Defaults to the input with an `.xes` extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        conversion: ConversionArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write one log per win condition into a directory
    Split {
        input: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        conversion: ConversionArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Merge every round export below a directory into one log
    Collect {
        dir: PathBuf,
        /// Defaults to `collected.xes` inside the directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        conversion: ConversionArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print trace, event and activity counts of the converted log
    Summary {
        input: PathBuf,
        #[command(flatten)]
        conversion: ConversionArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct ConversionArgs {
    #[arg(long, value_enum, env = "ROUND_XES_STYLE", default_value = "round")]
    style: Style,
    /// Side taken by the one-side and social styles
    #[arg(long, value_enum, env = "ROUND_XES_TEAM", default_value = "CT")]
    team: Team,
    /// Override the style's timestamp handling
    #[arg(long, value_enum)]
    timestamps: Option<Timestamps>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Timestamps {
    /// As recorded in the demo
    Absolute,
    /// Relative to the round start, placed on the Unix epoch
    Rebased,
}

impl ConversionArgs {
    fn options(&self) -> Options {
        let mut options = Options::new(self.style, self.team);
        if let Some(timestamps) = self.timestamps {
            options.rebase = matches!(timestamps, Timestamps::Rebased);
        }
        options
    }
}

#[derive(Args)]
struct FilterArgs {
    /// Drop events whose activity contains this text (repeatable)
    #[arg(long = "drop", value_name = "TEXT")]
    drop_activities: Vec<String>,
    /// Keep only events performed by this team
    #[arg(long = "only", value_enum, value_name = "TEAM")]
    only_team: Option<Team>,
    /// Start every trace at its first event with this activity
    #[arg(long, value_name = "ACTIVITY")]
    since: Option<String>,
    /// Replace player roles with their team tag
    #[arg(long)]
    role_as_team: bool,
}

impl From<FilterArgs> for Filter {
    fn from(args: FilterArgs) -> Filter {
        Filter {
            drop_activities: args.drop_activities,
            team: args.only_team,
            since: args.since,
            role_as_team: args.role_as_team,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match Cli::parse().command {
        Command::Convert {
            input,
            output,
            conversion,
            filter,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            let rounds = load_rounds(&input)?;
            let mut log = Converter::new(conversion.options()).log(&rounds);
            Filter::from(filter).apply(&mut log);
            xes::write_log(&output, &log)?;
            info!(path = %output.display(), traces = log.traces.len(), events = log.event_count(), "wrote log");
        }
        Command::Split {
            input,
            out_dir,
            conversion,
            filter,
        } => {
            let rounds = load_rounds(&input)?;
            let converter = Converter::new(conversion.options());
            let mut logs = split::split(converter.convert(&rounds), &converter.log_attributes());
            let filter = Filter::from(filter);
            for log in logs.values_mut() {
                filter.apply(log);
            }
            split::write_split(&out_dir, &logs)?;
        }
        Command::Collect {
            dir,
            output,
            conversion,
            filter,
        } => {
            let output = output.unwrap_or_else(|| dir.join("collected.xes"));
            let log = collect::collect(&dir, conversion.options(), &Filter::from(filter))?;
            xes::write_log(&output, &log)?;
            info!(path = %output.display(), traces = log.traces.len(), events = log.event_count(), "wrote log");
        }
        Command::Summary {
            input,
            conversion,
            filter,
        } => {
            let rounds = load_rounds(&input)?;
            let mut log = Converter::new(conversion.options()).log(&rounds);
            Filter::from(filter).apply(&mut log);
            print!("{}", Summary::of(&log));
        }
    }
    Ok(())
}

/// `match.json` and `match.json.gz` both become `match.xes`.
fn default_output(input: &Path) -> PathBuf {
    let mut output = input.to_path_buf();
    if demo::is_gzip(&output) {
        output.set_extension("");
    }
    output.set_extension("xes");
    output
}

#[cfg(test)]
mod tests {
    use super::{default_output, Cli, Command};
    use crate::demo::Team;
    use crate::mapping::Style;
    use clap::Parser;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(Path::new("navi.json")), PathBuf::from("navi.xes"));
        assert_eq!(
            default_output(Path::new("data/navi.json.gz")),
            Path::new("data").join("navi.xes")
        );
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(&[
            "round-xes",
            "convert",
            "navi.json",
            "--style",
            "one-side",
            "--team",
            "T",
            "--timestamps",
            "absolute",
            "--drop",
            "Inventory",
            "--drop",
            "Throw-",
            "--role-as-team",
        ])
        .unwrap();
        match cli.command {
            Command::Convert {
                input,
                output,
                conversion,
                filter,
            } => {
                assert_eq!(input, PathBuf::from("navi.json"));
                assert!(output.is_none());
                let options = conversion.options();
                assert_eq!(options.style, Style::OneSide);
                assert_eq!(options.team, Team::T);
                assert!(!options.rebase);
                assert_eq!(filter.drop_activities, vec!["Inventory", "Throw-"]);
                assert!(filter.role_as_team);
            }
            _ => panic!("expected convert"),
        }
    }
}
