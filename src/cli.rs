use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::pipeline::Options;

#[derive(Parser, Debug)]
#[command(name = "zipbench")]
#[command(version)]
#[command(about = "Compress a directory to ZIP and benchmark sequential vs parallel work", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipbench compress ./photos            write photos.zip next to the folder\n  \
  zipbench decompress ./photos.zip      extract into ./photos\n  \
  zipbench --workers 4 -v compress data limit the pool, log progress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory receiving the CSV result sheets
    #[arg(long, global = true, value_name = "DIR", env = "ZIPBENCH_METRICS_DIR", default_value = ".")]
    pub metrics_dir: PathBuf,

    /// Do not write result sheets
    #[arg(long, global = true)]
    pub no_metrics: bool,

    /// Worker threads for the parallel strategy (0 = all cores)
    #[arg(long, global = true, value_name = "N", env = "ZIPBENCH_WORKERS", default_value_t = 0)]
    pub workers: usize,

    /// DEFLATE compression level
    #[arg(long, global = true, value_name = "0-9", env = "ZIPBENCH_LEVEL", default_value_t = 6,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,

    /// More log output (-vv for per-file detail)
    #[arg(short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress every top-level file of DIRECTORY into DIRECTORY.zip
    Compress {
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,
    },
    /// Extract ARCHIVE into a folder named after it
    Decompress {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            workers: self.workers,
            level: self.level,
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compress_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from(["zipbench", "compress", "data", "--workers", "3", "-vv"])
            .unwrap();
        match &cli.command {
            Command::Compress { directory } => assert_eq!(directory, &PathBuf::from("data")),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.options().workers, 3);
        assert_eq!(cli.log_filter(), "debug");
    }

    #[test]
    fn level_is_bounded() {
        assert!(Cli::try_parse_from(["zipbench", "--level", "12", "compress", "d"]).is_err());
        let cli = Cli::try_parse_from(["zipbench", "--level", "9", "decompress", "d.zip"]).unwrap();
        assert_eq!(cli.options().level, 9);
    }
}
