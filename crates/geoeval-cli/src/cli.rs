//! CLI command definitions and argument parsing.

use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// geoeval - Build and score geolocation evaluation datasets.
#[derive(Debug, Parser)]
#[command(name = "geoeval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect up to N rounds per key from a game-record CSV
    Collect(CollectArgs),

    /// Show the header and first records of a CSV file
    Preview(PreviewArgs),

    /// Predict coordinates for a directory of location descriptions
    Predict(PredictArgs),

    /// Name an address for each description, then geocode it
    Locate(PredictArgs),

    /// Resolve an address, a Street View panorama or a directory of panoramas
    Geocode(GeocodeArgs),

    /// Score evaluation texts against ground truth on the rubric
    Judge(JudgeArgs),

    /// Share of predictions within distance thresholds of the ground truth
    Distance(DistanceArgs),

    /// Accuracy, recall and F1 for location, country and continent
    Classify(ClassifyArgs),

    /// Mean embedding similarity between ground-truth and predicted texts
    Similarity(SimilarityArgs),

    /// Extract location triples from a CSV of model descriptions
    Describe(DescribeArgs),

    /// Average the rubric scores in a directory
    Means(DirArgs),

    /// Count the .txt files in a directory
    Count(DirArgs),
}

/// Collector preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// nation, panoID
    Panoids,
    /// nation, panoID, lat, lng
    Coords,
}

/// Arguments for the collect command.
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Extractor configuration (TOML)
    #[arg(long, conflicts_with_all = ["input", "output", "keys", "quota", "preset"])]
    pub config_file: Option<PathBuf>,

    /// Game-record CSV to scan
    #[arg(short, long, required_unless_present = "config_file")]
    pub input: Option<PathBuf>,

    /// CSV file to write
    #[arg(short, long, required_unless_present = "config_file")]
    pub output: Option<PathBuf>,

    /// Key to collect (repeatable)
    #[arg(short, long = "key", required_unless_present = "config_file")]
    pub keys: Vec<String>,

    /// Rows kept per key
    #[arg(short, long)]
    pub quota: Option<usize>,

    /// Output columns
    #[arg(long, value_enum, default_value = "coords")]
    pub preset: Preset,
}

/// Arguments for the preview command.
#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// CSV file
    pub path: PathBuf,

    /// Number of records to show
    #[arg(short, long, default_value_t = geoeval_extractor::DEFAULT_PREVIEW_ROWS)]
    pub rows: usize,
}

/// Arguments for the predict and locate commands.
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Directory of <id>.txt descriptions
    #[arg(long)]
    pub input_dir: PathBuf,

    /// Directory receiving <id>.txt coordinates
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Arguments for the geocode command.
#[derive(Debug, Args)]
pub struct GeocodeArgs {
    /// Free-text address
    #[arg(
        required_unless_present_any = ["pano", "pano_dir"],
        conflicts_with_all = ["pano", "pano_dir"]
    )]
    pub address: Option<String>,

    /// Street View panorama id
    #[arg(long, conflicts_with = "pano_dir")]
    pub pano: Option<String>,

    /// Directory whose <panoID>.txt file names are looked up
    #[arg(long, requires = "output")]
    pub pano_dir: Option<PathBuf>,

    /// CSV file receiving panoID, lat, lng rows
    #[arg(short, long, requires = "pano_dir")]
    pub output: Option<PathBuf>,

    /// Pause between panorama lookups in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,
}

/// Arguments for the judge command.
#[derive(Debug, Args)]
pub struct JudgeArgs {
    /// Directory of ground-truth texts
    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    /// Directory of texts to score
    #[arg(long)]
    pub eval_dir: PathBuf,

    /// Directory receiving score lines
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Arguments for the distance command.
#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Directory of ground-truth coordinates
    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    /// Directory of predicted coordinates
    #[arg(long)]
    pub eval_dir: PathBuf,

    /// Threshold in km (repeatable; defaults to 1, 25 and 750)
    #[arg(short, long = "threshold")]
    pub thresholds: Vec<f64>,
}

/// Arguments for the classify command.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Directory of ground-truth location triples
    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    /// Directory of predicted location triples
    #[arg(long)]
    pub eval_dir: PathBuf,
}

/// Arguments for the similarity command.
#[derive(Debug, Args)]
pub struct SimilarityArgs {
    /// Directory of ground-truth descriptions
    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    /// Directory of predicted descriptions
    #[arg(long)]
    pub eval_dir: PathBuf,
}

/// Arguments for the describe command.
#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// CSV with panoID and description columns
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving <panoID>.txt triples
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// A single directory argument.
#[derive(Debug, Args)]
pub struct DirArgs {
    /// Directory to read
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("geoeval").chain(args.iter().copied()))
    }

    #[test]
    fn test_collect_flags() {
        let cli = parse(&[
            "collect", "-i", "in.csv", "-o", "out.csv", "--key", "Canada", "--key", "Japan", "--quota", "5",
        ])
        .unwrap();
        match cli.command {
            Command::Collect(args) => {
                assert_eq!(args.keys, vec!["Canada", "Japan"]);
                assert_eq!(args.quota, Some(5));
                assert_eq!(args.preset, Preset::Coords);
                assert!(args.config_file.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_collect_config_file_excludes_flags() {
        assert!(parse(&["collect", "--config-file", "c.toml"]).is_ok());
        assert!(parse(&["collect", "--config-file", "c.toml", "-i", "in.csv"]).is_err());
        assert!(parse(&["collect", "-i", "in.csv", "-o", "out.csv"]).is_err());
    }

    #[test]
    fn test_geocode_requires_one_target() {
        assert!(parse(&["geocode"]).is_err());
        assert!(parse(&["geocode", "Paris", "--pano", "abc"]).is_err());

        let cli = parse(&["geocode", "--pano", "abc"]).unwrap();
        match cli.command {
            Command::Geocode(args) => assert_eq!(args.pano.as_deref(), Some("abc")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_geocode_pano_dir_needs_output() {
        assert!(parse(&["geocode", "--pano-dir", "gt"]).is_err());
        assert!(parse(&["geocode", "--output", "out.csv"]).is_err());
        assert!(parse(&["geocode", "Paris", "--pano-dir", "gt", "-o", "out.csv"]).is_err());

        let cli = parse(&["geocode", "--pano-dir", "gt", "-o", "out.csv", "--delay-ms", "0"]).unwrap();
        match cli.command {
            Command::Geocode(args) => {
                assert_eq!(args.pano_dir, Some(PathBuf::from("gt")));
                assert_eq!(args.output, Some(PathBuf::from("out.csv")));
                assert_eq!(args.delay_ms, 0);
                assert!(args.address.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_locate_dirs() {
        let cli = parse(&["locate", "--input-dir", "desc", "--output-dir", "coords"]).unwrap();
        match cli.command {
            Command::Locate(args) => {
                assert_eq!(args.input_dir, PathBuf::from("desc"));
                assert_eq!(args.output_dir, PathBuf::from("coords"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(parse(&["locate", "--input-dir", "desc"]).is_err());
    }

    #[test]
    fn test_similarity_dirs() {
        let cli = parse(&["similarity", "--ground-truth-dir", "gt", "--eval-dir", "pred"]).unwrap();
        assert!(matches!(cli.command, Command::Similarity(_)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["count", "data", "--format", "json", "--no-color", "-v"]).unwrap();
        assert_eq!(cli.format, Some(CliFormat::Json));
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_distance_thresholds() {
        let cli = parse(&[
            "distance", "--ground-truth-dir", "gt", "--eval-dir", "pred", "-t", "10", "-t", "100",
        ])
        .unwrap();
        match cli.command {
            Command::Distance(args) => assert_eq!(args.thresholds, vec![10.0, 100.0]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_preview_default_rows() {
        let cli = parse(&["preview", "data.csv"]).unwrap();
        match cli.command {
            Command::Preview(args) => assert_eq!(args.rows, 5),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
