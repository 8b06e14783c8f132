//! CLI argument parsing for tcpinfo-xval

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tcpinfo-xval")]
#[command(version)]
#[command(
    about = "Cross-validate netlink, sk_ops and iperf3 TCP measurements of one connection",
    long_about = None
)]
pub struct Cli {
    /// Line-delimited firefly records carrying netlink measurements
    #[arg(long = "firefly-path", value_name = "PATH", default_value = "fireflies.jsonl")]
    pub firefly_path: PathBuf,

    /// Line-delimited records carrying sk_ops measurements (defaults to --firefly-path)
    #[arg(long = "skops-path", value_name = "PATH")]
    pub skops_path: Option<PathBuf>,

    /// iperf3 JSON report
    #[arg(long = "iperf3-path", value_name = "PATH", default_value = "iperf3.json")]
    pub iperf3_path: PathBuf,

    /// Prefix of every output file; the variable name and extension are appended
    #[arg(long = "prefix", value_name = "PREFIX", default_value = "plots/def-")]
    pub prefix: String,

    /// Congestion algorithm appended to chart titles (e.g., bbr, cubic)
    #[arg(long = "cong-alg", value_name = "ALG")]
    pub cong_alg: Option<String>,

    /// TOML file overriding keys, name mappings and variables
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the plotted points of each variable as CSV
    #[arg(long = "csv")]
    pub csv: bool,

    /// Summary format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Probe capture path, falling back to the firefly file
    pub fn skops_path(&self) -> &PathBuf {
        self.skops_path.as_ref().unwrap_or(&self.firefly_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tcpinfo-xval"]);
        assert_eq!(cli.firefly_path, PathBuf::from("fireflies.jsonl"));
        assert_eq!(cli.iperf3_path, PathBuf::from("iperf3.json"));
        assert_eq!(cli.prefix, "plots/def-");
        assert!(cli.cong_alg.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.csv);
        assert!(!cli.debug);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_skops_path_defaults_to_firefly_path() {
        let cli = Cli::parse_from(["tcpinfo-xval", "--firefly-path", "run1/ff.jsonl"]);
        assert_eq!(cli.skops_path(), &PathBuf::from("run1/ff.jsonl"));
    }

    #[test]
    fn test_cli_skops_path_explicit() {
        let cli = Cli::parse_from([
            "tcpinfo-xval",
            "--firefly-path",
            "netlink.jsonl",
            "--skops-path",
            "skops.jsonl",
        ]);
        assert_eq!(cli.skops_path(), &PathBuf::from("skops.jsonl"));
    }

    #[test]
    fn test_cli_prefix_and_cong_alg() {
        let cli = Cli::parse_from(["tcpinfo-xval", "--prefix", "out/bbr-", "--cong-alg", "bbr"]);
        assert_eq!(cli.prefix, "out/bbr-");
        assert_eq!(cli.cong_alg.as_deref(), Some("bbr"));
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["tcpinfo-xval", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_csv_and_debug_flags() {
        let cli = Cli::parse_from(["tcpinfo-xval", "--csv", "--debug"]);
        assert!(cli.csv);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = Cli::try_parse_from(["tcpinfo-xval", "--format", "csv"]);
        assert!(result.is_err());
    }
}
