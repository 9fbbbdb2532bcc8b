use clap::Parser;
use std::path::PathBuf;

use xss_hunter::config::HunterConfig;

/// Mine archived URLs for a domain and test their parameters for reflected input.
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Domain name to fetch related URLs for
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// File containing a list of domain names, one per line
    #[arg(short = 'l', long, conflicts_with = "domain")]
    pub list: Option<PathBuf>,

    /// Stream cleaned URLs on the terminal
    #[arg(short = 's', long, default_value_t = false)]
    pub stream: bool,

    /// Proxy address for web requests (e.g. http://127.0.0.1:8080)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Placeholder for parameter values, also the reflection marker [default: xss<>]
    #[arg(short = 'p', long)]
    pub placeholder: Option<String>,

    /// Directory to save vulnerable URLs [default: xss]
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Number of concurrent scan workers [default: 10]
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Request timeout in seconds [default: 20]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// YAML config file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print all results, not just vulnerable ones
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    /// Overlay explicitly given flags on top of `cfg`.
    pub fn apply_to(&self, cfg: &mut HunterConfig) {
        if let Some(p) = &self.proxy {
            cfg.proxy = Some(p.clone());
        }
        if let Some(p) = &self.placeholder {
            cfg.placeholder = p.clone();
        }
        if let Some(o) = &self.output {
            cfg.output = o.clone();
        }
        if let Some(t) = self.threads {
            cfg.threads = t;
        }
        if let Some(t) = self.timeout {
            cfg.timeout_secs = t;
        }
    }
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
