use anyhow::Context;
use console::style;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use xss_hunter::config::HunterConfig;
use xss_hunter::errors::HunterError;
use xss_hunter::filter::Normalizer;
use xss_hunter::gather::ArchiveFetcher;
use xss_hunter::output::{StatusPrinter, VulnerableSet};
use xss_hunter::scan::{ScanPool, ScanSettings, ScanSummary};

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep reqwest/hyper at INFO so --debug stays readable.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!("xss_hunter={crate},reqwest=info,hyper=info,h2=info", crate = crate_level);
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let started = Instant::now();
    let printer = StatusPrinter::new(cli.verbose);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(watch_interrupts(tokio::signal::ctrl_c, token, || std::process::exit(1)));

    run_batch(&cli, printer, &cancel).await?;

    printer.info(&format!("\nTime elapsed: {:.2} seconds", started.elapsed().as_secs_f64()));
    Ok(())
}

/// First interrupt cancels `token` so in-flight probes can finish; a second one calls `force_exit`.
async fn watch_interrupts<S, F>(mut next_signal: S, token: CancellationToken, force_exit: impl FnOnce())
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return;
    }
    tracing::warn!("interrupt received, stopping new probes");
    token.cancel();
    if next_signal().await.is_ok() {
        StatusPrinter::new(true).error("\nScan interrupted by user");
        force_exit();
    }
}

/// Print a top-level failure the way the user expects to see it.
pub fn report_error(err: &anyhow::Error) {
    let printer = StatusPrinter::new(true);
    match err.downcast_ref::<HunterError>() {
        Some(HunterError::Interrupted) => printer.error("\nScan interrupted by user"),
        _ => printer.error(&format!("\nError: {:#}", err)),
    }
}

fn load_config(cli: &Cli) -> Result<HunterConfig, HunterError> {
    let mut cfg = match &cli.config {
        Some(path) => HunterConfig::from_file(path)?,
        None => HunterConfig::default(),
    };
    cli.apply_to(&mut cfg);
    let origin = match (&cli.placeholder, &cli.config) {
        (None, Some(path)) => path.clone(),
        _ => PathBuf::from("--placeholder"),
    };
    cfg.validate(&origin)?;
    Ok(cfg)
}

fn resolve_domains(cli: &Cli) -> Result<Vec<String>, HunterError> {
    let domains = if let Some(d) = &cli.domain {
        vec![d.trim().to_string()]
    } else if let Some(list) = &cli.list {
        xss_hunter::utils::read_domain_list(list)?
    } else {
        Vec::new()
    };
    if domains.iter().all(|d| d.is_empty()) {
        return Err(HunterError::NoTargets);
    }
    Ok(domains)
}

struct DomainScan<'a> {
    fetcher: ArchiveFetcher,
    normalizer: Normalizer,
    settings: ScanSettings,
    out_dir: PathBuf,
    stream: bool,
    printer: StatusPrinter,
    cancel: &'a CancellationToken,
}

async fn run_batch(cli: &Cli, printer: StatusPrinter, cancel: &CancellationToken) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let domains = resolve_domains(cli)?;

    let out_dir = PathBuf::from(&config.output);
    xss_hunter::utils::ensure_dir(&out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let client = xss_hunter::http_client::create_client(config.timeout(), config.proxy.as_deref())
        .map_err(HunterError::from)?;
    let job = DomainScan {
        fetcher: ArchiveFetcher::from_config(client, &config.archive),
        normalizer: Normalizer::new(&config.extensions, config.placeholder.clone()),
        settings: ScanSettings {
            workers: config.threads,
            marker: config.placeholder.clone(),
            timeout: config.timeout(),
            proxy: config.proxy.clone(),
            progress_interval: config.progress_interval(),
            draw_progress: true,
        },
        out_dir,
        stream: cli.stream,
        printer,
        cancel,
    };

    tracing::info!(domains = domains.len(), threads = config.threads, placeholder = %config.placeholder, "starting run");

    for domain in &domains {
        if cancel.is_cancelled() {
            return Err(HunterError::Interrupted.into());
        }
        match job.scan_domain(domain).await {
            Ok(summary) if summary.interrupted => return Err(HunterError::Interrupted.into()),
            Ok(_) => {}
            Err(HunterError::Interrupted) => return Err(HunterError::Interrupted.into()),
            Err(e) if !e.is_fatal() => {
                printer.error(&format!("{}: {}", domain, e));
            }
            Err(e) => return Err(e.into()),
        }
    }
    // a signal that lands while the last probes are in flight still ends the run as interrupted
    if cancel.is_cancelled() {
        return Err(HunterError::Interrupted.into());
    }
    Ok(())
}

impl DomainScan<'_> {
    async fn scan_domain(&self, domain: &str) -> Result<ScanSummary, HunterError> {
        let path = output_path(&self.out_dir, domain);
        let vulnerable = Arc::new(VulnerableSet::create_file(&path)?);

        self.printer.info(&format!("Fetching URLs for {}", style(domain).cyan()));
        let raw = tokio::select! {
            urls = self.fetcher.fetch(domain) => urls,
            _ = self.cancel.cancelled() => return Err(HunterError::Interrupted),
        };
        self.printer.info(&format!("Found {} URLs.", style(raw.len()).green()));

        let candidates = self.normalizer.normalize_all(&raw);
        self.printer
            .info(&format!("Cleaned URLs with parameters: {}", style(candidates.len()).green()));
        if self.stream {
            for url in &candidates {
                println!("{}", url);
            }
        }

        let pool = ScanPool::new(self.settings.clone(), vulnerable, self.printer, self.cancel.clone());
        let summary = pool.run(candidates).await?;
        if summary.total > 0 {
            if summary.interrupted {
                self.printer.error(&format!(
                    "Scanning interrupted. Processed {}/{} URLs.",
                    summary.processed, summary.total
                ));
            } else {
                self.printer
                    .success(&format!("Scanning complete. Processed {} URLs.", summary.processed));
            }
            self.printer.summary(&summary.vulnerable);
        }
        tracing::info!(
            domain,
            processed = summary.processed,
            errors = summary.errors,
            vulnerable = summary.vulnerable.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "domain finished"
        );
        Ok(summary)
    }
}

fn output_path(out_dir: &Path, domain: &str) -> PathBuf {
    out_dir.join(format!("{}.txt", domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn scripted_signals(results: Vec<bool>) -> impl FnMut() -> std::future::Ready<std::io::Result<()>> {
        let mut results = results.into_iter();
        move || {
            std::future::ready(match results.next() {
                Some(true) => Ok(()),
                _ => Err(std::io::Error::new(std::io::ErrorKind::Other, "listener closed")),
            })
        }
    }

    #[tokio::test]
    async fn first_interrupt_only_cancels() {
        let token = CancellationToken::new();
        let mut forced = false;
        watch_interrupts(scripted_signals(vec![true]), token.clone(), || forced = true).await;
        assert!(token.is_cancelled());
        assert!(!forced);
    }

    #[tokio::test]
    async fn second_interrupt_forces_exit() {
        let token = CancellationToken::new();
        let mut forced = false;
        watch_interrupts(scripted_signals(vec![true, true]), token.clone(), || forced = true).await;
        assert!(token.is_cancelled());
        assert!(forced);
    }

    #[tokio::test]
    async fn failed_listener_leaves_scan_running() {
        let token = CancellationToken::new();
        let mut forced = false;
        watch_interrupts(scripted_signals(vec![]), token.clone(), || forced = true).await;
        assert!(!token.is_cancelled());
        assert!(!forced);
    }

    #[test]
    fn empty_placeholder_flag_is_rejected() {
        let cli = Cli::parse_from(["xss_hunter", "-d", "example.com", "-p", ""]);
        assert!(matches!(load_config(&cli), Err(HunterError::Config { .. })));
    }

    #[test]
    fn output_file_is_named_after_domain() {
        assert_eq!(output_path(Path::new("xss"), "example.com"), PathBuf::from("xss/example.com.txt"));
    }

    #[test]
    fn missing_targets_is_fatal() {
        let cli = Cli::parse_from(["xss_hunter"]);
        assert!(matches!(resolve_domains(&cli), Err(HunterError::NoTargets)));
        let cli = Cli::parse_from(["xss_hunter", "-d", "  "]);
        assert!(matches!(resolve_domains(&cli), Err(HunterError::NoTargets)));
    }
}
