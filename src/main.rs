use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use recon_scan_rs::config::{ConfigFile, Tool};
use recon_scan_rs::enumerate::{cidr, ports};
use recon_scan_rs::types::{Measurement, ProbeOutcome, ScanResults, Summary};
use recon_scan_rs::{recon, summary};

/// recon-scan-rs — bounded-concurrency async recon probes.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "recon-scan-rs",
    version,
    about = "Subnet sweep, port scan, dir bust and subdomain brute force on a bounded pool.",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Max concurrent probes (defaults depend on the tool).
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Per-probe timeout in milliseconds (defaults depend on the tool).
    #[arg(long = "timeout-ms", global = true)]
    timeout_ms: Option<u64>,

    /// JSON file with per-tool settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write results as pretty JSON to this path.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Print JSON to stdout instead of a table.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// TCP reachability sweep of a CIDR (port 80, then 443). Without a CIDR,
    /// sweeps the local /24 networks.
    Sweep { cidr: Option<String> },
    /// TCP connect scan, e.g. `ports 10.0.0.5 22,80,8000-8010`.
    Ports {
        host: String,
        spec: Option<String>,
        /// Read the port spec from a file instead (one port or range per line).
        #[arg(long = "ports-file", conflicts_with = "spec")]
        ports_file: Option<PathBuf>,
    },
    /// Probe web paths under a base URL; redirects are reported, not followed.
    Dirs {
        url: String,
        #[arg(long)]
        wordlist: Option<PathBuf>,
    },
    /// Resolve `<word>.<domain>` for each word.
    Subdomains {
        domain: String,
        #[arg(long)]
        wordlist: Option<PathBuf>,
    },
    /// TCP ping one host.
    Ping {
        host: String,
        #[arg(long, default_value_t = 80)]
        port: u16,
    },
    /// Resolve one hostname, optionally appending a domain to a bare label.
    Resolve { host: String, domain: Option<String> },
}

impl Command {
    fn tool(&self) -> Tool {
        match self {
            Command::Sweep { .. } => Tool::Sweep,
            Command::Ports { .. } => Tool::Ports,
            Command::Dirs { .. } => Tool::Dirs,
            Command::Subdomains { .. } => Tool::Subdomains,
            Command::Ping { .. } => Tool::Ping,
            Command::Resolve { .. } => Tool::Resolve,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file = match cli.config.as_deref() {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let cfg = file
        .resolve(cli.command.tool())
        .with_overrides(cli.concurrency, cli.timeout_ms);

    match &cli.command {
        Command::Sweep { cidr: Some(spec) } => {
            let results = recon::sweep(spec, &cfg).await?;
            report_run(&cli, &results)?;
        }
        Command::Sweep { cidr: None } => {
            let nets = cidr::detect_local_cidrs().context("failed to detect local networks")?;
            if nets.is_empty() {
                anyhow::bail!("no local IPv4 networks found; pass a CIDR");
            }
            let mut runs = Vec::with_capacity(nets.len());
            for net in nets {
                match recon::sweep(&net.to_string(), &cfg).await {
                    Ok(results) => runs.push(results),
                    Err(e) => warn!(network = %net, error = %e, "skipping network"),
                }
            }
            report_runs(&cli, &runs)?;
        }
        Command::Ports {
            host,
            spec,
            ports_file,
        } => {
            let results = match ports_file {
                Some(path) => {
                    let list = ports::load_port_spec(path)?;
                    recon::scan_port_list(host, list, &cfg).await?
                }
                None => recon::scan_ports(host, spec.as_deref(), &cfg).await?,
            };
            report_run(&cli, &results)?;
        }
        Command::Dirs { url, wordlist } => {
            let results = recon::bust_dirs(url, wordlist.as_deref(), &cfg).await?;
            report_run(&cli, &results)?;
        }
        Command::Subdomains { domain, wordlist } => {
            let results = recon::brute_subdomains(domain, wordlist.as_deref(), &cfg).await?;
            report_run(&cli, &results)?;
        }
        Command::Ping { host, port } => {
            let outcome = recon::ping(host, *port, &cfg).await?;
            report_single(&cli, &outcome)?;
        }
        Command::Resolve { host, domain } => {
            let outcome = recon::resolve(host, domain.as_deref(), &cfg).await?;
            report_single(&cli, &outcome)?;
        }
    }

    Ok(())
}

fn report_run(cli: &Cli, results: &ScanResults) -> Result<()> {
    report_runs(cli, std::slice::from_ref(results))
}

/// Reports one or more runs as a single payload: one JSON value on stdout and
/// one write to `--output`. Several runs become a JSON array.
fn report_runs(cli: &Cli, runs: &[ScanResults]) -> Result<()> {
    let summaries: Vec<Summary> = runs.iter().map(summary::summarize).collect();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&one_or_many(&summaries)?)?);
    } else {
        for s in &summaries {
            print_summary_table(s);
        }
    }
    if let Some(path) = cli.output.as_deref() {
        write_json(path, &one_or_many(runs)?)?;
    }
    Ok(())
}

/// A lone item serializes as itself, anything else as an array.
fn one_or_many<T: Serialize>(items: &[T]) -> Result<serde_json::Value> {
    let value = match items {
        [one] => serde_json::to_value(one)?,
        many => serde_json::to_value(many)?,
    };
    Ok(value)
}

fn report_single(cli: &Cli, outcome: &ProbeOutcome) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!(
            "{}  {}  {}",
            outcome.target,
            if outcome.positive { "up" } else { "down" },
            describe(outcome)
        );
    }
    if let Some(path) = cli.output.as_deref() {
        write_json(path, outcome)?;
    }
    Ok(())
}

fn print_summary_table(summary: &Summary) {
    let target_w = summary
        .positives
        .iter()
        .map(|e| e.target.len())
        .max()
        .unwrap_or(0)
        .max("target".len());

    println!(
        "\n{}: {} positive of {} probed{}",
        summary.subject,
        summary.positive,
        summary.total,
        summary
            .ops_per_sec
            .map(|r| format!(" ({r:.1}/s)"))
            .unwrap_or_default()
    );
    println!("{:<target_w$}  detail", "target", target_w = target_w);
    println!("{:-<target_w$}  ------", "", target_w = target_w);
    for e in &summary.positives {
        println!("{:<target_w$}  {}", e.target, describe(e), target_w = target_w);
    }
}

fn describe(outcome: &ProbeOutcome) -> String {
    match (&outcome.measurement, &outcome.error) {
        (Some(Measurement::Rtt { ms, peer }), _) => match peer {
            Some(p) => format!("{ms}ms via {p}"),
            None => format!("{ms}ms"),
        },
        (Some(Measurement::Http { status, size }), _) => match size {
            Some(n) => format!("{status} ({n} bytes)"),
            None => status.to_string(),
        },
        (Some(Measurement::Addresses { ips }), _) => ips
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        (None, Some(err)) => err.clone(),
        (None, None) => String::new(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(subject: &str) -> ScanResults {
        ScanResults {
            subject: subject.to_string(),
            ..ScanResults::default()
        }
    }

    #[test]
    fn single_run_is_written_as_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let cli = Cli::try_parse_from([
            "recon-scan-rs",
            "--output",
            path.to_str().unwrap(),
            "sweep",
            "10.0.0.0/30",
        ])
        .unwrap();

        report_runs(&cli, &[run("10.0.0.0/30")]).unwrap();
        let back: ScanResults =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.subject, "10.0.0.0/30");
    }

    #[test]
    fn several_runs_are_written_once_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let cli = Cli::try_parse_from([
            "recon-scan-rs",
            "--json",
            "--output",
            path.to_str().unwrap(),
            "sweep",
        ])
        .unwrap();

        let runs = [run("192.168.1.0/24"), run("10.0.0.0/24")];
        report_runs(&cli, &runs).unwrap();
        let back: Vec<ScanResults> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let subjects: Vec<&str> = back.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["192.168.1.0/24", "10.0.0.0/24"]);
    }

    #[test]
    fn summaries_of_several_runs_form_one_array() {
        let summaries = vec![
            summary::summarize(&run("a")),
            summary::summarize(&run("b")),
        ];
        let value = one_or_many(&summaries).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert!(one_or_many(&summaries[..1]).unwrap().is_object());
    }
}
