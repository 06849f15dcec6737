mod campaign;
mod reports;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use campaign::{CampaignConfig, CampaignOutcome, run_campaign};
use reports::{aggregate, render_aggregate, render_outcome};

#[derive(Debug, Parser)]
#[command(name = "slipstream-tester", version)]
#[command(about = "Batch campaign simulation and balance QA for the Slipstream season engine")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Seasons to simulate per campaign
    #[arg(long, default_value_t = 3)]
    seasons: u32,

    /// Rival teams in the generated grid
    #[arg(long, default_value_t = 7)]
    rivals: usize,

    /// Wire the example drifting sponsor-market source into each campaign
    #[arg(long)]
    drifting_market: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output (per-campaign rows on stderr as they finish)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seeds = parse_seeds(&args.seeds)?;
    if args.seasons == 0 {
        bail!("--seasons must be at least 1");
    }

    eprintln!(
        "{} {} campaigns x {} seasons",
        "slipstream-tester".bold(),
        seeds.len(),
        args.seasons
    );

    let start = Instant::now();
    let mut outcomes: Vec<CampaignOutcome> = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let outcome = run_campaign(CampaignConfig {
            seed,
            seasons: args.seasons,
            rivals: args.rivals,
            drifting_market: args.drifting_market,
        })
        .with_context(|| format!("campaign with seed {seed} failed"))?;
        if args.verbose {
            eprintln!("{}", render_outcome(&outcome));
        }
        outcomes.push(outcome);
    }
    let elapsed = start.elapsed();

    let summary = aggregate(&outcomes);
    let rendered = match args.report.as_str() {
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "outcomes": outcomes,
            "aggregate": summary,
        }))
        .context("encoding the JSON report")?,
        _ => {
            let mut text = String::new();
            for outcome in &outcomes {
                text.push_str(&render_outcome(outcome));
                text.push('\n');
            }
            text.push_str(&render_aggregate(&summary));
            text
        }
    };

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("creating report file {}", path.display()))?;
            file.write_all(rendered.as_bytes())
                .context("writing the report file")?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    eprintln!(
        "{} {} campaigns in {:.2}s",
        "done:".green().bold(),
        summary.campaigns,
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Parse the comma-separated seed list; blank entries are ignored.
fn parse_seeds(input: &str) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let seed: u64 = token
            .parse()
            .with_context(|| format!("invalid seed '{token}'"))?;
        seeds.push(seed);
    }
    if seeds.is_empty() {
        bail!("no seeds supplied");
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seeds_accepts_csv_with_blanks() {
        let seeds = parse_seeds("1, 2,, 42 ").unwrap();
        assert_eq!(seeds, vec![1, 2, 42]);
    }

    #[test]
    fn parse_seeds_rejects_garbage_and_empty() {
        assert!(parse_seeds("abc").is_err());
        assert!(parse_seeds(" , ,").is_err());
    }
}
