//! A binary that reports, for every family in a pedigree file, whether the
//! family can be drawn as a crossing-free genogram.
//!
//! ```shell
//! cargo run --release --bin=genogram-check --features=binaries pedigree.txt.gz
//! ```
//!
//! The pedigree file holds one person per line (`family id mother father`,
//! separated by tabs or spaces, with `0` for an unknown parent). Files ending
//! in `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flate2::read::GzDecoder;
use genogram::drawability::Analysis;
use genogram::drawability::Analyzer;
use genogram::drawability::Verdict;
use genogram::kinship::IndividualId;
use genogram::kinship::MalformedPolicy;
use genogram::record::UNKNOWN_PARENT;
use genogram::sandwich::solver::Config;
use genogram::sandwich::solver::DEFAULT_MAX_STEPS;
use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tracing::error;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// Checks whether the families of a pedigree file can be drawn as
/// crossing-free genograms.
#[derive(Parser)]
struct Args {
    /// The pedigree file (optionally gzipped).
    input: PathBuf,

    /// The number of search steps allowed per family. Zero means unlimited.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: u64,

    /// The number of seconds allowed per family.
    #[arg(long)]
    time_limit: Option<u64>,

    /// Whether to skip malformed person records instead of failing the
    /// family.
    #[arg(long, default_value_t = false)]
    skip_malformed: bool,

    /// Whether to print the generation of every individual.
    #[arg(long, default_value_t = false)]
    show_generations: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Opens the pedigree file, decompressing it if it is gzipped.
fn open(path: &Path) -> Result<genogram::Reader<Box<dyn BufRead>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let inner: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };

    Ok(genogram::Reader::new(inner))
}

/// Prints the generation of every individual of an analyzed family.
fn print_generations(family: &str, analysis: &Analysis) {
    let kinship = analysis.kinship();

    let mut builder = Builder::default();
    builder.push_record(["Family", "Individual", "Mother", "Father", "Generation"]);

    for id in kinship.individual_ids() {
        let individual = kinship.individual(id);

        let name = |parent: Option<IndividualId>| {
            parent.map_or(UNKNOWN_PARENT, |parent| kinship.individual(parent).name())
        };

        let parents = individual.parents();
        let mother = name(parents.and_then(|parents| parents.mother()));
        let father = name(parents.and_then(|parents| parents.father()));

        let generation = analysis
            .generations()
            .get(id)
            .map(|generation| generation.to_string())
            .unwrap_or(String::from("<None>"));

        builder.push_record([family, individual.name(), mother, father, &generation]);
    }

    let table = builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::left())
        .to_string();

    println!("{table}");
}

/// Analyzes every family in the pedigree file.
fn check(args: &Args) -> Result<bool> {
    let mut config = Config::builder().max_steps(match args.max_steps {
        0 => None,
        n => Some(n),
    });

    if let Some(seconds) = args.time_limit {
        config = config.time_limit(Some(Duration::from_secs(seconds)));
    }

    let policy = match args.skip_malformed {
        true => MalformedPolicy::Skip,
        false => MalformedPolicy::Reject,
    };

    let analyzer = Analyzer::default().policy(policy).config(config.build());

    let mut reader = open(&args.input)?;
    let mut all_ok = true;

    for result in reader.families() {
        let family = result.context("reading pedigree file")?;
        info!(
            "family {}: analyzing {} records",
            family.id(),
            family.records().len()
        );

        let records = family.records().iter().cloned().collect::<Vec<_>>();

        let analysis = match analyzer.analyze(&records) {
            Ok(analysis) => analysis,
            Err(err) => {
                error!("family {}: {err}", family.id());
                all_ok = false;
                continue;
            }
        };

        info!("family {}: {}", family.id(), analysis.statistics());

        if args.show_generations {
            print_generations(family.id(), &analysis);
        }

        match analysis.verdict() {
            Verdict::Aborted(_) => {
                all_ok = false;
                println!("{}\t{}", family.id(), analysis.verdict());
            }
            verdict => println!("{}\t{verdict}", family.id()),
        }
    }

    Ok(all_ok)
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    if !check(&args)? {
        std::process::exit(1);
    }

    Ok(())
}
