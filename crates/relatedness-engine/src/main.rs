use anyhow::{bail, Context};
use snomed_relatedness::matrix::{normalize_concept_ids, DistanceMatrix};
use snomed_relatedness::{EngineConfig, GraphVariant, OntologyService};
use snomed_relatedness::ingest::IngestionEngine;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  sctrel build <release-dir>
  sctrel relatedness <measure> <concept-a> <concept-b>
  sctrel distance <is-a|rel> <concept-a> <concept-b>
  sctrel matrix <concepts.txt> <out.csv> [is-a|rel|<measure>]";

fn load_config() -> anyhow::Result<EngineConfig> {
    let file = env::var("SCT_CONFIG").ok();
    EngineConfig::load(file.as_deref().map(Path::new))
        .with_context(|| format!("loading config {}", file.as_deref().unwrap_or("from environment")))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = load_config()?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["build", dir] => {
            let engine = IngestionEngine::new(Path::new(&config.storage_path));
            let build = engine.build_release(Path::new(dir))?;
            for report in &build.reports {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            for path in &build.artifacts {
                println!("wrote {}", path.display());
            }
            println!("release {} ready (export SCT_RELEASE={})", build.release, build.release);
        }
        ["relatedness", measure, a, b] => {
            let service = OntologyService::open(config)?;
            let value = service.relatedness_by_name(measure, a, b)?;
            println!("{}", value);
        }
        ["distance", variant, a, b] => {
            let variant: GraphVariant = variant.parse()?;
            let service = OntologyService::open(config)?;
            match service.shortest_path_length(variant, a, b)?.hops() {
                Some(hops) => println!("{}", hops),
                None => println!("unreachable (penalty {})", service.config().unreachable_penalty),
            }
        }
        ["matrix", concepts, out, rest @ ..] => {
            let raw = std::fs::read_to_string(concepts)
                .with_context(|| format!("reading concept list {}", concepts))?;
            let concepts = normalize_concept_ids(raw.lines().flat_map(|l| l.split(',')));
            if concepts.is_empty() {
                bail!("no valid concept ids in list");
            }

            let service = OntologyService::open(config)?;
            let matrix = match rest {
                [] => DistanceMatrix::build(&service, &concepts, GraphVariant::IsA),
                [kind] => match kind.parse::<GraphVariant>() {
                    Ok(variant) => DistanceMatrix::build(&service, &concepts, variant),
                    Err(_) => DistanceMatrix::build_relatedness(&service, kind.parse()?, &concepts),
                },
                _ => bail!(USAGE),
            };
            matrix.save_csv(Path::new(out))?;

            if let Some(summary) = matrix.summary() {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            println!(
                "{} concepts, {} substituted entries -> {}",
                matrix.len(),
                matrix.substituted_count(),
                out
            );
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
