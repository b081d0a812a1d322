use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trialmatch_core::constants::{DEFAULT_CSV_OUTPUT, DEFAULT_JSON_OUTPUT};
use trialmatch_core::{
    exclusion_clauses, normalize_duration, output, split_criteria, MatchConfig, MatchConfigValues,
    Matcher, PatientProfile,
};
use trialmatch_llm::select::ENV_JUDGE;
use trialmatch_llm::{build_judge, ChatConfig, JudgeKind};
use trialmatch_registry::ClinicalTrialsClient;

#[derive(Parser)]
#[command(name = "trialmatch")]
#[command(about = "Clinical trial eligibility matcher CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every FHIR bundle in a directory against recruiting trials
    Match {
        /// Directory of patient bundle JSON files
        patients_dir: PathBuf,
        /// JSON output path
        #[arg(long, default_value = DEFAULT_JSON_OUTPUT)]
        json: PathBuf,
        /// CSV output path
        #[arg(long, default_value = DEFAULT_CSV_OUTPUT)]
        csv: PathBuf,
        /// Exclusion clause judge: keyword, none or llm
        #[arg(long)]
        judge: Option<JudgeKind>,
    },
    /// Print the profile extracted from one FHIR bundle
    Profile {
        /// Patient bundle JSON file
        bundle: PathBuf,
    },
    /// Normalise a registry age limit such as "18 Years"
    Age {
        duration: String,
    },
    /// Split an eligibility-criteria text file into its sections
    Split {
        /// Criteria text file
        criteria: PathBuf,
    },
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Reads every `*.json` bundle in `dir`, in file-name order. Bundles that cannot be read
/// or lack required patient attributes are skipped.
fn load_patients(dir: &Path) -> std::io::Result<Vec<PatientProfile>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let today = today();
    let mut patients = Vec::new();
    for path in paths {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read bundle; skipped");
                continue;
            }
        };
        match PatientProfile::from_bundle_json(&text, today) {
            Ok(profile) => patients.push(profile),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unusable bundle; skipped");
            }
        }
    }
    Ok(patients)
}

async fn run_match(
    patients_dir: &Path,
    json: &Path,
    csv: &Path,
    judge: Option<JudgeKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Arc::new(MatchConfig::from_env_values(
        MatchConfigValues::from_lookup(env_var),
    )?);
    let kind = match judge {
        Some(kind) => kind,
        None => env_var(ENV_JUDGE)
            .map(|v| v.parse::<JudgeKind>())
            .transpose()?
            .unwrap_or_default(),
    };
    let judge = build_judge(kind, ChatConfig::from_lookup(env_var, cfg.request_timeout()))?;
    let registry = Arc::new(ClinicalTrialsClient::new(&cfg)?);
    let matcher = Matcher::new(registry, judge, cfg);

    let patients = load_patients(patients_dir)?;
    if patients.is_empty() {
        println!("No usable patient bundles found in {}", patients_dir.display());
        return Ok(());
    }

    let summaries = matcher.match_patients(&patients).await;
    output::write_json(json, &summaries)?;
    output::write_csv(csv, &summaries)?;

    for summary in &summaries {
        println!(
            "Patient {}: {} eligible trial(s)",
            summary.patient_id,
            summary.eligible_trials.len()
        );
    }
    println!("Wrote {} and {}", json.display(), csv.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trialmatch=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Match {
            patients_dir,
            json,
            csv,
            judge,
        }) => run_match(&patients_dir, &json, &csv, judge).await?,
        Some(Commands::Profile { bundle }) => {
            let text = std::fs::read_to_string(&bundle)?;
            match PatientProfile::from_bundle_json(&text, today()) {
                Ok(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                Err(e) => eprintln!("Error extracting profile: {}", e),
            }
        }
        Some(Commands::Age { duration }) => match normalize_duration(&duration) {
            Ok(years) => println!("{years}"),
            Err(e) => eprintln!("Error normalising duration: {}", e),
        },
        Some(Commands::Split { criteria }) => {
            let text = std::fs::read_to_string(&criteria)?;
            let sections = split_criteria(&text);
            println!("Inclusion:\n{}", sections.inclusion);
            match sections.exclusion {
                Some(exclusion) => {
                    println!("Exclusion:\n{exclusion}");
                    for (i, clause) in exclusion_clauses(exclusion).iter().enumerate() {
                        println!("{:>3}. {}", i + 1, clause);
                    }
                }
                None => println!("No exclusion section."),
            }
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
