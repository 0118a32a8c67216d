mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use caduceus_core::{
    ClinicalQuery, EvidenceDocument, PatientContext, RetrievalConfig, ScoringConfig,
};
use caduceus_index::{HashEmbedder, MemoryIndex};
use caduceus_pubmed::{LiteratureSource, NullSource, PubMedClient};
use caduceus_rag::{Pipeline, ProgressSink, Stage};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caduceus", version, about = "Evidence-backed clinical question answering")]
struct Cli {
    /// Path of the vector index snapshot.
    #[arg(long, global = true, default_value = "caduceus-index.json")]
    index: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a clinical question and print the recommendation.
    Ask {
        /// The clinical question.
        query: String,
        /// Patient age in years.
        #[arg(long)]
        age: Option<u32>,
        /// Patient gender.
        #[arg(long)]
        gender: Option<String>,
        /// Existing condition; repeat for several.
        #[arg(long = "condition")]
        conditions: Vec<String>,
        /// Answer from the local index only, without contacting PubMed.
        #[arg(long)]
        offline: bool,
        /// Print the full response as JSON instead of the card.
        #[arg(long)]
        json: bool,
        /// Hard deadline in seconds.
        #[arg(long, default_value_t = 60)]
        timeout: u64,
        /// Contact email sent to NCBI with each request.
        #[arg(long, env = "PUBMED_EMAIL")]
        email: Option<String>,
        /// NCBI API key for higher rate limits.
        #[arg(long, env = "PUBMED_API_KEY")]
        api_key: Option<String>,
    },
    /// Show index statistics.
    Stats,
    /// Load evidence documents from a JSON array file into the index.
    Seed {
        /// File containing a JSON array of documents.
        file: PathBuf,
    },
}

/// Stage transitions printed to stderr so stdout stays clean for output.
struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn report(&self, stage: Stage) {
        eprintln!("[{:>3}%] {}", stage.percent(), stage.message());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("caduceus v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    let index = Arc::new(
        MemoryIndex::open(&cli.index)
            .await
            .with_context(|| format!("opening index {}", cli.index.display()))?,
    );

    match cli.command {
        Command::Ask {
            query,
            age,
            gender,
            conditions,
            offline,
            json,
            timeout,
            email,
            api_key,
        } => {
            let literature: Arc<dyn LiteratureSource> = if offline {
                Arc::new(NullSource)
            } else {
                Arc::new(PubMedClient::new().with_credentials(email, api_key))
            };
            let pipeline = Pipeline::new(
                Arc::new(HashEmbedder::default()),
                index,
                literature,
                RetrievalConfig::default(),
                ScoringConfig::default(),
            )
            .await?;

            let clinical_query = if age.is_some() || gender.is_some() || !conditions.is_empty() {
                ClinicalQuery::with_patient(
                    query,
                    PatientContext {
                        age,
                        gender,
                        existing_conditions: conditions,
                        ..Default::default()
                    },
                )
            } else {
                ClinicalQuery::new(query)
            };

            let response = pipeline
                .process_query_with_timeout(
                    &clinical_query,
                    &StderrProgress,
                    Duration::from_secs(timeout),
                )
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                display::print_response_card(&response);
            }
        }
        Command::Stats => {
            let pipeline = Pipeline::new(
                Arc::new(HashEmbedder::default()),
                index,
                Arc::new(NullSource),
                RetrievalConfig::default(),
                ScoringConfig::default(),
            )
            .await?;
            println!("index      {}", cli.index.display());
            println!("documents  {}", pipeline.document_count().await?);
        }
        Command::Seed { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let documents: Vec<EvidenceDocument> =
                serde_json::from_slice(&bytes).context("parsing document array")?;
            let total = documents.len();

            let pipeline = Pipeline::new(
                Arc::new(HashEmbedder::default()),
                index,
                Arc::new(NullSource),
                RetrievalConfig::default(),
                ScoringConfig::default(),
            )
            .await?;
            let indexed = pipeline.seed(documents).await;
            println!("indexed {indexed} of {total} documents");
        }
    }

    Ok(())
}
