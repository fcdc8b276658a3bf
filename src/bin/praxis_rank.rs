use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use praxis_rank::config::Settings;
use praxis_rank::corpus::Corpus;
use praxis_rank::lexicon::{Lexicon, LexiconPaths};
use praxis_rank::llm::{LlmClient, OpenAiClient};
use praxis_rank::pipeline::{self, PipelineContext, RankRequest};

fn output_header() -> &'static str {
    "praxis-rank\npraxis-rank is a BM25 + LLM-assisted practitioner ranking pipeline.\n"
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn build_context() -> Result<PipelineContext, String> {
    let settings = Settings::from_env().map_err(|err| err.to_string())?;

    let corpus_path = env_path("CORPUS_PATH", "corpus.json");
    let corpus = Corpus::load_from_path(&corpus_path).map_err(|err| err.to_string())?;

    let subspecialties = env_path("SUBSPECIALTIES_PATH", "subspecialties-from-data.json");
    let procedures = env_path("PROCEDURES_PATH", "procedures-from-data.json");
    let conditions = env_path("CONDITIONS_PATH", "conditions-from-data.json");
    let taxonomy = env_path("TAXONOMY_PATH", "medical_taxonomy.json");
    let lexicon = Lexicon::load(LexiconPaths {
        subspecialties: Path::new(&subspecialties),
        procedures: Path::new(&procedures),
        conditions: Path::new(&conditions),
        taxonomy: Path::new(&taxonomy),
    })
    .map_err(|err| err.to_string())?;

    let llm_client: Arc<dyn LlmClient> = match settings.api_key {
        Some(api_key) => Arc::new(OpenAiClient::new(api_key)),
        None => Arc::new(NoLlmClient),
    };

    Ok(PipelineContext {
        corpus: Arc::new(corpus),
        lexicon: Arc::new(lexicon),
        llm_client,
        default_config: Default::default(),
        default_model: std::env::var("PRAXIS_RANK_MODEL").unwrap_or_else(|_| "gpt-5".to_string()),
        session_cache: Some(Arc::new(RwLock::new(HashMap::new()))),
    })
}

/// Stands in for a real client when no API key is configured, so a v2
/// run with no fit evaluation still works end to end (spec.md §6.4
/// "required only for C, E, K").
struct NoLlmClient;

impl LlmClient for NoLlmClient {
    fn complete(&self, _request: &praxis_rank::llm::ChatRequest) -> Result<String, praxis_rank::llm::LlmError> {
        Err(praxis_rank::llm::LlmError::EmptyCompletion)
    }
}

fn read_request(args: &[String]) -> Result<RankRequest, String> {
    let raw = match args.first() {
        Some(path) => std::fs::read_to_string(path).map_err(|err| err.to_string())?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|err| err.to_string())?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|err| format!("invalid rank request: {err}"))
}

fn run() -> Result<(), String> {
    print!("{}", output_header());
    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = read_request(&args)?;
    let ctx = build_context()?;
    let response = pipeline::rank(request, &ctx).map_err(|err| err.to_string())?;
    let rendered = serde_json::to_string_pretty(&response).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
