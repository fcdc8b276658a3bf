pub mod merge;
pub mod prompts;
pub mod types;

pub use prompts::ClinicalIntentPromptVariant;
pub use types::{ClinicalIntentResponse, GeneralIntentResponse, InsightsResponse};

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::domain::SessionContext;
use crate::lexicon::Lexicon;
use crate::llm::{ChatRequest, LlmClient};

/// Per-request knobs for the three-leg extraction (spec.md §4.C).
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub specialty: String,
    pub model: String,
    pub clinical_variant: ClinicalIntentPromptVariant,
    pub per_call_timeout: Duration,
    pub max_tokens_general: u32,
    pub max_tokens_clinical: u32,
    pub max_tokens_insights: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            specialty: "General".to_string(),
            model: "gpt-5".to_string(),
            clinical_variant: ClinicalIntentPromptVariant::V1,
            per_call_timeout: Duration::from_secs(10),
            max_tokens_general: 400,
            max_tokens_clinical: 320,
            max_tokens_insights: 300,
        }
    }
}

/// One leg's tagged outcome, sent back over the shared completion
/// channel (mirrors the teacher's `queue_worker` tagged-completion
/// join pattern).
enum LegOutcome {
    General(Option<GeneralIntentResponse>),
    Clinical(Option<ClinicalIntentResponse>),
    Insights(Option<InsightsResponse>),
}

/// Fans out the three session-context legs concurrently via
/// `std::thread::spawn` + `std::sync::mpsc::channel`, then merges
/// whatever legs succeeded (falling back to each leg's documented
/// default otherwise) per spec.md §4.C "Concurrency contract": the
/// request succeeds if *any* leg succeeds.
pub fn extract(
    query: &str,
    conversation: &str,
    llm_client: Arc<dyn LlmClient>,
    lexicon: Option<Arc<Lexicon>>,
    config: &ExtractConfig,
) -> SessionContext {
    let (tx, rx) = mpsc::channel::<LegOutcome>();

    let general_prompt = prompts::general_intent_system_prompt();
    let user_message = prompts::shared_user_message(query, conversation);
    {
        let tx = tx.clone();
        let client = Arc::clone(&llm_client);
        let request = ChatRequest {
            system_prompt: general_prompt,
            user_message: user_message.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens_general,
            temperature: 0.0,
            timeout: config.per_call_timeout,
        };
        thread::spawn(move || {
            let outcome = client
                .complete(&request)
                .ok()
                .and_then(|raw| crate::llm::parse_json::<GeneralIntentResponse>(&raw).ok());
            let _ = tx.send(LegOutcome::General(outcome));
        });
    }

    {
        let tx = tx.clone();
        let client = Arc::clone(&llm_client);
        let specialty = config.specialty.clone();
        let variant = config.clinical_variant;
        let lexicon = lexicon.clone();
        let system_prompt = prompts::clinical_intent_system_prompt(
            &specialty,
            variant,
            lexicon.as_deref(),
        );
        let request = ChatRequest {
            system_prompt,
            user_message: user_message.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens_clinical,
            temperature: 0.0,
            timeout: config.per_call_timeout,
        };
        thread::spawn(move || {
            let outcome = client
                .complete(&request)
                .ok()
                .and_then(|raw| crate::llm::parse_json::<ClinicalIntentResponse>(&raw).ok());
            let _ = tx.send(LegOutcome::Clinical(outcome));
        });
    }

    {
        let tx = tx.clone();
        let client = Arc::clone(&llm_client);
        let request = ChatRequest {
            system_prompt: prompts::insights_system_prompt(),
            user_message: user_message.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens_insights,
            temperature: 0.0,
            timeout: config.per_call_timeout,
        };
        thread::spawn(move || {
            let outcome = client
                .complete(&request)
                .ok()
                .and_then(|raw| crate::llm::parse_json::<InsightsResponse>(&raw).ok());
            let _ = tx.send(LegOutcome::Insights(outcome));
        });
    }
    drop(tx);

    let mut general = None;
    let mut clinical = None;
    let mut insights = None;
    for outcome in rx {
        match outcome {
            LegOutcome::General(result) => general = result,
            LegOutcome::Clinical(result) => clinical = result,
            LegOutcome::Insights(result) => insights = result,
        }
    }

    let mut fallback = false;
    let general = general.unwrap_or_else(|| {
        fallback = true;
        GeneralIntentResponse::fallback()
    });
    let clinical = clinical.unwrap_or_else(|| {
        fallback = true;
        ClinicalIntentResponse::fallback(&config.specialty)
    });
    let insights = insights.unwrap_or_else(|| {
        fallback = true;
        InsightsResponse::default()
    });

    merge::merge(query, &general, &clinical, &insights, fallback)
}
