pub mod checklist;
pub mod evaluation;
pub mod ideal_profile;
pub mod practitioner;
pub mod ranking_config;
pub mod session_context;

pub use checklist::Checklist;
pub use evaluation::{EvaluationRecord, FitCategory};
pub use ideal_profile::{IdealProfile, Importance, WeightedTerm};
pub use practitioner::{ChecklistProfile, Practitioner, PractitionerRecord};
pub use ranking_config::RankingConfig;
pub use session_context::{Insights, LikelySubspecialty, SessionContext, Specificity, Urgency};
