pub mod bm25;
pub mod checklist;
pub mod config;
pub mod corpus;
pub mod domain;
pub mod fit_eval;
pub mod lexicon;
pub mod llm;
pub mod pipeline;
pub mod progressive;
pub mod query_planner;
pub mod rescorer;
pub mod session_context;
pub mod shared;
pub mod text;
