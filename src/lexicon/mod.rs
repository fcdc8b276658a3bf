pub mod error;
pub mod taxonomy;

pub use error::LexiconError;
pub use taxonomy::TaxonomyEntry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::text::tokenize::tokenize_min2;

/// Paths to the four JSON resources spec.md §6.3 names. Missing files
/// are fatal at startup (spec.md §4.L).
#[derive(Debug, Clone)]
pub struct LexiconPaths<'a> {
    pub subspecialties: &'a Path,
    pub procedures: &'a Path,
    pub conditions: &'a Path,
    pub taxonomy: &'a Path,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SubspecialtiesFile {
    #[serde(default)]
    global: Vec<String>,
    #[serde(default)]
    by_specialty: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RankedTermsFile {
    #[serde(default)]
    terms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    procedures: Vec<TaxonomyEntry>,
    #[serde(default)]
    conditions: Vec<TaxonomyEntry>,
    #[serde(default)]
    subspecialties: Vec<TaxonomyEntry>,
}

/// Read-only, process-wide vocabulary store (spec.md §4.L). Loaded once
/// at startup and shared behind an `Arc` thereafter — never refreshed
/// on the request path (spec.md §5).
#[derive(Debug, Clone)]
pub struct Lexicon {
    subspecialties_global: Vec<String>,
    subspecialties_by_specialty: BTreeMap<String, Vec<String>>,
    procedures: Vec<String>,
    conditions: Vec<String>,
    taxonomy: Vec<TaxonomyEntry>,
}

impl Lexicon {
    pub fn load(paths: LexiconPaths) -> Result<Self, LexiconError> {
        let subspecialties: SubspecialtiesFile = read_json(paths.subspecialties)?;
        let procedures: RankedTermsFile = read_json(paths.procedures)?;
        let conditions: RankedTermsFile = read_json(paths.conditions)?;
        let taxonomy_file: TaxonomyFile = read_json(paths.taxonomy)?;

        let mut taxonomy = Vec::new();
        taxonomy.extend(taxonomy_file.procedures);
        taxonomy.extend(taxonomy_file.conditions);
        taxonomy.extend(taxonomy_file.subspecialties);

        Ok(Self {
            subspecialties_global: subspecialties.global,
            subspecialties_by_specialty: subspecialties.by_specialty,
            procedures: procedures.terms,
            conditions: conditions.terms,
            taxonomy,
        })
    }

    /// Subspecialty vocabulary for a given specialty, falling back to
    /// the global list when the specialty has no dedicated entry
    /// (spec.md §4.L `forSpecialty`).
    pub fn for_specialty(&self, specialty: &str) -> &[String] {
        self.subspecialties_by_specialty
            .get(specialty)
            .map(|v| v.as_slice())
            .unwrap_or(&self.subspecialties_global)
    }

    pub fn top_procedures(&self, n: usize) -> &[String] {
        slice_up_to(&self.procedures, n)
    }

    pub fn top_conditions(&self, n: usize) -> &[String] {
        slice_up_to(&self.conditions, n)
    }

    /// Case-insensitive substring match of query tokens (length ≥2)
    /// against each taxonomy entry's canonical name or aliases
    /// (spec.md §4.L `findRelevantTaxonomyEntries`).
    pub fn find_relevant_taxonomy_entries(&self, query: &str) -> Vec<&TaxonomyEntry> {
        let tokens = tokenize_min2(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        self.taxonomy
            .iter()
            .filter(|entry| {
                tokens.iter().any(|token| entry.matches_token(token))
            })
            .collect()
    }

    pub fn taxonomy(&self) -> &[TaxonomyEntry] {
        &self.taxonomy
    }
}

fn slice_up_to(values: &[String], n: usize) -> &[String] {
    &values[..values.len().min(n)]
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LexiconError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LexiconError::MissingFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LexiconError::Parse {
        path: path.display().to_string(),
        source,
    })
}
