pub mod error;

pub use error::CorpusError;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::{Practitioner, PractitionerRecord};
use crate::shared::PractitionerId;

/// Accepts either `{"records": [...]}` or a bare JSON array (spec.md
/// §6.3 "Practitioner corpus").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { records: Vec<PractitionerRecord> },
    Bare(Vec<PractitionerRecord>),
}

impl CorpusFile {
    fn into_records(self) -> Vec<PractitionerRecord> {
        match self {
            CorpusFile::Wrapped { records } => records,
            CorpusFile::Bare(records) => records,
        }
    }
}

/// The immutable, process-wide practitioner corpus (spec.md §3
/// Lifecycle). Loaded once at startup; `blacklisted` records are kept
/// in `all` (so operational tooling can still see them) but excluded
/// unconditionally from `active_candidates` (spec.md §3 invariant,
/// §8.1).
#[derive(Debug, Clone)]
pub struct Corpus {
    all: Vec<Practitioner>,
    by_id: HashMap<PractitionerId, usize>,
}

impl Corpus {
    pub fn load_from_path(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&raw)
    }

    pub fn load_from_str(raw: &str) -> Result<Self, CorpusError> {
        let file: CorpusFile = serde_json::from_str(raw).map_err(|source| CorpusError::Parse {
            source,
        })?;
        Self::from_records(file.into_records())
    }

    /// Merges a V7 "canonical" checklist-bearing slice into a
    /// "normalized" BM25-friendly slice via each canonical record's
    /// `legacy_ids` linkage (spec.md §6.3). Canonical checklist profiles
    /// win; everything else comes from the normalized record.
    pub fn merge_canonical(
        normalized: Vec<PractitionerRecord>,
        canonical: Vec<PractitionerRecord>,
    ) -> Result<Self, CorpusError> {
        let mut checklist_by_legacy_id: HashMap<String, crate::domain::ChecklistProfile> =
            HashMap::new();
        for record in canonical {
            if let Some(profile) = record.checklist_profile.clone() {
                for legacy_id in &record.legacy_ids {
                    checklist_by_legacy_id.insert(legacy_id.clone(), profile.clone());
                }
                checklist_by_legacy_id.insert(record.id.clone(), profile);
            }
        }

        let merged = normalized
            .into_iter()
            .map(|mut record| {
                if record.checklist_profile.is_none() {
                    record.checklist_profile = checklist_by_legacy_id.get(&record.id).cloned();
                }
                record
            })
            .collect();
        Self::from_records(merged)
    }

    fn from_records(records: Vec<PractitionerRecord>) -> Result<Self, CorpusError> {
        let mut all = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            let raw_id = record.id.clone();
            let practitioner =
                Practitioner::from_record(record).map_err(|reason| CorpusError::InvalidRecord {
                    id: raw_id.clone(),
                    reason,
                })?;
            if by_id.contains_key(&practitioner.id) {
                return Err(CorpusError::DuplicateId { id: raw_id });
            }
            by_id.insert(practitioner.id.clone(), all.len());
            all.push(practitioner);
        }
        Ok(Self { all, by_id })
    }

    /// All non-blacklisted practitioners, in corpus (load) order. This
    /// is the "natural index order" spec.md §4.I's return-count
    /// invariant refers to for deterministic zero-score fill.
    pub fn active_candidates(&self) -> Vec<&Practitioner> {
        self.all.iter().filter(|p| !p.blacklisted).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Practitioner> {
        self.by_id.get(id).map(|&idx| &self.all[idx])
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn blacklisted_count(&self) -> usize {
        self.all.iter().filter(|p| p.blacklisted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_and_wrapped_object_both_load() {
        let bare = Corpus::load_from_str(r#"[{"id":"a","name":"A","specialty":"Cardiology"}]"#)
            .expect("bare");
        assert_eq!(bare.len(), 1);

        let wrapped = Corpus::load_from_str(
            r#"{"records":[{"id":"a","name":"A","specialty":"Cardiology"}]}"#,
        )
        .expect("wrapped");
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Corpus::load_from_str(
            r#"[{"id":"a","name":"A","specialty":"X"},{"id":"a","name":"B","specialty":"Y"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateId { .. }));
    }

    #[test]
    fn blacklisted_practitioners_are_excluded_from_active_candidates() {
        let corpus = Corpus::load_from_str(
            r#"[
                {"id":"a","name":"A","specialty":"X","blacklisted":true},
                {"id":"b","name":"B","specialty":"X","blacklisted":false}
            ]"#,
        )
        .expect("load");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.blacklisted_count(), 1);
        let active = corpus.active_candidates();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "b");
    }
}
