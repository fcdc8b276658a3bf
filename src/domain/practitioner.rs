use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::shared::PractitionerId;
use crate::text::expertise::{self, ParsedExpertise};

/// A practitioner profile as it arrives from the (external) corpus file.
/// Deserialized once at startup and never mutated afterward (spec.md §3
/// Lifecycle: "Practitioners are loaded once at startup, immutable
/// thereafter").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub specialty: String,
    #[serde(default)]
    pub subspecialties: Vec<String>,
    #[serde(default)]
    pub procedure_groups: Vec<String>,
    #[serde(default)]
    pub clinical_expertise: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub patient_age_group: Vec<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub insurance_providers: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub blacklisted: bool,
    #[serde(default)]
    pub rating_value: Option<f32>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub procedures_completed: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub memberships: Vec<String>,
    #[serde(default)]
    pub checklist_profile: Option<ChecklistProfile>,
    /// Links a V7 "canonical" checklist-bearing record back to the
    /// "normalized" BM25-friendly record it was merged with (spec.md
    /// §6.3).
    #[serde(default)]
    pub legacy_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecklistProfile {
    #[serde(default)]
    pub procedures_set: HashSet<String>,
    #[serde(default)]
    pub conditions_set: HashSet<String>,
}

/// The searchable, immutable view of a practitioner used by every
/// downstream component. Built once from a `PractitionerRecord` at
/// corpus-load time so that `clinical_expertise` parsing (spec.md §3
/// invariant: "parsing never fails") and gender inference run exactly
/// once per document rather than once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: PractitionerId,
    pub name: String,
    pub title: String,
    pub specialty: String,
    pub subspecialties: Vec<String>,
    pub procedure_groups: Vec<String>,
    pub expertise: ParsedExpertise,
    pub about: String,
    pub description: String,
    pub languages: Vec<String>,
    pub patient_age_group: Vec<String>,
    pub gender: Option<String>,
    pub insurance_providers: Vec<String>,
    pub locations: Vec<String>,
    pub blacklisted: bool,
    pub rating_value: Option<f32>,
    pub review_count: Option<u32>,
    pub procedures_completed: Vec<String>,
    pub qualifications: Vec<String>,
    pub memberships: Vec<String>,
    pub checklist_profile: Option<ChecklistProfile>,
}

impl Practitioner {
    pub fn from_record(record: PractitionerRecord) -> Result<Self, String> {
        let id = PractitionerId::new(record.id)?;
        let expertise = expertise::parse(&record.clinical_expertise);
        let gender = record
            .gender
            .filter(|g| !g.trim().is_empty())
            .or_else(|| infer_gender(&record.title, &record.name));
        Ok(Self {
            id,
            name: record.name,
            title: record.title,
            specialty: record.specialty,
            subspecialties: record.subspecialties,
            procedure_groups: record.procedure_groups,
            expertise,
            about: record.about,
            description: record.description,
            languages: record.languages,
            patient_age_group: record.patient_age_group,
            gender,
            insurance_providers: record.insurance_providers,
            locations: record.locations,
            blacklisted: record.blacklisted,
            rating_value: record.rating_value,
            review_count: record.review_count,
            procedures_completed: record.procedures_completed,
            qualifications: record.qualifications,
            memberships: record.memberships,
            checklist_profile: record.checklist_profile,
        })
    }

    /// The named, weighted fields `bm25::Index` sums term frequencies
    /// over (spec.md §4.I default field-weight table). Each entry is
    /// `(field_name, text)`; the index looks up each field's weight by
    /// name in `RankingConfig::field_weights`, defaulting to 1.0 for an
    /// unrecognized name so new fields never panic the scorer.
    pub fn weighted_fields(&self) -> Vec<(&'static str, String)> {
        let about = if self.about.is_empty() {
            self.description.clone()
        } else {
            self.about.clone()
        };
        vec![
            ("clinical_expertise", self.expertise.searchable_text()),
            ("procedure_groups", self.procedure_groups.join(" ")),
            ("specialty", self.specialty.clone()),
            ("subspecialties", self.subspecialties.join(" ")),
            (
                "specialty_description",
                format!("{} {}", self.specialty, about),
            ),
            ("description", about),
            ("expertise_procedures", self.expertise.procedures.join(" ")),
            ("expertise_conditions", self.expertise.conditions.join(" ")),
        ]
    }
}

/// Deterministic title/pronoun heuristic for the gender inference named
/// in spec.md §3 ("may be inferred from title/pronouns when missing").
/// Conservative: returns `None` rather than guessing from name alone.
fn infer_gender(title: &str, _name: &str) -> Option<String> {
    let lower = title.to_ascii_lowercase();
    if lower.contains("mr.") || lower.contains("mr ") {
        return Some("male".to_string());
    }
    if lower.contains("mrs.") || lower.contains("mrs ") || lower.contains("ms.") || lower.contains("ms ") {
        return Some("female".to_string());
    }
    None
}
