use crate::domain::Practitioner;
use crate::text::tokenize::bm25_tokens;

/// Words too generic to count as a "relevant" procedure-admission match
/// (spec.md §4.I quality boost: denylist of terms like "surgical,
/// treatment, procedure, clinic, consultation, general").
const GENERIC_DENYLIST: &[&str] = &[
    "surgical",
    "treatment",
    "procedure",
    "clinic",
    "consultation",
    "general",
];

/// Multiplicative quality boost applied after BM25 scoring (spec.md
/// §4.I "Quality boost").
pub fn boost(practitioner: &Practitioner, base_score: f32, query_tokens: &[String]) -> f32 {
    base_score * multiplier(
        practitioner.rating_value,
        practitioner.review_count,
        &practitioner.procedures_completed,
        query_tokens,
    )
}

/// Same computation as [`boost`], but over the raw fields rather than a
/// borrowed `Practitioner` — used by `bm25::Index`, which keeps only
/// the fields it needs per document rather than a full reference
/// (spec.md §4.I "Quality boost", applied inline during Stage-A scoring).
pub fn multiplier(
    rating_value: Option<f32>,
    review_count: Option<u32>,
    procedures_completed: &[String],
    query_tokens: &[String],
) -> f32 {
    rating_multiplier(rating_value)
        * review_count_multiplier(review_count)
        * procedures_completed_multiplier(procedures_completed, query_tokens)
}

fn rating_multiplier(rating: Option<f32>) -> f32 {
    match rating {
        Some(r) if r >= 4.8 => 1.3,
        Some(r) if r >= 4.5 => 1.2,
        Some(r) if r >= 4.0 => 1.1,
        _ => 1.0,
    }
}

fn review_count_multiplier(review_count: Option<u32>) -> f32 {
    match review_count {
        Some(c) if c >= 100 => 1.2,
        Some(c) if c >= 50 => 1.15,
        Some(c) if c >= 20 => 1.1,
        _ => 1.0,
    }
}

/// Counts procedures in `procedures_completed` whose token overlap with
/// the query contains at least one term that is neither on the generic
/// denylist nor shorter than 4 characters, then applies granular
/// tiers. A practitioner with procedures but none relevant is
/// penalized 0.85x (spec.md §4.I).
fn procedures_completed_multiplier(procedures_completed: &[String], query_tokens: &[String]) -> f32 {
    if procedures_completed.is_empty() {
        return 1.0;
    }

    let query_set: std::collections::HashSet<&str> =
        query_tokens.iter().map(|t| t.as_str()).collect();

    let relevant_count = procedures_completed
        .iter()
        .filter(|procedure| {
            let tokens = bm25_tokens(procedure);
            tokens.iter().any(|token| {
                query_set.contains(token.as_str())
                    && token.chars().count() >= 4
                    && !GENERIC_DENYLIST.contains(&token.as_str())
            })
        })
        .count();

    match relevant_count {
        0 => 0.85,
        n if n >= 20 => 1.3,
        n if n >= 10 => 1.2,
        n if n >= 5 => 1.1,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PractitionerRecord;

    fn practitioner_with(
        rating: Option<f32>,
        review_count: Option<u32>,
        procedures_completed: Vec<String>,
    ) -> Practitioner {
        Practitioner::from_record(PractitionerRecord {
            id: "a".to_string(),
            name: "Dr A".to_string(),
            title: String::new(),
            specialty: "Cardiology".to_string(),
            subspecialties: vec![],
            procedure_groups: vec![],
            clinical_expertise: String::new(),
            about: String::new(),
            description: String::new(),
            languages: vec![],
            patient_age_group: vec![],
            gender: None,
            insurance_providers: vec![],
            locations: vec![],
            blacklisted: false,
            rating_value: rating,
            review_count,
            procedures_completed,
            qualifications: vec![],
            memberships: vec![],
            checklist_profile: None,
            legacy_ids: vec![],
        })
        .expect("valid practitioner")
    }

    #[test]
    fn high_rating_and_review_count_compound() {
        let practitioner = practitioner_with(Some(4.9), Some(150), vec![]);
        let boosted = boost(&practitioner, 1.0, &[]);
        assert!((boosted - 1.3 * 1.2).abs() < 1e-6);
    }

    #[test]
    fn irrelevant_procedures_completed_penalizes() {
        let practitioner =
            practitioner_with(None, None, vec!["General Consultation".to_string()]);
        let boosted = boost(&practitioner, 1.0, &["ablation".to_string()]);
        assert!((boosted - 0.85).abs() < 1e-6);
    }

    #[test]
    fn relevant_procedures_completed_boosts() {
        let procedures = vec!["Catheter Ablation".to_string(); 6];
        let practitioner = practitioner_with(None, None, procedures);
        let boosted = boost(&practitioner, 1.0, &["ablation".to_string()]);
        assert!((boosted - 1.1).abs() < 1e-6);
    }
}
