use crate::domain::Practitioner;

/// A compact, LLM-facing summary of one candidate (spec.md §4.E "profile
/// card"): name, specialty, subspecialties, top-25 procedures, parsed
/// conditions, clinical interests, truncated description, qualifications,
/// memberships.
#[derive(Debug, Clone)]
pub struct ProfileCard {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub subspecialties: Vec<String>,
    pub top_procedures: Vec<String>,
    pub conditions: Vec<String>,
    pub clinical_interests: Vec<String>,
    pub description: String,
    pub qualifications: Vec<String>,
    pub memberships: Vec<String>,
}

impl ProfileCard {
    pub fn build(practitioner: &Practitioner, description_truncate_chars: usize) -> Self {
        let mut top_procedures = practitioner.expertise.procedures.clone();
        top_procedures.truncate(25);

        let source_description = if practitioner.about.is_empty() {
            &practitioner.description
        } else {
            &practitioner.about
        };
        let description = truncate_chars(source_description, description_truncate_chars);

        Self {
            id: practitioner.id.as_str().to_string(),
            name: practitioner.name.clone(),
            specialty: practitioner.specialty.clone(),
            subspecialties: practitioner.subspecialties.clone(),
            top_procedures,
            conditions: practitioner.expertise.conditions.clone(),
            clinical_interests: practitioner.expertise.interests.clone(),
            description,
            qualifications: practitioner.qualifications.clone(),
            memberships: practitioner.memberships.clone(),
        }
    }

    /// Renders the card as a compact block for inclusion in the fit
    /// evaluator's user message.
    pub fn render(&self) -> String {
        format!(
            "id: {}\nname: {}\nspecialty: {}\nsubspecialties: {}\nprocedures: {}\nconditions: {}\ninterests: {}\ndescription: {}\nqualifications: {}\nmemberships: {}",
            self.id,
            self.name,
            self.specialty,
            self.subspecialties.join(", "),
            self.top_procedures.join(", "),
            self.conditions.join(", "),
            self.clinical_interests.join(", "),
            self.description,
            self.qualifications.join(", "),
            self.memberships.join(", "),
        )
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PractitionerRecord;

    #[test]
    fn profile_card_truncates_procedures_and_description() {
        let procedures = (0..30)
            .map(|i| format!("Procedure: P{i}"))
            .collect::<Vec<_>>()
            .join("; ");
        let record = PractitionerRecord {
            id: "a".to_string(),
            name: "Dr A".to_string(),
            title: String::new(),
            specialty: "Cardiology".to_string(),
            subspecialties: vec![],
            procedure_groups: vec![],
            clinical_expertise: procedures,
            about: "x".repeat(500),
            description: String::new(),
            languages: vec![],
            patient_age_group: vec![],
            gender: None,
            insurance_providers: vec![],
            locations: vec![],
            blacklisted: false,
            rating_value: None,
            review_count: None,
            procedures_completed: vec![],
            qualifications: vec![],
            memberships: vec![],
            checklist_profile: None,
            legacy_ids: vec![],
        };
        let practitioner = Practitioner::from_record(record).expect("valid");
        let card = ProfileCard::build(&practitioner, 350);
        assert_eq!(card.top_procedures.len(), 25);
        assert_eq!(card.description.chars().count(), 350);
    }
}
