use std::collections::HashSet;
use std::sync::OnceLock;

use crate::text::tokenize::tokenize_min2;

/// One curated equivalence entry: a token/phrase and the single
/// alternative form it may expand to. `context_requires_any` gates the
/// expansion on at least one of those other tokens also being present
/// in the query (spec.md §4.T: "expand 'echo' only when another
/// cardiac token is present").
struct Equivalence {
    from: &'static str,
    to: &'static str,
    context_requires_any: &'static [&'static str],
}

/// Hand-written, not generated — the teacher repo never reaches for a
/// build-time codegen crate for small static tables (see e.g.
/// `STATUS_INTENT` in its lexical router); this is the same shape.
const EQUIVALENCES: &[Equivalence] = &[
    Equivalence { from: "echo", to: "echocardiogram", context_requires_any: &["heart", "cardiac", "cardiology", "murmur", "valve"] },
    Equivalence { from: "echocardiogram", to: "echo", context_requires_any: &[] },
    Equivalence { from: "svt", to: "supraventricular tachycardia", context_requires_any: &[] },
    Equivalence { from: "afib", to: "atrial fibrillation", context_requires_any: &[] },
    Equivalence { from: "af", to: "atrial fibrillation", context_requires_any: &["heart", "cardiac", "rhythm", "arrhythmia"] },
    Equivalence { from: "mi", to: "myocardial infarction", context_requires_any: &["heart", "cardiac", "chest"] },
    Equivalence { from: "ibs", to: "irritable bowel syndrome", context_requires_any: &[] },
    Equivalence { from: "gerd", to: "gastroesophageal reflux disease", context_requires_any: &[] },
    Equivalence { from: "copd", to: "chronic obstructive pulmonary disease", context_requires_any: &[] },
    Equivalence { from: "htn", to: "hypertension", context_requires_any: &[] },
    Equivalence { from: "dm", to: "diabetes mellitus", context_requires_any: &["blood", "sugar", "insulin", "glucose"] },
    Equivalence { from: "pcos", to: "polycystic ovary syndrome", context_requires_any: &[] },
    Equivalence { from: "ob gyn", to: "obstetrics and gynaecology", context_requires_any: &[] },
    Equivalence { from: "obgyn", to: "obstetrics and gynaecology", context_requires_any: &[] },
    Equivalence { from: "ent", to: "ear nose and throat", context_requires_any: &[] },
    Equivalence { from: "derm", to: "dermatology", context_requires_any: &[] },
    Equivalence { from: "paeds", to: "paediatrics", context_requires_any: &[] },
    Equivalence { from: "peds", to: "pediatrics", context_requires_any: &[] },
];

fn equivalence_index() -> &'static std::collections::HashMap<&'static str, Vec<&'static Equivalence>> {
    static INDEX: OnceLock<std::collections::HashMap<&'static str, Vec<&'static Equivalence>>> =
        OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map: std::collections::HashMap<&'static str, Vec<&'static Equivalence>> =
            std::collections::HashMap::new();
        for equivalence in EQUIVALENCES {
            map.entry(equivalence.from).or_default().push(equivalence);
        }
        map
    })
}

/// Expands a query with at most two equivalence aliases (spec.md §4.T
/// "Equivalence aliasing (normalizeMedicalQuery)"). Expansion is
/// equivalence-only: it never introduces an unrelated synonym, only the
/// curated alternate spelling/abbreviation form, and a context-gated
/// equivalence only fires when one of its trigger tokens is also
/// present in the query.
pub fn normalize_medical_query(query: &str) -> Vec<String> {
    let tokens = tokenize_min2(query);
    let token_set: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
    let index = equivalence_index();

    let mut aliases = Vec::new();
    let mut seen = HashSet::new();
    'tokens: for token in &tokens {
        if let Some(candidates) = index.get(token.as_str()) {
            for equivalence in candidates {
                if aliases.len() >= 2 {
                    break 'tokens;
                }
                let gated = !equivalence.context_requires_any.is_empty()
                    && !equivalence
                        .context_requires_any
                        .iter()
                        .any(|trigger| token_set.contains(trigger));
                if gated {
                    continue;
                }
                if seen.insert(equivalence.to) {
                    aliases.push(equivalence.to.to_string());
                }
            }
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_unambiguous_abbreviation() {
        let aliases = normalize_medical_query("I need SVT ablation");
        assert_eq!(aliases, vec!["supraventricular tachycardia".to_string()]);
    }

    #[test]
    fn context_gated_alias_fires_only_with_trigger_present() {
        let with_context = normalize_medical_query("echo for my heart murmur");
        assert!(with_context.contains(&"echocardiogram".to_string()));

        let without_context = normalize_medical_query("echo of the canyon");
        assert!(!without_context.contains(&"echocardiogram".to_string()));
    }

    #[test]
    fn expansion_is_capped_at_two_aliases() {
        let aliases = normalize_medical_query("IBS GERD COPD HTN");
        assert!(aliases.len() <= 2);
    }
}
