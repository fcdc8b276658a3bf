use std::collections::HashSet;

use crate::domain::{Checklist, Practitioner, RankingConfig, SessionContext};
use crate::shared::PractitionerId;
use crate::text::tokenize::bm25_tokens;

/// Which ordering key is primary for a rescored candidate (spec.md
/// §4.R "Ambiguity policy"): when the query is ambiguous and the
/// variant is in the "parallel" family, the rescoring delta becomes the
/// primary key and BM25 is only a tiebreaker; otherwise BM25 stays
/// primary and rescoring is additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescoreVariant {
    /// v2/v5-style: BM25 primary, rescore delta additive.
    Sequential,
    /// v6/v7-style under ambiguity: rescore delta primary, BM25 tiebreaks.
    Parallel,
}

#[derive(Debug, Clone)]
pub struct RescoredCandidate {
    pub id: PractitionerId,
    pub bm25_score: f32,
    pub rescore_delta: f32,
    pub final_score: f32,
    pub anchor_hits: usize,
    pub negative_hits: usize,
}

/// Runs Stage B over the Stage-A top-N, producing a new order (spec.md
/// §4.R).
pub fn rescore(
    stage_a: &[(&Practitioner, f32)],
    session_context: &SessionContext,
    checklist: Option<&Checklist>,
    variant: RescoreVariant,
    config: &RankingConfig,
) -> Vec<RescoredCandidate> {
    let mut out: Vec<RescoredCandidate> = stage_a
        .iter()
        .map(|(practitioner, bm25_score)| {
            rescore_one(practitioner, *bm25_score, session_context, checklist, config)
        })
        .collect();

    let use_parallel = variant == RescoreVariant::Parallel && session_context.is_query_ambiguous;
    out.sort_by(|a, b| {
        if use_parallel {
            b.rescore_delta
                .partial_cmp(&a.rescore_delta)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.bm25_score.partial_cmp(&a.bm25_score).unwrap_or(std::cmp::Ordering::Equal))
        } else {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    });
    out
}

fn rescore_one(
    practitioner: &Practitioner,
    bm25_score: f32,
    session_context: &SessionContext,
    checklist: Option<&Checklist>,
    config: &RankingConfig,
) -> RescoredCandidate {
    let searchable_text = practitioner
        .weighted_fields()
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let doc_tokens: HashSet<String> = bm25_tokens(&searchable_text).into_iter().collect();

    let mut additive = 0.0_f32;
    let mut multiplier = 1.0_f32;

    // Anchor phrase matches, capped.
    let mut anchor_hits = 0usize;
    for anchor in &session_context.anchor_phrases {
        if phrase_in_text(anchor, &searchable_text) {
            anchor_hits += 1;
        }
    }
    additive += (anchor_hits as f32 * config.anchor_per_match).min(config.anchor_cap);

    // Procedure token matches: each of the doctor's named procedures
    // that shares a token with the query's own intent/anchor terms.
    let query_tokens: HashSet<String> = session_context
        .intent_terms
        .iter()
        .chain(session_context.anchor_phrases.iter())
        .flat_map(|term| bm25_tokens(term))
        .collect();
    for procedure in &practitioner.expertise.procedures {
        let tokens = bm25_tokens(procedure);
        if tokens.iter().any(|t| query_tokens.contains(t)) {
            additive += config.procedure_per_match;
        }
    }

    // Likely subspecialty match.
    let mut best_subspecialty_contrib = 0.0_f32;
    for likely in &session_context.likely_subspecialties {
        let name_lower = likely.name.to_ascii_lowercase();
        if practitioner
            .subspecialties
            .iter()
            .any(|s| s.to_ascii_lowercase() == name_lower)
        {
            let contrib = (config.subspecialty_factor * likely.confidence).min(config.subspecialty_cap);
            best_subspecialty_contrib = best_subspecialty_contrib.max(contrib);
        }
    }
    additive += best_subspecialty_contrib;

    // Intent-tier term matches: first two intent terms are "high
    // signal", the rest are "pathway" tier, each with decaying weight.
    // Intent terms are frequently multi-word phrases (e.g. "chest
    // pain"), so they're matched as substrings of the joined field text
    // rather than single-token set membership, same as anchor phrases.
    for (idx, term) in session_context.intent_terms.iter().enumerate() {
        if !phrase_in_text(term, &searchable_text) {
            continue;
        }
        additive += match idx {
            0 => config.high_signal_1,
            1 => config.high_signal_2,
            2 => config.pathway_1,
            3 => config.pathway_2,
            _ => config.pathway_3,
        };
    }

    // Safe-lane term match count tiers. Same multi-word-phrase
    // consideration as intent terms above.
    let safe_lane_hits = session_context
        .safe_lane_terms
        .iter()
        .filter(|term| phrase_in_text(term, &searchable_text))
        .count();
    additive += match safe_lane_hits {
        0 => 0.0,
        1 => config.safe_lane_1,
        2 => config.safe_lane_2,
        _ => config.safe_lane_3_or_more,
    };

    // Negative-term match count: multiplicative penalty.
    let negative_hits = session_context
        .negative_terms
        .iter()
        .filter(|term| doc_tokens.contains(term.as_str()))
        .count();
    multiplier *= match negative_hits {
        0 => 1.0,
        1 => config.negative_mult_1,
        2 => config.negative_mult_2,
        3 => config.negative_mult_2,
        _ => config.negative_mult_4_or_more,
    };

    // V7 checklist hit-ratio boost.
    if let Some(checklist) = checklist {
        if !checklist.is_empty() {
            if let Some(profile) = &practitioner.checklist_profile {
                let hit_ratio = checklist_hit_ratio(checklist, profile);
                if hit_ratio >= config.checklist_match_threshold {
                    multiplier *= config.checklist_boost_weight as f32;
                }
            }
        }
    }

    let rescore_delta = additive;
    let final_score = (bm25_score + additive) * multiplier;

    RescoredCandidate {
        id: practitioner.id.clone(),
        bm25_score,
        rescore_delta,
        final_score,
        anchor_hits,
        negative_hits,
    }
}

fn phrase_in_text(phrase: &str, text_lower: &str) -> bool {
    let phrase_lower = phrase.to_ascii_lowercase();
    if phrase_lower.is_empty() {
        return false;
    }
    text_lower.contains(&phrase_lower)
}

fn checklist_hit_ratio(
    checklist: &Checklist,
    profile: &crate::domain::ChecklistProfile,
) -> f64 {
    if checklist.filter_values.is_empty() {
        return 0.0;
    }
    let hits = checklist
        .filter_values
        .iter()
        .filter(|value| {
            profile.procedures_set.contains(*value) || profile.conditions_set.contains(*value)
        })
        .count();
    hits as f64 / checklist.filter_values.len() as f64
}
