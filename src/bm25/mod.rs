pub mod quality;

pub use quality::boost as quality_boost;

use std::collections::HashMap;

use crate::domain::{Practitioner, RankingConfig};
use crate::shared::PractitionerId;
use crate::text::tokenize::bm25_tokens;

const AVG_DOC_LEN_FLOOR: f32 = 1.0;

struct FieldStats {
    name: String,
    weight: f32,
    term_freqs: HashMap<String, u32>,
    doc_len: f32,
}

struct DocumentStats {
    id: PractitionerId,
    /// Index into the corpus slice the caller built the index from —
    /// preserves "natural index order" for the zero-score fill
    /// (spec.md §4.I return-count invariant, §8.4).
    order: usize,
    fields: Vec<FieldStats>,
    /// Carried alongside the field stats so `top_n` can apply the
    /// rating/review-count/procedures-completed multiplicative quality
    /// boost (spec.md §4.I "Quality boost") without needing a borrowed
    /// `Practitioner` reference on the index itself.
    rating_value: Option<f32>,
    review_count: Option<u32>,
    procedures_completed: Vec<String>,
}

/// A per-request weighted multi-field BM25 index (spec.md §4.I). Built
/// fresh for every request over the already-filtered candidate slice;
/// never shared or mutated across requests (spec.md §5 "BM25 index
/// state is per-request and not shared").
pub struct Index {
    k1: f32,
    b: f32,
    docs: Vec<DocumentStats>,
    /// document frequency per term, pooled across all fields (a term
    /// counts once per document even if it appears in several fields).
    doc_freq: HashMap<String, u32>,
    avg_field_len: HashMap<String, f32>,
    n: usize,
}

impl Index {
    pub fn build<'a>(candidates: &[&'a Practitioner], config: &RankingConfig) -> Self {
        let n = candidates.len();
        let mut docs = Vec::with_capacity(n);
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        let mut field_len_totals: HashMap<String, f32> = HashMap::new();
        let mut field_doc_counts: HashMap<String, usize> = HashMap::new();

        for (order, practitioner) in candidates.iter().enumerate() {
            let mut fields = Vec::new();
            let mut doc_terms_seen = std::collections::HashSet::new();
            for (field_name, text) in practitioner.weighted_fields() {
                let tokens = bm25_tokens(&text);
                let mut term_freqs: HashMap<String, u32> = HashMap::new();
                for token in &tokens {
                    *term_freqs.entry(token.clone()).or_insert(0) += 1;
                    doc_terms_seen.insert(token.clone());
                }
                *field_len_totals.entry(field_name.to_string()).or_insert(0.0) += tokens.len() as f32;
                *field_doc_counts.entry(field_name.to_string()).or_insert(0) += 1;
                fields.push(FieldStats {
                    name: field_name.to_string(),
                    weight: config.field_weight(field_name),
                    term_freqs,
                    doc_len: tokens.len() as f32,
                });
            }
            for term in doc_terms_seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
            docs.push(DocumentStats {
                id: practitioner.id.clone(),
                order,
                fields,
                rating_value: practitioner.rating_value,
                review_count: practitioner.review_count,
                procedures_completed: practitioner.procedures_completed.clone(),
            });
        }

        let mut avg_field_len = HashMap::new();
        for (field, total) in field_len_totals {
            let count = field_doc_counts.get(&field).copied().unwrap_or(1).max(1) as f32;
            avg_field_len.insert(field, (total / count).max(AVG_DOC_LEN_FLOOR));
        }

        Self {
            k1: config.k1,
            b: config.b,
            docs,
            doc_freq,
            avg_field_len,
            n,
        }
    }

    /// Non-negative-clamped IDF (spec.md §4.I, §8.3): terms present in
    /// every candidate document score exactly 0, never negative.
    fn idf(&self, term: &str) -> f32 {
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
        let n = self.n as f32;
        let raw = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        raw.max(0.0)
    }

    /// BM25 score for one document against a query term list. IDF is
    /// applied once per term across the field-weighted contribution —
    /// a term's global rarity, not its per-field length normalization,
    /// drives the IDF weight.
    fn score(&self, doc: &DocumentStats, query_terms: &[String]) -> f32 {
        query_terms
            .iter()
            .map(|term| {
                let idf = self.idf(term);
                if idf <= 0.0 {
                    return 0.0;
                }
                let field_sum: f32 = doc
                    .fields
                    .iter()
                    .map(|field| {
                        let tf = *field.term_freqs.get(term).unwrap_or(&0) as f32;
                        field.weight * self.field_term_score(tf, field)
                    })
                    .sum();
                field_sum * idf
            })
            .sum()
    }

    fn field_term_score(&self, tf: f32, field: &FieldStats) -> f32 {
        if tf == 0.0 {
            return 0.0;
        }
        let avg_len = self
            .avg_field_len
            .get(&field.name)
            .copied()
            .unwrap_or(AVG_DOC_LEN_FLOOR)
            .max(AVG_DOC_LEN_FLOOR);
        let norm = 1.0 - self.b + self.b * (field.doc_len.max(AVG_DOC_LEN_FLOOR) / avg_len);
        (tf * (self.k1 + 1.0)) / (tf + self.k1 * norm)
    }

    /// Returns the top `n` documents by score, satisfying the
    /// return-count invariant (spec.md §4.I, §8.2/§8.4):
    /// `min(n, |candidates|)` documents are always returned, with
    /// zero-score documents filling from natural index order once
    /// non-zero-score documents are exhausted.
    pub fn top_n(&self, query_terms: &[String], n: usize) -> Vec<(PractitionerId, f32)> {
        let mut scored: Vec<(usize, &DocumentStats, f32)> = self
            .docs
            .iter()
            .map(|doc| {
                let base = self.score(doc, query_terms);
                let boosted = if base > 0.0 {
                    base * quality::multiplier(
                        doc.rating_value,
                        doc.review_count,
                        &doc.procedures_completed,
                        query_terms,
                    )
                } else {
                    base
                };
                (doc.order, doc, boosted)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(n.min(self.docs.len()))
            .map(|(_, doc, score)| (doc.id.clone(), score))
            .collect()
    }

    pub fn score_by_id(&self, id: &str, query_terms: &[String]) -> Option<f32> {
        self.docs
            .iter()
            .find(|doc| doc.id.as_str() == id)
            .map(|doc| self.score(doc, query_terms))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
