/// Lowercases, replaces non-word characters with spaces, and splits on
/// whitespace (spec.md §4.T "Tokenization"). Returns every token of
/// length ≥2, so intent-term filters (which need 2-letter tokens like
/// "ib" fragments of "IBS") can reuse this, while BM25 scoring applies
/// its own ≥3 cutoff via [`bm25_tokens`].
pub fn tokenize_min2(input: &str) -> Vec<String> {
    tokenize_with_min_len(input, 2)
}

/// Same tokenization, filtered to length ≥3 for BM25 indexing/query
/// terms (spec.md §4.T).
pub fn bm25_tokens(input: &str) -> Vec<String> {
    tokenize_with_min_len(input, 3)
}

fn tokenize_with_min_len(input: &str, min_len: usize) -> Vec<String> {
    input
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|token| token.chars().count() >= min_len)
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bm25_tokens_drops_short_tokens() {
        let tokens = bm25_tokens("I need an MRI of my IBS");
        assert!(!tokens.contains(&"an".to_string()));
        assert!(tokens.contains(&"mri".to_string()));
        assert!(tokens.contains(&"ibs".to_string()));
    }

    #[test]
    fn tokenize_min2_keeps_two_letter_tokens() {
        let tokens = tokenize_min2("IBS dietitian");
        assert!(tokens.contains(&"ibs".to_string()));
    }

    #[test]
    fn non_word_characters_become_separators() {
        let tokens = bm25_tokens("catheter-ablation, SVT/ablation!");
        assert_eq!(tokens, vec!["catheter", "ablation", "svt", "ablation"]);
    }
}
