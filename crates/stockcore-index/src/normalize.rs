use std::collections::HashSet;

/// Lowercases, turns every non-alphanumeric char into a space and collapses
/// runs of whitespace. `"Kabras Sugar, 2kg!"` becomes `"kabras sugar 2kg"`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Unigrams followed by contiguous bigrams and trigrams of an already
/// normalized string, deduplicated in first-seen order.
pub fn tokenize(normalized: &str) -> Vec<String> {
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    let mut seen = HashSet::new();
    let mut tokens = Vec::with_capacity(words.len() * 3);

    for width in 1..=3 {
        if words.len() < width {
            break;
        }
        for window in words.windows(width) {
            let token = window.join(" ");
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }
    }

    tokens
}
