// Short, stable node ids derived from free-text titles

use std::collections::HashSet;

pub const MAX_ID_LENGTH: usize = 20;
pub const FALLBACK_ID: &str = "NODE";

const STOPWORDS: &[&str] = &[
    "the", "for", "and", "or", "but", "a", "an", "of", "in", "on", "at", "to", "with", "without",
    "by", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];

/// Derive an id from `title` that does not collide with `existing_ids`.
///
/// `"Printing Troubleshooting"` becomes `PRNT_TRBLSHT`; if that is taken the
/// result is `PRNT_TRBLSHT_1`, then `_2`, and so on. Ids never exceed
/// [`MAX_ID_LENGTH`] characters.
pub fn generate_id(title: &str, existing_ids: &HashSet<String>) -> String {
    let base = base_id(title);

    let mut candidate = base.clone();
    let mut suffix = 1;
    while existing_ids.contains(&candidate) {
        let suffix_str = format!("_{}", suffix);
        let allowed = MAX_ID_LENGTH.saturating_sub(suffix_str.len());
        candidate = format!("{}{}", truncate(&base, allowed), suffix_str);
        suffix += 1;
    }
    candidate
}

fn base_id(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let words: Vec<String> = cleaned
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .map(abbreviate)
        .collect();

    let joined = words.join("_");
    if joined.is_empty() {
        return FALLBACK_ID.to_string();
    }
    truncate(&joined, MAX_ID_LENGTH).to_string()
}

fn abbreviate(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_uppercase();
    }

    let word = match word.strip_suffix("ing") {
        Some(stem) if stem.len() > 3 => stem,
        _ => word,
    };

    let mut chars = word.chars();
    let mut out = String::with_capacity(word.len());
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
    }
    out.extend(
        chars
            .filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
            .map(|c| c.to_ascii_uppercase()),
    );
    out
}

// Ids are ASCII after cleaning, so byte slicing is safe
fn truncate(s: &str, max: usize) -> &str {
    if s.len() > max { &s[..max] } else { s }
}

/// Hands out unique ids for one batch of nodes.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    assigned: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the allocator with ids that already exist.
    pub fn with_existing<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allocator = Self::new();
        for id in ids {
            allocator.reserve(id);
        }
        allocator
    }

    /// Mark `id` as taken. Returns false if it already was.
    pub fn reserve(&mut self, id: impl Into<String>) -> bool {
        self.assigned.insert(id.into())
    }

    pub fn allocate(&mut self, title: &str) -> String {
        let id = generate_id(title, &self.assigned);
        self.assigned.insert(id.clone());
        id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assigned.contains(id)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
