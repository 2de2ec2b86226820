//! Suggestion candidate generation.
//!
//! Each generator applies one class of edit to the misspelled word and keeps
//! the candidates the dictionary accepts. Generators run in a fixed order, so
//! earlier edit classes rank first. Every acceptance check is charged against
//! a cost budget.

use std::collections::HashSet;

use super::affix::Replacement;

/// Upper bound on acceptance checks per suggestion request.
const MAX_COST: usize = 4000;

/// Collected suggestions and the remaining budget.
pub struct SuggestionStatus<'a> {
    accept: &'a dyn Fn(&str) -> bool,
    max_suggestions: usize,
    cost: usize,
    suggestions: Vec<String>,
    seen: HashSet<String>,
}

impl<'a> SuggestionStatus<'a> {
    pub fn new(accept: &'a dyn Fn(&str) -> bool, max_suggestions: usize) -> Self {
        Self {
            accept,
            max_suggestions,
            cost: 0,
            suggestions: Vec::with_capacity(max_suggestions),
            seen: HashSet::new(),
        }
    }

    pub fn should_abort(&self) -> bool {
        self.suggestions.len() >= self.max_suggestions || self.cost >= MAX_COST
    }

    /// Checks `candidate` and records it if accepted.
    pub fn offer(&mut self, candidate: String) {
        if self.should_abort() || self.seen.contains(&candidate) {
            return;
        }
        self.cost += 1;
        if (self.accept)(&candidate) {
            self.push(candidate);
        }
    }

    /// Records an already-validated suggestion.
    pub fn push(&mut self, suggestion: String) {
        if self.suggestions.len() < self.max_suggestions && self.seen.insert(suggestion.clone()) {
            self.suggestions.push(suggestion);
        }
    }

    pub fn accepts(&mut self, candidate: &str) -> bool {
        self.cost += 1;
        (self.accept)(candidate)
    }

    pub fn into_suggestions(self) -> Vec<String> {
        self.suggestions
    }
}

/// Replacement-table substitutions (`REP`).
pub fn replacements(word: &str, table: &[Replacement], status: &mut SuggestionStatus<'_>) {
    for rep in table.iter().filter(|r| !r.from.is_empty()) {
        for (idx, _) in word.match_indices(rep.from.as_str()) {
            if (rep.at_start && idx != 0) || (rep.at_end && idx + rep.from.len() != word.len()) {
                continue;
            }
            let candidate = format!("{}{}{}", &word[..idx], rep.to, &word[idx + rep.from.len()..]);
            if candidate.contains(' ') {
                offer_phrase(&candidate, status);
            } else {
                status.offer(candidate);
            }
        }
    }
}

/// Multi-word replacements are kept only if every part is correct.
fn offer_phrase(candidate: &str, status: &mut SuggestionStatus<'_>) {
    if status.should_abort() {
        return;
    }
    if candidate.split(' ').all(|part| !part.is_empty() && status.accepts(part)) {
        status.push(candidate.to_string());
    }
}

/// Neighbouring keys on the same keyboard row (`KEY`).
pub fn keyboard(word: &[char], rows: &[String], status: &mut SuggestionStatus<'_>) {
    for (i, &c) in word.iter().enumerate() {
        for row in rows {
            let row: Vec<char> = row.chars().collect();
            for (pos, _) in row.iter().enumerate().filter(|(_, k)| **k == c) {
                let neighbours = [pos.checked_sub(1), Some(pos + 1)];
                for near in neighbours.into_iter().flatten().filter_map(|p| row.get(p)) {
                    let mut candidate = word.to_vec();
                    candidate[i] = *near;
                    status.offer(candidate.into_iter().collect());
                }
            }
        }
    }
}

/// Adjacent transpositions.
pub fn swap(word: &[char], status: &mut SuggestionStatus<'_>) {
    for i in 1..word.len() {
        if word[i - 1] == word[i] {
            continue;
        }
        let mut candidate = word.to_vec();
        candidate.swap(i - 1, i);
        status.offer(candidate.into_iter().collect());
    }
}

/// Single-character deletions.
pub fn delete(word: &[char], status: &mut SuggestionStatus<'_>) {
    if word.len() < 2 {
        return;
    }
    for i in 0..word.len() {
        if i > 0 && word[i] == word[i - 1] {
            continue;
        }
        let candidate: String = word[..i].iter().chain(&word[i + 1..]).collect();
        status.offer(candidate);
    }
}

/// Single-character insertions from the `TRY` set.
pub fn insert(word: &[char], try_chars: &[char], status: &mut SuggestionStatus<'_>) {
    for &c in try_chars {
        for i in 0..=word.len() {
            let candidate: String = word[..i]
                .iter()
                .chain(std::iter::once(&c))
                .chain(&word[i..])
                .collect();
            status.offer(candidate);
        }
    }
}

/// Single-character substitutions from the `TRY` set.
pub fn substitute(word: &[char], try_chars: &[char], status: &mut SuggestionStatus<'_>) {
    for &c in try_chars {
        for i in 0..word.len() {
            if word[i] == c {
                continue;
            }
            let mut candidate = word.to_vec();
            candidate[i] = c;
            status.offer(candidate.into_iter().collect());
        }
    }
}

/// Two correct words written together: offered as `a b` and `a-b`.
pub fn split(word: &[char], status: &mut SuggestionStatus<'_>) {
    for i in 1..word.len() {
        if status.should_abort() {
            return;
        }
        let left: String = word[..i].iter().collect();
        let right: String = word[i..].iter().collect();
        if status.accepts(&left) && status.accepts(&right) {
            status.push(format!("{left} {right}"));
            status.push(format!("{left}-{right}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn known(words: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |w| words.contains(&w)
    }

    #[test]
    fn status_caps_and_deduplicates() {
        let accept = known(&["a", "b", "c"]);
        let mut status = SuggestionStatus::new(&accept, 2);
        status.offer("a".to_string());
        status.offer("a".to_string());
        status.offer("x".to_string());
        assert!(!status.should_abort());
        status.offer("b".to_string());
        assert!(status.should_abort());
        status.offer("c".to_string());
        assert_eq!(status.into_suggestions(), vec!["a", "b"]);
    }

    #[test]
    fn swap_and_delete() {
        let accept = known(&["form", "from"]);
        let mut status = SuggestionStatus::new(&accept, 10);
        swap(&chars("fomr"), &mut status);
        delete(&chars("froom"), &mut status);
        assert_eq!(status.into_suggestions(), vec!["form", "from"]);
    }

    #[test]
    fn try_insert_and_substitute() {
        let accept = known(&["cat", "cart"]);
        let try_chars = chars("rt");
        let mut status = SuggestionStatus::new(&accept, 10);
        insert(&chars("cat"), &try_chars, &mut status);
        substitute(&chars("cax"), &try_chars, &mut status);
        assert_eq!(status.into_suggestions(), vec!["cart", "cat"]);
    }

    #[test]
    fn keyboard_neighbours() {
        let accept = known(&["test"]);
        let rows = vec!["qwertyuiop".to_string()];
        let mut status = SuggestionStatus::new(&accept, 10);
        keyboard(&chars("twst"), &rows, &mut status);
        assert_eq!(status.into_suggestions(), vec!["test"]);
    }

    #[test]
    fn replacement_table_with_anchors_and_phrases() {
        let accept = known(&["phone", "a", "lot"]);
        let table = vec![
            Replacement {
                from: "f".to_string(),
                to: "ph".to_string(),
                at_start: false,
                at_end: false,
            },
            Replacement {
                from: "alot".to_string(),
                to: "a lot".to_string(),
                at_start: true,
                at_end: true,
            },
        ];
        let mut status = SuggestionStatus::new(&accept, 10);
        replacements("fone", &table, &mut status);
        replacements("alot", &table, &mut status);
        assert_eq!(status.into_suggestions(), vec!["phone", "a lot"]);
    }

    #[test]
    fn split_offers_space_and_dash() {
        let accept = known(&["co", "lour"]);
        let mut status = SuggestionStatus::new(&accept, 10);
        split(&chars("colour"), &mut status);
        assert_eq!(status.into_suggestions(), vec!["co lour", "co-lour"]);
    }
}
