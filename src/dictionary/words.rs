//! Dictionary word table.

use std::collections::HashMap;

use super::affix::{Flag, FlagMode};

/// One homonym of a stored word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordEntry {
    pub flags: Vec<Flag>,
    pub morph: Vec<String>,
}

impl WordEntry {
    pub fn has(&self, flag: Option<Flag>) -> bool {
        flag.is_some_and(|f| self.flags.binary_search(&f).is_ok())
    }

    /// Stem recorded with an `st:` field, if any.
    pub fn stem_field(&self) -> Option<&str> {
        self.morph.iter().find_map(|m| m.strip_prefix("st:"))
    }
}

/// Splits a `.dic` line into the word and its entry.
///
/// Format: `word[/FLAGS] [morph fields...]`. `\/` escapes a slash inside the
/// word. Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str, mode: FlagMode) -> Result<Option<(String, WordEntry)>, String> {
    let mut fields = line.split_whitespace();
    let Some(head) = fields.next() else {
        return Ok(None);
    };

    let mut word = String::new();
    let mut flags = "";
    let mut chars = head.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|(_, next)| *next == '/') => {
                word.push('/');
                chars.next();
            }
            '/' => {
                flags = &head[idx + 1..];
                break;
            }
            other => word.push(other),
        }
    }

    if word.is_empty() {
        return Err(format!("missing word in '{line}'"));
    }

    Ok(Some((
        word,
        WordEntry {
            flags: mode.parse_flags(flags)?,
            morph: fields.map(str::to_string).collect(),
        },
    )))
}

/// Words and their homonyms.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    entries: HashMap<String, Vec<WordEntry>>,
}

impl WordTable {
    pub fn get(&self, word: &str) -> &[WordEntry] {
        self.entries.get(word).map_or(&[], Vec::as_slice)
    }

    pub fn insert(&mut self, word: String, entry: WordEntry) {
        let homonyms = self.entries.entry(word).or_default();
        if !homonyms.contains(&entry) {
            homonyms.push(entry);
        }
    }

    /// Removes every homonym of `word`, returning how many there were.
    pub fn remove(&mut self, word: &str) -> usize {
        self.entries.remove(word).map_or(0, |homonyms| homonyms.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Loads `.dic` text. The optional leading count line is skipped, as are
    /// tab-indented comment lines. Errors carry the 1-based line number.
    ///
    /// Every line is parsed before any is inserted, so a malformed line
    /// leaves the table unchanged.
    pub fn load(&mut self, text: &str, mode: FlagMode) -> Result<usize, (usize, String)> {
        let mut pending = Vec::new();
        let mut seen_content = false;
        for (idx, line) in text.lines().enumerate() {
            if line.starts_with('\t') || line.trim().is_empty() {
                continue;
            }
            if !seen_content {
                seen_content = true;
                if line.trim().parse::<usize>().is_ok() {
                    continue;
                }
            }
            if let Some(parsed) = parse_line(line, mode).map_err(|e| (idx + 1, e))? {
                pending.push(parsed);
            }
        }
        let loaded = pending.len();
        for (word, entry) in pending {
            self.insert(word, entry);
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_morphology() {
        let (word, entry) = parse_line("city/SM po:noun", FlagMode::Char).unwrap().unwrap();
        assert_eq!(word, "city");
        assert!(entry.has(Some(u64::from('S'))));
        assert!(!entry.has(Some(u64::from('X'))));
        assert!(!entry.has(None));
        assert_eq!(entry.morph, vec!["po:noun".to_string()]);
    }

    #[test]
    fn escaped_slash_stays_in_word() {
        let (word, entry) = parse_line("km\\/h", FlagMode::Char).unwrap().unwrap();
        assert_eq!(word, "km/h");
        assert!(entry.flags.is_empty());
    }

    #[test]
    fn load_skips_count_line() {
        let mut table = WordTable::default();
        let loaded = table.load("3\nfoo\nbar/S\n\tcomment\nbar/S\n", FlagMode::Char).unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("bar").len(), 1);
        assert!(table.get("3").is_empty());
    }

    #[test]
    fn homonyms_are_kept_and_removed_together() {
        let mut table = WordTable::default();
        table.insert("lead".to_string(), WordEntry::default());
        table.insert(
            "lead".to_string(),
            WordEntry {
                flags: vec![1],
                morph: Vec::new(),
            },
        );
        assert_eq!(table.get("lead").len(), 2);
        assert_eq!(table.remove("lead"), 2);
        assert!(table.get("lead").is_empty());
    }

    #[test]
    fn malformed_line_reports_position() {
        let mut table = WordTable::default();
        let err = table.load("2\nok/Aa\nbad/Abc\n", FlagMode::Long).unwrap_err();
        assert_eq!(err.0, 3);
        assert!(table.get("ok").is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn stem_field() {
        let (_, entry) = parse_line("went po:verb st:go", FlagMode::Char).unwrap().unwrap();
        assert_eq!(entry.stem_field(), Some("go"));
    }
}
