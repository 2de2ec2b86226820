//! Hunspell-format dictionary engine.
//!
//! `Dictionary` loads an affix file and a word list in the Hunspell text
//! formats and implements every `Engine` operation over them: affix-aware
//! lookup, edit-distance suggestions, morphological analysis, stemming,
//! generation by example, and runtime word-list edits.
//!
//! Compounding and two-level affix stripping are not supported.

mod affix;
mod suggest;
mod words;

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DictionaryPaths;
use crate::engine::Engine;
use crate::error::{EngineError, InitError};

use self::affix::{AffixFile, AffixRule, Encoding};
use self::suggest::SuggestionStatus;
use self::words::{WordEntry, WordTable};

/// Words longer than this (in characters) are reported incorrect and get no
/// suggestions.
pub const MAX_WORD_LEN: usize = 100;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 15;

/// Maximum number of extra word lists attached with `add_dictionary`.
pub const MAX_EXTRA_DICTIONARIES: usize = 20;

/// One way a surface form decomposes into a stored root.
struct Derivation<'a> {
    root: String,
    entry: &'a WordEntry,
    prefix: Option<&'a AffixRule>,
    suffix: Option<&'a AffixRule>,
}

impl Derivation<'_> {
    fn stem(&self) -> &str {
        self.entry.stem_field().unwrap_or(&self.root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Casing {
    Lower,
    Capitalized,
    Upper,
    Mixed,
}

fn casing(word: &str) -> Casing {
    let upper = word.chars().filter(|c| c.is_uppercase()).count();
    let lower = word.chars().filter(|c| c.is_lowercase()).count();
    match (upper, lower) {
        (0, _) => Casing::Lower,
        (_, 0) => Casing::Upper,
        (1, _) if word.chars().next().is_some_and(char::is_uppercase) => Casing::Capitalized,
        _ => Casing::Mixed,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Spell-checking dictionary loaded from Hunspell `.aff` and `.dic` files.
#[derive(Debug, Clone)]
pub struct Dictionary {
    affix: AffixFile,
    words: WordTable,
    extra_dictionaries: usize,
}

impl Dictionary {
    /// Loads a dictionary from an affix/dictionary file pair.
    ///
    /// # Errors
    ///
    /// Returns `InitError` if either file cannot be read or parsed.
    pub fn open(paths: &DictionaryPaths) -> Result<Self, InitError> {
        let raw_aff = fs::read(&paths.aff).map_err(|source| InitError::AffixUnreadable {
            path: paths.aff.clone(),
            source,
        })?;
        let raw_dic = fs::read(&paths.dic).map_err(|source| InitError::DictionaryUnreadable {
            path: paths.dic.clone(),
            source,
        })?;

        let encoding = Encoding::sniff(&raw_aff);
        let dictionary = Self::build(
            &encoding.decode(&raw_aff),
            &encoding.decode(&raw_dic),
            encoding,
            paths,
        )?;
        tracing::debug!(
            aff = %paths.aff.display(),
            dic = %paths.dic.display(),
            words = dictionary.words.len(),
            "dictionary loaded"
        );
        Ok(dictionary)
    }

    /// Builds a dictionary from affix and word-list text already in memory.
    ///
    /// # Errors
    ///
    /// Returns `InitError` if either text fails to parse.
    pub fn from_sources(aff: &str, dic: &str) -> Result<Self, InitError> {
        let inline = DictionaryPaths::new("<inline>.aff", "<inline>.dic");
        Self::build(aff, dic, Encoding::Utf8, &inline)
    }

    fn build(
        aff: &str,
        dic: &str,
        encoding: Encoding,
        paths: &DictionaryPaths,
    ) -> Result<Self, InitError> {
        let affix = AffixFile::parse(aff, encoding).map_err(|e| InitError::MalformedAffix {
            path: paths.aff.clone(),
            line: e.line,
            reason: e.reason,
        })?;
        let mut words = WordTable::default();
        words
            .load(dic, affix.flag_mode)
            .map_err(|(line, reason)| InitError::MalformedDictionary {
                path: paths.dic.clone(),
                line,
                reason,
            })?;
        Ok(Self {
            affix,
            words,
            extra_dictionaries: 0,
        })
    }

    /// Number of distinct stored words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn is_forbidden(&self, word: &str) -> bool {
        self.words.get(word).iter().any(|e| e.has(self.affix.forbidden))
    }

    /// Every decomposition of `word` exactly as written.
    fn decompose(&self, word: &str) -> Vec<Derivation<'_>> {
        let aff = &self.affix;
        let usable = |entry: &WordEntry| {
            !entry.has(aff.forbidden) && !entry.has(aff.only_in_compound)
        };
        let mut found = Vec::new();

        for entry in self.words.get(word) {
            if usable(entry) && !entry.has(aff.need_affix) {
                found.push(Derivation {
                    root: word.to_string(),
                    entry,
                    prefix: None,
                    suffix: None,
                });
            }
        }

        for rule in &aff.suffixes {
            let Some(root) = rule.strip_from(word) else { continue };
            for entry in self.words.get(&root) {
                if usable(entry) && entry.has(Some(rule.flag)) {
                    found.push(Derivation {
                        root: root.clone(),
                        entry,
                        prefix: None,
                        suffix: Some(rule),
                    });
                }
            }
        }

        for rule in &aff.prefixes {
            let Some(stripped) = rule.strip_from(word) else { continue };
            for entry in self.words.get(&stripped) {
                if usable(entry) && entry.has(Some(rule.flag)) {
                    found.push(Derivation {
                        root: stripped.clone(),
                        entry,
                        prefix: Some(rule),
                        suffix: None,
                    });
                }
            }

            if !rule.cross_product {
                continue;
            }
            for suffix in aff.suffixes.iter().filter(|s| s.cross_product) {
                let Some(root) = suffix.strip_from(&stripped) else { continue };
                for entry in self.words.get(&root) {
                    if usable(entry) && entry.has(Some(rule.flag)) && entry.has(Some(suffix.flag)) {
                        found.push(Derivation {
                            root: root.clone(),
                            entry,
                            prefix: Some(rule),
                            suffix: Some(suffix),
                        });
                    }
                }
            }
        }

        found
    }

    /// Decompositions of `word`, also trying case-folded forms. Folded forms
    /// never match roots flagged `KEEPCASE`.
    fn derive(&self, word: &str) -> Vec<Derivation<'_>> {
        if self.is_forbidden(word) {
            return Vec::new();
        }
        let mut found = self.decompose(word);

        let folded = match casing(word) {
            Casing::Lower | Casing::Mixed => Vec::new(),
            Casing::Capitalized => vec![word.to_lowercase()],
            Casing::Upper => {
                let lower = word.to_lowercase();
                let title = capitalize(&lower);
                vec![lower, title]
            }
        };
        for variant in folded {
            if variant == word || self.is_forbidden(&variant) {
                continue;
            }
            found.extend(
                self.decompose(&variant)
                    .into_iter()
                    .filter(|d| !d.entry.has(self.affix.keep_case)),
            );
        }
        found
    }

    fn is_correct(&self, word: &str) -> bool {
        if !self.derive(word).is_empty() {
            return true;
        }
        // A trailing period is allowed for abbreviations.
        word.strip_suffix('.')
            .is_some_and(|bare| !bare.is_empty() && !self.derive(bare).is_empty())
    }

    /// Correct and not flagged `NOSUGGEST`.
    fn is_suggestable(&self, word: &str) -> bool {
        self.derive(word)
            .iter()
            .any(|d| !d.entry.has(self.affix.no_suggest))
    }

    /// Applies the affix classes used by `pattern` to `root`. Any rule of the
    /// same class may apply, since the root's ending selects the rule.
    fn generate_from(&self, root: &str, entry: &WordEntry, pattern: &Derivation<'_>) -> Option<String> {
        let apply = |rules: &[AffixRule], class: Option<&AffixRule>, word: String| match class {
            Some(class) if entry.has(Some(class.flag)) => rules
                .iter()
                .filter(|r| r.flag == class.flag)
                .find_map(|r| r.apply(&word)),
            Some(_) => None,
            None => Some(word),
        };
        let with_suffix = apply(&self.affix.suffixes, pattern.suffix, root.to_string())?;
        apply(&self.affix.prefixes, pattern.prefix, with_suffix)
    }
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.contains(&value) {
        out.push(value);
    }
}

impl Engine for Dictionary {
    fn spell(&self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() {
            return true;
        }
        if word.chars().count() > MAX_WORD_LEN {
            return false;
        }
        // Numbers, symbols and emoji are not subject to checking.
        if !word.chars().any(char::is_alphabetic) {
            return true;
        }
        self.is_correct(word)
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        let word = word.trim();
        if word.is_empty() || word.chars().count() > MAX_WORD_LEN {
            return Vec::new();
        }

        let word_casing = casing(word);
        let lower = word.to_lowercase();
        let accept = |candidate: &str| self.is_suggestable(candidate);
        let mut status = SuggestionStatus::new(&accept, MAX_SUGGESTIONS);

        for variant in [lower.clone(), capitalize(&lower), word.to_uppercase()] {
            if variant != word {
                status.offer(variant);
            }
        }

        let base = match word_casing {
            Casing::Capitalized | Casing::Upper => lower.as_str(),
            Casing::Lower | Casing::Mixed => word,
        };
        let chars: Vec<char> = base.chars().collect();
        let try_chars: Vec<char> = self.affix.try_chars.chars().collect();

        suggest::replacements(base, &self.affix.replacements, &mut status);
        suggest::keyboard(&chars, &self.affix.keyboard, &mut status);
        suggest::swap(&chars, &mut status);
        suggest::delete(&chars, &mut status);
        suggest::insert(&chars, &try_chars, &mut status);
        suggest::substitute(&chars, &try_chars, &mut status);
        suggest::split(&chars, &mut status);

        let mut out = Vec::new();
        for suggestion in status.into_suggestions() {
            let restored = match word_casing {
                Casing::Capitalized if suggestion.chars().all(|c| !c.is_uppercase()) => {
                    capitalize(&suggestion)
                }
                Casing::Upper if suggestion.chars().all(|c| !c.is_uppercase()) => {
                    suggestion.to_uppercase()
                }
                _ => suggestion,
            };
            if restored != word {
                push_unique(&mut out, restored);
            }
        }
        out
    }

    fn analyze(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        for d in self.derive(word.trim()) {
            let mut fields = Vec::new();
            if d.entry.stem_field().is_none() {
                fields.push(format!("st:{}", d.root));
            }
            fields.extend(d.entry.morph.iter().cloned());
            for rule in [d.prefix, d.suffix].into_iter().flatten() {
                fields.extend(rule.morph.iter().cloned());
            }
            push_unique(&mut out, fields.join(" "));
        }
        out
    }

    fn stem(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        for d in self.derive(word.trim()) {
            push_unique(&mut out, d.stem().to_string());
        }
        out
    }

    fn generate(&self, word: &str, example: &str) -> Vec<String> {
        let patterns = self.derive(example.trim());
        let mut out = Vec::new();
        for root in self.derive(word.trim()) {
            for pattern in &patterns {
                if let Some(form) = self.generate_from(&root.root, root.entry, pattern) {
                    push_unique(&mut out, form);
                }
            }
        }
        out
    }

    fn word_characters(&self) -> Option<&str> {
        Some(self.affix.word_chars.as_str())
    }

    fn add(&mut self, word: &str) -> Result<(), EngineError> {
        let malformed = |reason: String| EngineError::Malformed {
            entry: word.to_string(),
            reason,
        };
        let (bare, entry) = words::parse_line(word, self.affix.flag_mode)
            .map_err(malformed)?
            .ok_or_else(|| malformed("empty word".to_string()))?;
        tracing::trace!(word = %bare, "word added");
        self.words.insert(bare, entry);
        Ok(())
    }

    fn add_with_affix(&mut self, word: &str, example: &str) -> Result<(), EngineError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(EngineError::Malformed {
                entry: word.to_string(),
                reason: "empty word".to_string(),
            });
        }
        let example = example.trim();
        let mut source = self.words.get(example);
        if source.is_empty() {
            source = self.words.get(&example.to_lowercase());
        }

        let mut flags: Vec<_> = source.iter().flat_map(|e| e.flags.iter().copied()).collect();
        flags.sort_unstable();
        flags.dedup();
        if source.is_empty() {
            tracing::debug!(word, example, "example word unknown; adding without affixes");
        }
        self.words.insert(
            word.to_string(),
            WordEntry {
                flags,
                morph: Vec::new(),
            },
        );
        Ok(())
    }

    fn remove(&mut self, word: &str) -> Result<(), EngineError> {
        let removed = self.words.remove(word.trim());
        tracing::trace!(word, removed, "word removed");
        Ok(())
    }

    fn add_dictionary(&mut self, path: &Path) -> Result<(), EngineError> {
        if self.extra_dictionaries >= MAX_EXTRA_DICTIONARIES {
            return Err(EngineError::TooManyDictionaries {
                limit: MAX_EXTRA_DICTIONARIES,
            });
        }
        let raw = fs::read(path).map_err(|source| EngineError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let text = self.affix.encoding.decode(&raw);
        let loaded = self
            .words
            .load(&text, self.affix.flag_mode)
            .map_err(|(line, reason)| EngineError::Malformed {
                entry: format!("{}:{line}", path.display()),
                reason,
            })?;
        self.extra_dictionaries += 1;
        tracing::debug!(path = %path.display(), words = loaded, "dictionary attached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFF: &str = "\
SET UTF-8
TRY esianrtolcdugmphbyfvkwz-
WORDCHARS 0123456789'
KEY qwertyuiop|asdfghjkl|zxcvbnm
REP 1
REP f ph
NOSUGGEST !
FORBIDDENWORD X
KEEPCASE K
NEEDAFFIX N

PFX U Y 1
PFX U 0 un . ds:un

SFX S Y 3
SFX S y ies [^aeiou]y is:plural
SFX S 0 s [aeiou]y is:plural
SFX S 0 s [^y] is:plural

SFX D Y 2
SFX D 0 ed [^y] is:past
SFX D y ied [^aeiou]y is:past
";

    const DIC: &str = "\
12
color/S po:noun
city/S po:noun
lock/UD po:verb
do/U
phone/S
co
lour
DVD/K
bullshit/!
teh/X
kitten/S
tail/SN
";

    fn dictionary() -> Dictionary {
        Dictionary::from_sources(AFF, DIC).unwrap()
    }

    #[test]
    fn affixed_forms_are_correct() {
        let dict = dictionary();
        assert!(dict.spell("color"));
        assert!(dict.spell("colors"));
        assert!(dict.spell("cities"));
        assert!(!dict.spell("citys"));
        assert!(dict.spell("unlock"));
        assert!(dict.spell("unlocked"));
        assert!(dict.spell("undo"));
        assert!(!dict.spell("colour"));
    }

    #[test]
    fn casing_rules() {
        let dict = dictionary();
        assert!(dict.spell("Color"));
        assert!(dict.spell("COLOR"));
        assert!(!dict.spell("cOLOR"));
        assert!(dict.spell("DVD"));
        assert!(!dict.spell("dvd"));
        assert!(!dict.spell("Dvd"));
    }

    #[test]
    fn flags_restrict_lookup() {
        let dict = dictionary();
        assert!(!dict.spell("teh"));
        assert!(dict.spell("bullshit"));
        assert!(!dict.spell("tail"));
        assert!(dict.spell("tails"));
    }

    #[test]
    fn unchecked_inputs() {
        let dict = dictionary();
        assert!(dict.spell(""));
        assert!(dict.spell("   "));
        assert!(dict.spell("1234"));
        assert!(dict.spell("\u{1f600}"));
        assert!(dict.spell("color."));
        assert!(!dict.spell(&"a".repeat(MAX_WORD_LEN + 1)));
    }

    #[test]
    fn suggestions_rank_edits_before_splits() {
        let dict = dictionary();
        let suggestions = dict.suggest("colour");
        assert_eq!(&suggestions[..3], ["color", "co lour", "co-lour"]);
    }

    #[test]
    fn suggestions_restore_case_and_skip_nosuggest() {
        let dict = dictionary();
        assert_eq!(dict.suggest("Colr")[0], "Color");
        assert!(dict.suggest("fone").contains(&"phone".to_string()));
        assert!(!dict.suggest("bullshitt").contains(&"bullshit".to_string()));
        assert!(dict.suggest(&"a".repeat(MAX_WORD_LEN + 1)).is_empty());
    }

    #[test]
    fn analysis_and_stems() {
        let dict = dictionary();
        assert_eq!(dict.analyze("cities"), vec!["st:city po:noun is:plural"]);
        assert_eq!(dict.stem("cities"), vec!["city"]);
        assert_eq!(dict.stem("unlocked"), vec!["lock"]);
        assert!(dict.analyze("zzz").is_empty());
        assert!(dict.stem("zzz").is_empty());
    }

    #[test]
    fn generate_by_example() {
        let dict = dictionary();
        assert_eq!(dict.generate("city", "colors"), vec!["cities"]);
        assert_eq!(dict.generate("kitten", "tails"), vec!["kittens"]);
        assert!(dict.generate("zzz", "colors").is_empty());
    }

    #[test]
    fn runtime_edits() {
        let mut dict = dictionary();
        assert!(!dict.spell("foo"));
        dict.add("foo").unwrap();
        assert!(dict.spell("foo"));
        dict.remove("foo").unwrap();
        assert!(!dict.spell("foo"));

        dict.add_with_affix("colour", "color").unwrap();
        assert!(dict.spell("colours"));
        assert!(dict.add("").is_err());
    }

    #[test]
    fn word_characters_come_from_affix() {
        assert_eq!(dictionary().word_characters(), Some("0123456789'"));
    }

    #[test]
    fn malformed_sources_are_init_errors() {
        let err = Dictionary::from_sources("SFX A Y lots\n", "").unwrap_err();
        assert!(matches!(err, InitError::MalformedAffix { line: 1, .. }));

        let err = Dictionary::from_sources("FLAG long\n", "1\nword/ABC\n").unwrap_err();
        assert!(matches!(err, InitError::MalformedDictionary { line: 2, .. }));
    }
}
