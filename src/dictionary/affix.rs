//! Affix file parsing.
//!
//! Supports the subset of the Hunspell `.aff` format the engine uses: the
//! encoding and flag directives, suggestion tables (`TRY`, `KEY`, `REP`),
//! word flags (`NOSUGGEST`, `FORBIDDENWORD`, `NEEDAFFIX`, `KEEPCASE`,
//! `ONLYINCOMPOUND`) and `PFX`/`SFX` rule tables. Unknown directives are
//! ignored.

use regex::Regex;

/// Numeric flag value; the textual form depends on `FlagMode`.
pub type Flag = u64;

/// Character encoding declared by `SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    /// Finds the `SET` directive in raw affix bytes.
    #[must_use]
    pub fn sniff(raw: &[u8]) -> Self {
        for line in raw.split(|b| *b == b'\n') {
            let line = String::from_utf8_lossy(line);
            let mut parts = line.split_whitespace();
            if parts.next() == Some("SET") {
                return match parts.next().map(str::to_ascii_uppercase).as_deref() {
                    Some("ISO8859-1" | "ISO-8859-1" | "LATIN1") => Self::Latin1,
                    _ => Self::Utf8,
                };
            }
        }
        Self::Utf8
    }

    /// Decodes raw file contents.
    #[must_use]
    pub fn decode(self, raw: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(raw).into_owned(),
            Self::Latin1 => raw.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Textual encoding of flags, set by `FLAG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagMode {
    /// One character per flag.
    #[default]
    Char,
    /// Two characters per flag.
    Long,
    /// Comma-separated decimal numbers.
    Numeric,
}

impl FlagMode {
    /// Parses a flag string such as `SM`, `AaBb` or `101,102`.
    pub fn parse_flags(self, s: &str) -> Result<Vec<Flag>, String> {
        let mut flags = match self {
            Self::Char => s.chars().map(u64::from).collect(),
            Self::Long => {
                let chars: Vec<char> = s.chars().collect();
                if chars.len() % 2 != 0 {
                    return Err(format!("odd number of characters in long flags '{s}'"));
                }
                chars
                    .chunks(2)
                    .map(|pair| (u64::from(pair[0]) << 32) | u64::from(pair[1]))
                    .collect()
            }
            Self::Numeric => s
                .split(',')
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.trim()
                        .parse::<u16>()
                        .map(u64::from)
                        .map_err(|_| format!("invalid numeric flag '{part}'"))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        flags.sort_unstable();
        flags.dedup();
        Ok(flags)
    }

    fn parse_one(self, s: &str) -> Result<Flag, String> {
        match self.parse_flags(s)?.as_slice() {
            [flag] => Ok(*flag),
            _ => Err(format!("expected a single flag, got '{s}'")),
        }
    }
}

/// Whether a rule adds to the front or the back of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffixKind {
    Prefix,
    Suffix,
}

/// One `PFX`/`SFX` rule line.
#[derive(Debug, Clone)]
pub struct AffixRule {
    pub kind: AffixKind,
    pub flag: Flag,
    pub cross_product: bool,
    pub strip: String,
    pub append: String,
    pub morph: Vec<String>,
    condition: Option<Regex>,
}

impl AffixRule {
    fn condition_holds(&self, root: &str) -> bool {
        self.condition.as_ref().map_or(true, |re| re.is_match(root))
    }

    /// Recovers the root this rule would have derived `word` from.
    #[must_use]
    pub fn strip_from(&self, word: &str) -> Option<String> {
        let root = match self.kind {
            AffixKind::Suffix => {
                let base = word.strip_suffix(self.append.as_str())?;
                if base.is_empty() && self.strip.is_empty() {
                    return None;
                }
                format!("{base}{}", self.strip)
            }
            AffixKind::Prefix => {
                let base = word.strip_prefix(self.append.as_str())?;
                if base.is_empty() && self.strip.is_empty() {
                    return None;
                }
                format!("{}{base}", self.strip)
            }
        };
        self.condition_holds(&root).then_some(root)
    }

    /// Applies the rule to `root`, if its condition allows.
    #[must_use]
    pub fn apply(&self, root: &str) -> Option<String> {
        if !self.condition_holds(root) {
            return None;
        }
        let derived = match self.kind {
            AffixKind::Suffix => {
                let base = root.strip_suffix(self.strip.as_str())?;
                format!("{base}{}", self.append)
            }
            AffixKind::Prefix => {
                let base = root.strip_prefix(self.strip.as_str())?;
                format!("{}{base}", self.append)
            }
        };
        (!derived.is_empty()).then_some(derived)
    }
}

/// Converts a Hunspell condition (`.`, literals, `[abc]`, `[^abc]`) into an
/// anchored regex. `None` means the condition always holds.
fn compile_condition(kind: AffixKind, condition: &str) -> Result<Option<Regex>, String> {
    if condition == "." {
        return Ok(None);
    }

    let mut pattern = String::new();
    let mut chars = condition.chars();
    while let Some(c) = chars.next() {
        match c {
            '.' => pattern.push('.'),
            '[' => {
                pattern.push('[');
                let mut closed = false;
                let mut first = true;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    if inner == '^' && first {
                        pattern.push('^');
                    } else {
                        pattern.push_str(&regex::escape(&inner.to_string()));
                    }
                    first = false;
                }
                if !closed {
                    return Err(format!("unterminated '[' in condition '{condition}'"));
                }
                pattern.push(']');
            }
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }

    let anchored = match kind {
        AffixKind::Suffix => format!("(?:{pattern})$"),
        AffixKind::Prefix => format!("^(?:{pattern})"),
    };
    Regex::new(&anchored)
        .map(Some)
        .map_err(|e| format!("invalid condition '{condition}': {e}"))
}

/// A replacement-table entry (`REP from to`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
    pub at_start: bool,
    pub at_end: bool,
}

/// Parse failure with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

struct OpenTable {
    kind: AffixKind,
    flag: Flag,
    cross_product: bool,
    remaining: usize,
}

/// Parsed affix file.
#[derive(Debug, Clone, Default)]
pub struct AffixFile {
    pub encoding: Encoding,
    pub flag_mode: FlagMode,
    pub try_chars: String,
    pub word_chars: String,
    pub keyboard: Vec<String>,
    pub replacements: Vec<Replacement>,
    pub no_suggest: Option<Flag>,
    pub forbidden: Option<Flag>,
    pub need_affix: Option<Flag>,
    pub keep_case: Option<Flag>,
    pub only_in_compound: Option<Flag>,
    pub prefixes: Vec<AffixRule>,
    pub suffixes: Vec<AffixRule>,
}

impl AffixFile {
    /// Parses decoded affix text.
    pub fn parse(text: &str, encoding: Encoding) -> Result<Self, ParseError> {
        let mut aff = Self {
            encoding,
            ..Self::default()
        };
        let mut open: Option<OpenTable> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let err = |reason: String| ParseError { line, reason };
            let parts: Vec<&str> = raw.split_whitespace().collect();
            let Some(&directive) = parts.first() else {
                continue;
            };
            if directive.starts_with('#') {
                continue;
            }

            match directive {
                "FLAG" => {
                    aff.flag_mode = match parts.get(1).copied() {
                        Some("long") => FlagMode::Long,
                        Some("num") => FlagMode::Numeric,
                        // UTF-8 flags are single characters once decoded.
                        Some("UTF-8" | "char") | None => FlagMode::Char,
                        Some(other) => return Err(err(format!("unknown FLAG type '{other}'"))),
                    };
                }
                "TRY" => aff.try_chars = parts.get(1).copied().unwrap_or_default().to_string(),
                "WORDCHARS" => {
                    aff.word_chars = parts.get(1).copied().unwrap_or_default().to_string();
                }
                "KEY" => {
                    aff.keyboard = parts
                        .get(1)
                        .map(|k| k.split('|').map(str::to_string).collect())
                        .unwrap_or_default();
                }
                "REP" => {
                    // `REP <count>` headers are skipped; entries carry two fields.
                    if let [_, from, to, ..] = parts.as_slice() {
                        aff.replacements.push(parse_replacement(from, to));
                    }
                }
                "NOSUGGEST" | "FORBIDDENWORD" | "NEEDAFFIX" | "PSEUDOROOT" | "KEEPCASE"
                | "ONLYINCOMPOUND" => {
                    let value = parts
                        .get(1)
                        .ok_or_else(|| err(format!("{directive} needs a flag")))?;
                    let flag = aff.flag_mode.parse_one(value).map_err(err)?;
                    let slot = match directive {
                        "NOSUGGEST" => &mut aff.no_suggest,
                        "FORBIDDENWORD" => &mut aff.forbidden,
                        "NEEDAFFIX" | "PSEUDOROOT" => &mut aff.need_affix,
                        "KEEPCASE" => &mut aff.keep_case,
                        _ => &mut aff.only_in_compound,
                    };
                    *slot = Some(flag);
                }
                "PFX" | "SFX" => {
                    let kind = if directive == "PFX" {
                        AffixKind::Prefix
                    } else {
                        AffixKind::Suffix
                    };
                    let flag_text = parts
                        .get(1)
                        .ok_or_else(|| err(format!("{directive} needs a flag")))?;
                    let flag = aff.flag_mode.parse_one(flag_text).map_err(err)?;

                    let continues = open
                        .as_ref()
                        .is_some_and(|t| t.kind == kind && t.flag == flag && t.remaining > 0);
                    if continues {
                        let cross_product = open.as_ref().is_some_and(|t| t.cross_product);
                        let rule = parse_rule(kind, flag, cross_product, &parts, aff.flag_mode)
                            .map_err(err)?;
                        if let Some(table) = open.as_mut() {
                            table.remaining -= 1;
                        }
                        match kind {
                            AffixKind::Prefix => aff.prefixes.push(rule),
                            AffixKind::Suffix => aff.suffixes.push(rule),
                        }
                    } else {
                        let [_, _, cross, count, ..] = parts.as_slice() else {
                            return Err(err(format!("{directive} header needs cross product and count")));
                        };
                        let remaining = count
                            .parse::<usize>()
                            .map_err(|_| err(format!("invalid rule count '{count}'")))?;
                        open = Some(OpenTable {
                            kind,
                            flag,
                            cross_product: *cross == "Y",
                            remaining,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(aff)
    }
}

fn parse_replacement(from: &str, to: &str) -> Replacement {
    let at_start = from.starts_with('^');
    let at_end = from.ends_with('$') && from.len() > 1;
    let mut from = from.trim_start_matches('^');
    if at_end {
        from = &from[..from.len() - 1];
    }
    Replacement {
        from: from.replace('_', " "),
        to: to.replace('_', " "),
        at_start,
        at_end,
    }
}

fn parse_rule(
    kind: AffixKind,
    flag: Flag,
    cross_product: bool,
    parts: &[&str],
    mode: FlagMode,
) -> Result<AffixRule, String> {
    let [_, _, strip, append, rest @ ..] = parts else {
        return Err("affix rule needs strip and append fields".to_string());
    };
    let strip = if *strip == "0" { String::new() } else { (*strip).to_string() };
    // Continuation classes are validated but not applied.
    let append = match append.split_once('/') {
        Some((text, flags)) => {
            mode.parse_flags(flags)?;
            text
        }
        None => *append,
    };
    let append = if append == "0" { String::new() } else { append.to_string() };
    let condition = rest.first().copied().unwrap_or(".");

    Ok(AffixRule {
        kind,
        flag,
        cross_product,
        strip,
        append,
        morph: rest.iter().skip(1).map(|s| (*s).to_string()).collect(),
        condition: compile_condition(kind, condition)?,
    })
}
