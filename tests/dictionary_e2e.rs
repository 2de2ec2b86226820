use std::fs;
use std::path::PathBuf;

use spellguard::{DictionaryPaths, EngineError, InitError, SpellError, Speller, SpellerConfig};
use tempfile::TempDir;

const EN_AFF: &str = "\
SET UTF-8
TRY esianrtolcdugmphbyfvkwz'
WORDCHARS 0123456789'.-
KEY qwertyuiop|asdfghjkl|zxcvbnm
REP 2
REP f ph
REP ^alot$ a_lot
NOSUGGEST !
KEEPCASE K
FORBIDDENWORD X

PFX U Y 1
PFX U 0 un .

SFX S Y 3
SFX S y ies [^aeiou]y is:plural
SFX S 0 s [aeiou]y is:plural
SFX S 0 s [^y] is:plural

SFX D Y 2
SFX D 0 ed [^y] is:past
SFX D y ied [^aeiou]y is:past
";

const EN_DIC: &str = "\
14
color/S po:noun
colon/S po:noun
city/S po:noun
lock/UD po:verb
try/D po:verb
phone/S po:noun
a
lot/S
co
lour
DVD/K
bullshit/!
teh/X
kitten/S po:noun
";

struct Fixture {
    dir: TempDir,
    paths: DictionaryPaths,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let aff = dir.path().join("en_US.aff");
        let dic = dir.path().join("en_US.dic");
        fs::write(&aff, EN_AFF).unwrap();
        fs::write(&dic, EN_DIC).unwrap();
        Self {
            paths: DictionaryPaths::new(aff, dic),
            dir,
        }
    }

    fn extra(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn speller(&self) -> Speller {
        let config = SpellerConfig {
            workers: 2,
            ..SpellerConfig::default()
        };
        Speller::with_config(&self.paths, &config).unwrap()
    }
}

#[test]
fn spell_checks_roots_affixes_and_case() {
    let fixture = Fixture::new();
    let speller = fixture.speller();

    for word in ["color", "colors", "Color", "COLOR", "cities", "unlocked", "tried", "DVD", "bullshit"] {
        assert!(speller.spell(word).unwrap(), "{word} should be correct");
    }
    for word in ["colour", "citys", "dVd", "dvd", "teh", "unphone"] {
        assert!(!speller.spell(word).unwrap(), "{word} should be incorrect");
    }

    // Non-words pass; overlong words fail.
    assert!(speller.spell("").unwrap());
    assert!(speller.spell("1234").unwrap());
    assert!(speller.spell("\u{2600}").unwrap());
    assert!(!speller.spell(&"a".repeat(200)).unwrap());
}

#[test]
fn suggest_distinguishes_correct_from_unknown() {
    let fixture = Fixture::new();
    let speller = fixture.speller();

    assert_eq!(speller.suggest("color").unwrap(), None);

    let suggestions = speller.suggest("colour").unwrap().unwrap();
    assert_eq!(&suggestions[..3], ["color", "co lour", "co-lour"]);

    assert!(speller.suggest("fone").unwrap().unwrap().contains(&"phone".to_string()));
    assert!(speller.suggest("alot").unwrap().unwrap().contains(&"a lot".to_string()));
    assert!(!speller.suggest("bullshitt").unwrap().unwrap().contains(&"bullshit".to_string()));
    assert_eq!(speller.suggest("Colr").unwrap().unwrap()[0], "Color");

    assert_eq!(speller.suggest(&"a".repeat(200)).unwrap(), Some(Vec::new()));
}

#[test]
fn morphology() {
    let fixture = Fixture::new();
    let speller = fixture.speller();

    assert_eq!(speller.analyze("cities").unwrap(), vec!["st:city po:noun is:plural"]);
    assert_eq!(speller.stem("cities").unwrap(), vec!["city"]);
    assert_eq!(speller.stem("tried").unwrap(), vec!["try"]);
    assert!(speller.stem("xyzzy").unwrap().is_empty());

    assert_eq!(speller.generate("city", "kittens").unwrap(), vec!["cities"]);
    assert_eq!(speller.generate("lock", "tried").unwrap(), vec!["locked"]);
    assert!(speller.generate("xyzzy", "kittens").unwrap().is_empty());
}

#[test]
fn runtime_word_list_edits() {
    let fixture = Fixture::new();
    let speller = fixture.speller();

    assert!(!speller.spell("spellguard").unwrap());
    speller.add("spellguard").unwrap();
    assert!(speller.spell("spellguard").unwrap());
    speller.remove("spellguard").unwrap();
    assert!(!speller.spell("spellguard").unwrap());

    speller.add_with_affix("dolor", "color").unwrap();
    assert!(speller.spell("dolors").unwrap());

    speller.add_async("flagged/S").unwrap().join().unwrap();
    assert!(speller.spell_async("flaggeds").unwrap().join().unwrap());
}

#[test]
fn attached_dictionaries() {
    let fixture = Fixture::new();
    let speller = fixture.speller();

    let extra = fixture.extra("extra.dic", b"2\nfoobar/S\nbazqux\n");
    assert!(!speller.spell("foobars").unwrap());
    speller.add_dictionary(&extra).unwrap();
    assert!(speller.spell("foobars").unwrap());
    assert!(speller.spell("bazqux").unwrap());

    let missing = fixture.dir.path().join("missing.dic");
    let err = speller.add_dictionary(&missing).unwrap_err();
    assert!(matches!(err, SpellError::Engine(EngineError::Io { .. })));

    let err = speller.add_dictionary_async(&missing).unwrap().join().unwrap_err();
    assert!(matches!(err, SpellError::Engine(EngineError::Io { .. })));

    // The engine is still usable after the failures.
    assert!(speller.spell("color").unwrap());
}

#[test]
fn malformed_attached_dictionary_adds_nothing() {
    let fixture = Fixture::new();
    let aff = fixture.extra("long.aff", b"SET UTF-8\nFLAG long\n");
    let dic = fixture.extra("long.dic", b"1\nbase\n");
    let speller = Speller::new(aff, dic).unwrap();

    let extra = fixture.extra("broken.dic", b"3\nfoobar\nbazqux\nbad/Abc\n");
    let err = speller.add_dictionary(&extra).unwrap_err();
    assert!(matches!(err, SpellError::Engine(EngineError::Malformed { .. })));
    assert!(err.to_string().contains("broken.dic:4"));

    for word in ["foobar", "bazqux", "bad"] {
        assert!(!speller.spell(word).unwrap(), "{word} should not be attached");
    }

    // A well-formed file still attaches afterwards.
    let good = fixture.extra("good.dic", b"1\nfoobar/Aa\n");
    speller.add_dictionary_async(&good).unwrap().join().unwrap();
    assert!(speller.spell("foobar").unwrap());
    assert!(speller.spell("base").unwrap());
}

#[test]
fn attached_dictionary_limit() {
    let fixture = Fixture::new();
    let speller = fixture.speller();
    let extra = fixture.extra("one.dic", b"1\nonemore\n");

    for _ in 0..20 {
        speller.add_dictionary(&extra).unwrap();
    }
    let err = speller.add_dictionary(&extra).unwrap_err();
    assert!(matches!(err, SpellError::Engine(EngineError::TooManyDictionaries { limit: 20 })));
}

#[test]
fn word_characters_are_reported() {
    let fixture = Fixture::new();
    let speller = fixture.speller();
    assert_eq!(speller.word_characters().unwrap().as_deref(), Some("0123456789'.-"));

    let bare = fixture.extra("bare.aff", b"SET UTF-8\n");
    let speller = Speller::new(&bare, &fixture.paths.dic).unwrap();
    assert_eq!(speller.word_characters().unwrap(), None);
}

#[test]
fn latin1_dictionaries_are_decoded() {
    let fixture = Fixture::new();
    let aff = fixture.extra("fr.aff", b"SET ISO8859-1\nTRY \xe9e\n");
    let dic = fixture.extra("fr.dic", b"1\ncaf\xe9\n");
    let speller = Speller::new(aff, dic).unwrap();

    assert!(speller.spell("caf\u{e9}").unwrap());
    assert_eq!(speller.suggest("cafe").unwrap(), Some(vec!["caf\u{e9}".to_string()]));
}

#[test]
fn construction_failures_are_init_errors() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("missing");

    let err = Speller::new(&missing, &fixture.paths.dic).unwrap_err();
    assert!(matches!(err, SpellError::Init(InitError::AffixUnreadable { .. })));

    let err = Speller::new(&fixture.paths.aff, &missing).unwrap_err();
    assert!(matches!(err, SpellError::Init(InitError::DictionaryUnreadable { .. })));

    let broken = fixture.extra("broken.aff", b"SFX A Y many\n");
    let err = Speller::new(&broken, &fixture.paths.dic).unwrap_err();
    assert!(err.is_init());
    assert!(err.to_string().contains("line 1"));
}
