//! Per-language filler lexicons.
//!
//! Built-in lists cover English, Italian, Spanish, French and German.  Extra
//! entries can be supplied as JSON files (one per language) named in
//! `FillerConfig::lexicon_paths`; they extend the built-in list for that
//! language or create a new one:
//!
//! ```json
//! [
//!   { "token": "tipo", "kind": "discourse-marker" },
//!   { "token": "ehmm" }
//! ]
//! ```
//!
//! `kind` defaults to `hesitation`.  Tokens may be short phrases
//! (`"you know"`); matching works on whole normalised words.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, FillerConfig};
use crate::transcript::primary_subtag;

// ---------------------------------------------------------------------------
// Token normalisation
// ---------------------------------------------------------------------------

/// Lowercase and strip surrounding punctuation: `"Ehm,"` → `"ehm"`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Collapse runs of the same character: `"ehmmm"` → `"ehm"`.
pub fn collapse_repeats(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut previous = None;
    for c in token.chars() {
        if previous != Some(c) {
            out.push(c);
        }
        previous = Some(c);
    }
    out
}

// ---------------------------------------------------------------------------
// LexiconEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillerKind {
    /// Vocalised hesitation: "ehm", "uh".
    #[default]
    Hesitation,
    /// A real word used as verbal padding: "like", "cioè".
    DiscourseMarker,
}

/// One entry as written in a lexicon file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub token: String,
    #[serde(default)]
    pub kind: FillerKind,
}

impl LexiconEntry {
    pub fn new(token: impl Into<String>, kind: FillerKind) -> Self {
        Self {
            token: token.into(),
            kind,
        }
    }
}

/// A lexicon entry prepared for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEntry {
    /// Normalised words joined by single spaces; the `byType` key.
    pub canonical: String,
    pub words: Vec<String>,
    /// `canonical` with repeated letters collapsed.
    pub collapsed: String,
    pub kind: FillerKind,
}

impl CompiledEntry {
    fn compile(entry: &LexiconEntry) -> Option<Self> {
        let words: Vec<String> = entry
            .token
            .split_whitespace()
            .map(normalize_token)
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return None;
        }
        let canonical = words.join(" ");
        Some(Self {
            collapsed: collapse_repeats(&canonical),
            canonical,
            words,
            kind: entry.kind,
        })
    }

    pub fn is_phrase(&self) -> bool {
        self.words.len() > 1
    }
}

// ---------------------------------------------------------------------------
// Built-in lexicons
// ---------------------------------------------------------------------------

use FillerKind::{DiscourseMarker as D, Hesitation as H};

#[rustfmt::skip]
const EN: &[(&str, FillerKind)] = &[
    ("um", H), ("umm", H), ("uh", H), ("uhm", H), ("er", H), ("erm", H),
    ("ah", H), ("ahm", H), ("eh", H), ("ehm", H), ("hmm", H), ("mm", H),
    ("like", D), ("basically", D), ("actually", D), ("literally", D),
    ("you know", D), ("i mean", D), ("sort of", D), ("kind of", D),
];

#[rustfmt::skip]
const IT: &[(&str, FillerKind)] = &[
    ("ehm", H), ("eh", H), ("uhm", H), ("ah", H), ("ahm", H), ("mm", H), ("hmm", H),
    ("cioè", D), ("diciamo", D), ("tipo", D), ("praticamente", D), ("insomma", D),
    ("allora", D), ("ecco", D), ("come dire", D), ("in pratica", D),
    ("per così dire", D), ("nel senso", D),
];

#[rustfmt::skip]
const ES: &[(&str, FillerKind)] = &[
    ("eh", H), ("em", H), ("ehm", H), ("mm", H),
    ("este", D), ("pues", D), ("bueno", D), ("o sea", D), ("digamos", D),
    ("en plan", D), ("tipo", D),
];

#[rustfmt::skip]
const FR: &[(&str, FillerKind)] = &[
    ("euh", H), ("heu", H), ("hum", H), ("bah", H), ("ben", H),
    ("genre", D), ("en fait", D), ("du coup", D), ("voilà", D), ("tu vois", D),
];

#[rustfmt::skip]
const DE: &[(&str, FillerKind)] = &[
    ("äh", H), ("ähm", H), ("öh", H), ("hm", H), ("hmm", H),
    ("also", D), ("halt", D), ("sozusagen", D), ("quasi", D), ("irgendwie", D),
    ("na ja", D),
];

fn builtin_table(language: &str) -> Option<&'static [(&'static str, FillerKind)]> {
    match language {
        "en" => Some(EN),
        "it" => Some(IT),
        "es" => Some(ES),
        "fr" => Some(FR),
        "de" => Some(DE),
        _ => None,
    }
}

/// Languages with a built-in lexicon.
pub const BUILTIN_LANGUAGES: &[&str] = &["de", "en", "es", "fr", "it"];

// ---------------------------------------------------------------------------
// FillerLexicon
// ---------------------------------------------------------------------------

/// The filler entries for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct FillerLexicon {
    language: String,
    entries: Vec<CompiledEntry>,
}

impl FillerLexicon {
    pub fn new(language: &str, entries: &[LexiconEntry]) -> Self {
        let mut lexicon = Self {
            language: primary_subtag(language),
            entries: Vec::new(),
        };
        lexicon.extend(entries);
        lexicon
    }

    /// The built-in lexicon for `language`, if there is one.
    pub fn builtin(language: &str) -> Option<Self> {
        let language = primary_subtag(language);
        let table = builtin_table(&language)?;
        let entries: Vec<LexiconEntry> = table
            .iter()
            .map(|&(token, kind)| LexiconEntry::new(token, kind))
            .collect();
        Some(Self::new(&language, &entries))
    }

    /// Add entries; an entry whose normalised form already exists replaces
    /// the old one's kind.
    pub fn extend(&mut self, entries: &[LexiconEntry]) {
        for compiled in entries.iter().filter_map(CompiledEntry::compile) {
            match self
                .entries
                .iter_mut()
                .find(|e| e.canonical == compiled.canonical)
            {
                Some(existing) => existing.kind = compiled.kind,
                None => self.entries.push(compiled),
            }
        }
    }

    /// Read a JSON array of [`LexiconEntry`] values.
    pub fn read_entries(path: &Path) -> Result<Vec<LexiconEntry>, String> {
        let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&data).map_err(|e| e.to_string())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn entries(&self) -> &[CompiledEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multi-word entries, longest first.
    pub fn phrases(&self) -> Vec<&CompiledEntry> {
        let mut phrases: Vec<&CompiledEntry> =
            self.entries.iter().filter(|e| e.is_phrase()).collect();
        phrases.sort_by(|a, b| b.words.len().cmp(&a.words.len()));
        phrases
    }

    /// Single-word entry whose normalised form is exactly `token`.
    pub fn exact(&self, token: &str) -> Option<&CompiledEntry> {
        self.entries
            .iter()
            .find(|e| !e.is_phrase() && e.canonical == token)
    }

    /// Single-word entry matching `token` once repeated letters are
    /// collapsed.  Only tokens that actually contain a repeat qualify.
    pub fn collapsed(&self, token: &str) -> Option<&CompiledEntry> {
        let collapsed = collapse_repeats(token);
        if collapsed == token {
            return None;
        }
        self.entries
            .iter()
            .find(|e| !e.is_phrase() && e.collapsed == collapsed)
    }
}

// ---------------------------------------------------------------------------
// LexiconSet
// ---------------------------------------------------------------------------

/// Which lexicon serves a transcript language.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Native(&'a FillerLexicon),
    /// No lexicon for the language; the default one stands in.
    Fallback(&'a FillerLexicon),
}

impl<'a> Resolution<'a> {
    pub fn lexicon(self) -> &'a FillerLexicon {
        match self {
            Resolution::Native(l) | Resolution::Fallback(l) => l,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }
}

/// All lexicons available to the engine, immutable once built.
#[derive(Debug, Clone)]
pub struct LexiconSet {
    lexicons: BTreeMap<String, FillerLexicon>,
    fallback: FillerLexicon,
}

impl LexiconSet {
    /// Built-in lexicons only.
    pub fn builtin(default_language: &str) -> Result<Self, ConfigError> {
        let lexicons: BTreeMap<String, FillerLexicon> = BUILTIN_LANGUAGES
            .iter()
            .filter_map(|lang| FillerLexicon::builtin(lang))
            .map(|l| (l.language().to_string(), l))
            .collect();
        Self::from_lexicons(lexicons, default_language)
    }

    /// Built-in lexicons extended with the files named in `config`.
    pub fn load(config: &FillerConfig) -> Result<Self, ConfigError> {
        let mut lexicons: BTreeMap<String, FillerLexicon> = BUILTIN_LANGUAGES
            .iter()
            .filter_map(|lang| FillerLexicon::builtin(lang))
            .map(|l| (l.language().to_string(), l))
            .collect();

        for (language, path) in &config.lexicon_paths {
            let entries =
                FillerLexicon::read_entries(path).map_err(|message| ConfigError::Lexicon {
                    language: language.clone(),
                    path: path.display().to_string(),
                    message,
                })?;
            let key = primary_subtag(language);
            log::debug!(
                "lexicon: {} entries for `{key}` from {}",
                entries.len(),
                path.display()
            );
            lexicons
                .entry(key.clone())
                .or_insert_with(|| FillerLexicon::new(&key, &[]))
                .extend(&entries);
        }

        Self::from_lexicons(lexicons, &config.default_language)
    }

    fn from_lexicons(
        lexicons: BTreeMap<String, FillerLexicon>,
        default_language: &str,
    ) -> Result<Self, ConfigError> {
        let default = primary_subtag(default_language);
        let fallback = lexicons
            .get(&default)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "filler.default_language",
                reason: format!("no filler lexicon for `{default_language}`"),
            })?;
        Ok(Self { lexicons, fallback })
    }

    pub fn get(&self, language: &str) -> Option<&FillerLexicon> {
        self.lexicons.get(&primary_subtag(language))
    }

    pub fn resolve(&self, language: &str) -> Resolution<'_> {
        match self.get(language) {
            Some(lexicon) => Resolution::Native(lexicon),
            None => Resolution::Fallback(&self.fallback),
        }
    }

    pub fn default_language(&self) -> &str {
        self.fallback.language()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.lexicons.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_token("Ehm,"), "ehm");
        assert_eq!(normalize_token("«Cioè»"), "cioè");
        assert_eq!(normalize_token("don't"), "don't");
        assert_eq!(normalize_token("..."), "");
    }

    #[test]
    fn repeats_collapse() {
        assert_eq!(collapse_repeats("ehmmm"), "ehm");
        assert_eq!(collapse_repeats("uuuhhh"), "uh");
        assert_eq!(collapse_repeats("ecco"), "eco");
    }

    #[test]
    fn builtin_languages_resolve() {
        for lang in BUILTIN_LANGUAGES {
            let lexicon = FillerLexicon::builtin(lang).unwrap();
            assert!(!lexicon.is_empty(), "{lang}");
        }
        assert!(FillerLexicon::builtin("xx").is_none());
        assert_eq!(FillerLexicon::builtin("IT-it").unwrap().language(), "it");
    }

    #[test]
    fn exact_and_collapsed_lookup() {
        let it = FillerLexicon::builtin("it").unwrap();
        assert_eq!(it.exact("ehm").unwrap().kind, FillerKind::Hesitation);
        assert_eq!(it.exact("cioè").unwrap().kind, FillerKind::DiscourseMarker);
        assert_eq!(it.collapsed("ehmmm").unwrap().canonical, "ehm");
        // No repeated letters → no collapsed match.
        assert!(it.collapsed("ehm").is_none());
        assert!(it.exact("progetto").is_none());
    }

    #[test]
    fn phrases_are_longest_first() {
        let it = FillerLexicon::builtin("it").unwrap();
        let phrases = it.phrases();
        assert_eq!(phrases[0].canonical, "per così dire");
        assert!(phrases.iter().all(|p| p.is_phrase()));
    }

    #[test]
    fn extend_adds_and_overrides() {
        let mut en = FillerLexicon::builtin("en").unwrap();
        let before = en.len();
        en.extend(&[
            LexiconEntry::new("Like", FillerKind::Hesitation),
            LexiconEntry::new("so yeah", FillerKind::DiscourseMarker),
            LexiconEntry::new("  ", FillerKind::Hesitation),
        ]);
        assert_eq!(en.len(), before + 1);
        assert_eq!(en.exact("like").unwrap().kind, FillerKind::Hesitation);
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let set = LexiconSet::builtin("en").unwrap();
        assert!(matches!(set.resolve("it-IT"), Resolution::Native(l) if l.language() == "it"));
        let fallback = set.resolve("sv");
        assert!(fallback.is_fallback());
        assert_eq!(fallback.lexicon().language(), "en");
    }

    #[test]
    fn default_language_must_exist() {
        let err = LexiconSet::builtin("xx").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "filler.default_language",
                ..
            }
        ));
    }

    #[test]
    fn loads_lexicon_file_for_new_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pt.json");
        std::fs::write(
            &path,
            r#"[{"token":"tipo","kind":"discourse-marker"},{"token":"é pá"},{"token":"hã"}]"#,
        )
        .unwrap();

        let mut config = FillerConfig::default();
        config.lexicon_paths.insert("pt".into(), path);
        let set = LexiconSet::load(&config).unwrap();

        let pt = set.get("pt-BR").unwrap();
        assert_eq!(pt.len(), 3);
        assert_eq!(pt.exact("hã").unwrap().kind, FillerKind::Hesitation);
        assert!(set.languages().any(|l| l == "pt"));
    }

    #[test]
    fn bad_lexicon_file_is_a_config_error() {
        let mut config = FillerConfig::default();
        config
            .lexicon_paths
            .insert("it".into(), PathBuf::from("/no/such/lexicon.json"));
        let err = LexiconSet::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Lexicon { ref language, .. } if language == "it"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, "{not json").unwrap();
        let mut config = FillerConfig::default();
        config.lexicon_paths.insert("en".into(), path);
        assert!(matches!(
            LexiconSet::load(&config),
            Err(ConfigError::Lexicon { .. })
        ));
    }
}
