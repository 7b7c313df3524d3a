//! Language discipline: forbidden phrases, text matching and automated-agent
//! strictness checks.
//!
//! Matching is keyword and pattern based. The [`TextMatcher`] trait is the
//! seam where a stricter matcher can replace [`FoldingMatcher`] without
//! touching the validator or the interview evaluator.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::domain::AgentMode;

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

/// Strategy for phrase and concept detection in free text.
pub trait TextMatcher: Send + Sync + std::fmt::Debug {
    /// Canonical form used on both sides of every comparison.
    fn normalize(&self, text: &str) -> String;

    /// True when `phrase` occurs in `text`.
    fn matches_phrase(&self, text: &str, phrase: &str) -> bool {
        self.normalize(text).contains(&self.normalize(phrase))
    }

    /// Non-overlapping occurrences of `needle` in `text`.
    fn count_occurrences(&self, text: &str, needle: &str) -> usize {
        let needle = self.normalize(needle);
        if needle.is_empty() {
            return 0;
        }
        self.normalize(text).matches(needle.as_str()).count()
    }

    /// True when `text` expresses `concept` closely enough.
    fn matches_concept(&self, text: &str, concept: &str) -> bool;
}

/// Fraction of a concept's words that must be found in the answer.
const CONCEPT_MATCH_FRACTION: f64 = 0.4;

/// Lower-case plus accent folding, with stem-level concept matching.
#[derive(Debug, Default, Clone, Copy)]
pub struct FoldingMatcher;

impl TextMatcher for FoldingMatcher {
    fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect()
    }

    fn matches_concept(&self, text: &str, concept: &str) -> bool {
        let folded = self.normalize(text);
        let answer_words = words(&folded);
        let concept_folded = self.normalize(concept);
        let concept_words = words(&concept_folded);
        if concept_words.is_empty() {
            return false;
        }

        let matched = concept_words
            .iter()
            .filter(|cw| {
                if cw.len() <= 3 {
                    return folded.contains(*cw);
                }
                let stem = &cw[..stem_len(cw.len())];
                answer_words.iter().any(|rw| {
                    rw.contains(stem) || (rw.len() >= 4 && cw.contains(&rw[..stem_len(rw.len())]))
                })
            })
            .count();

        matched as f64 >= concept_words.len() as f64 * CONCEPT_MATCH_FRACTION
    }
}

/// Plain case-insensitive matching; concepts match on exact words only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralMatcher;

impl TextMatcher for LiteralMatcher {
    fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
    }

    fn matches_concept(&self, text: &str, concept: &str) -> bool {
        let lowered = self.normalize(text);
        let answer_words: Vec<&str> = lowered.split(|c: char| !c.is_alphanumeric()).collect();
        let concept_lowered = self.normalize(concept);
        let concept_words: Vec<&str> = concept_lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if concept_words.is_empty() {
            return false;
        }
        let matched = concept_words
            .iter()
            .filter(|cw| answer_words.contains(*cw))
            .count();
        matched as f64 >= concept_words.len() as f64 * CONCEPT_MATCH_FRACTION
    }
}

/// ASCII letter runs of already folded text.
fn words(folded: &str) -> Vec<&str> {
    folded
        .split(|c: char| !c.is_ascii_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn stem_len(len: usize) -> usize {
    len.min(len.saturating_sub(2).max(4))
}

// ---------------------------------------------------------------------------
// Phrase catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Verbal-discipline points lost per hit.
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Critical => 20.0,
            Severity::High => 15.0,
            Severity::Moderate => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForbiddenPhrase {
    pub phrase: &'static str,
    pub severity: Severity,
}

const FRENCH: &[&str] = &[
    "je pense",
    "feeling",
    "probablement",
    "je crois",
    "peut-être",
    "il me semble",
    "j'ai l'impression",
    "intuition",
    "instinct",
    "ça devrait",
    "normalement",
    "à mon avis",
];

const ENGLISH: &[&str] = &[
    "i think",
    "i believe",
    "feeling",
    "probably",
    "maybe",
    "it seems",
    "likely",
    "gut feeling",
    "intuition",
    "instinct",
    "should be",
    "in my opinion",
];

const LLM_EXTRA: &[&str] = &[
    "it appears",
    "arguably",
    "presumably",
    "one could say",
    "it's possible",
    "might be",
    "could potentially",
    "tends to",
    "generally speaking",
];

const CRITICAL: &[&str] = &["feeling", "gut feeling", "intuition", "instinct", "j'ai l'impression"];

const OPINION_MARKERS: &[&str] = &[
    "je pense",
    "je crois",
    "i think",
    "i believe",
    "à mon avis",
    "in my opinion",
    "il me semble",
    "it seems",
];

fn severity_of(phrase: &str) -> Severity {
    if CRITICAL.contains(&phrase) {
        Severity::Critical
    } else if OPINION_MARKERS.contains(&phrase) {
        Severity::High
    } else {
        Severity::Moderate
    }
}

/// Forbidden phrases for one agent mode.
#[derive(Debug, Clone)]
pub struct PhraseCatalog {
    phrases: Vec<ForbiddenPhrase>,
}

impl PhraseCatalog {
    fn build(lists: &[&[&'static str]]) -> Self {
        let mut phrases: Vec<ForbiddenPhrase> = Vec::new();
        for phrase in lists.iter().flat_map(|l| l.iter().copied()) {
            if phrases.iter().all(|p| p.phrase != phrase) {
                phrases.push(ForbiddenPhrase {
                    phrase,
                    severity: severity_of(phrase),
                });
            }
        }
        Self { phrases }
    }

    pub fn human() -> &'static PhraseCatalog {
        static HUMAN: OnceLock<PhraseCatalog> = OnceLock::new();
        HUMAN.get_or_init(|| Self::build(&[FRENCH, ENGLISH]))
    }

    pub fn llm() -> &'static PhraseCatalog {
        static LLM: OnceLock<PhraseCatalog> = OnceLock::new();
        LLM.get_or_init(|| Self::build(&[FRENCH, ENGLISH, LLM_EXTRA]))
    }

    pub fn for_mode(mode: AgentMode) -> &'static PhraseCatalog {
        match mode {
            AgentMode::Human => Self::human(),
            AgentMode::Llm => Self::llm(),
        }
    }

    pub fn phrases(&self) -> &[ForbiddenPhrase] {
        &self.phrases
    }

    /// Every catalog phrase found in `text`, in catalog order.
    pub fn scan(&self, matcher: &dyn TextMatcher, text: &str) -> Vec<ForbiddenPhrase> {
        let folded = matcher.normalize(text);
        self.phrases
            .iter()
            .filter(|p| folded.contains(&matcher.normalize(p.phrase)))
            .copied()
            .collect()
    }
}

/// Result of a language scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageReport {
    pub clean: bool,
    pub hits: Vec<ForbiddenPhrase>,
}

impl LanguageReport {
    /// Verbal-discipline points these hits cost.
    pub fn penalty(&self) -> f64 {
        self.hits.iter().map(|h| h.severity.penalty()).sum()
    }
}

pub fn check_language(text: &str, mode: AgentMode) -> LanguageReport {
    let hits = PhraseCatalog::for_mode(mode).scan(&FoldingMatcher, text);
    LanguageReport {
        clean: hits.is_empty(),
        hits,
    }
}

// ---------------------------------------------------------------------------
// Automated-agent strictness
// ---------------------------------------------------------------------------

const HEDGING: &[(&str, &str)] = &[
    (r"while.*it('s| is) true.*however", "conditional hedging"),
    (r"on balance", "evasive 'on balance'"),
    (r"more or less", "vague 'more or less'"),
    (r"to some extent", "vague 'to some extent'"),
    (r"it could be argued", "academic hedging"),
    (r"one might say", "evasive phrasing"),
    (r"there('s| is) a case (for|to be made)", "argumentative hedging"),
    (r"not entirely", "minimisation"),
    (r"somewhat", "vague adverb 'somewhat'"),
    (r"rather", "softening adverb 'rather'"),
];

const NON_ANSWERS: &[&str] = &[
    r"that('s| is) a (great|good|interesting) question",
    r"let me (think|consider)",
    r"there are (many|multiple|several) (factors|aspects)",
];

fn compile(patterns: impl Iterator<Item = &'static str>) -> Vec<Regex> {
    patterns.filter_map(|p| Regex::new(p).ok()).collect()
}

fn hedging_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        HEDGING
            .iter()
            .filter_map(|(p, label)| Regex::new(p).ok().map(|re| (re, *label)))
            .collect()
    })
}

fn non_answer_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(NON_ANSWERS.iter().copied()))
}

/// Zero-tolerance checks applied to automated candidates' answers. Any
/// returned violation eliminates the candidate.
pub fn llm_strictness_violations(answer: &str, max_words: usize) -> Vec<String> {
    let lowered = answer.to_lowercase();
    let mut violations = Vec::new();

    for (re, label) in hedging_patterns() {
        if re.is_match(&lowered) {
            violations.push(format!("strict: {label}"));
        }
    }

    let word_count = answer.split_whitespace().count();
    if word_count > max_words {
        violations.push(format!(
            "strict: answer too verbose ({word_count} words, max {max_words})"
        ));
    }

    if lowered.contains("however")
        && lowered.contains("but")
        && !lowered.contains("therefore")
        && !lowered.contains("thus")
    {
        violations.push("strict: nuance without a firm conclusion".to_string());
    }

    for re in non_answer_patterns() {
        if re.is_match(&lowered) {
            violations.push(format!("strict: non-answer '{}'", re.as_str()));
        }
    }

    violations
}

/// Softer hedges that cost an automated candidate points without
/// eliminating them.
pub fn soft_hedge_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(
            [
                r"however.*but",
                r"on one hand.*on the other",
                r"it depends",
                r"not necessarily",
                r"in some cases",
            ]
            .into_iter(),
        )
    })
}
