//! Phrase tables used by the content cleaner: verbose-phrase rewrites,
//! common-term abbreviations and per-domain terminology.
//!
//! Each table compiles into a single case-insensitive alternation (longest
//! phrase first), so one regex pass handles the whole table.

use crate::config::AbbreviationDomain;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Verbose phrase → terse equivalent, applied in order.
///
/// Longer phrases that contain a shorter entry (`due to the fact that` vs.
/// `the fact that`) come first.
pub const REDUNDANT_PHRASES: &[(&str, &str)] = &[
    ("at the present time", "now"),
    ("due to the fact that", "because"),
    ("for the purpose of", "for"),
    ("in the event that", "if"),
    ("in order to", "to"),
    ("a majority of", "most"),
    ("a number of", "many"),
    ("in spite of the fact that", "although"),
    ("in the near future", "soon"),
    ("it is clear that", ""),
    ("it should be noted that", ""),
    ("it is important to note that", ""),
    ("it is worth noting that", ""),
    ("needless to say", ""),
    ("the fact that", "that"),
];

const COMMON_TERMS: &[(&str, &str)] = &[
    ("for example", "e.g."),
    ("for instance", "e.g."),
    ("in other words", "i.e."),
    ("and so on", "etc."),
    ("and so forth", "etc."),
    ("etcetera", "etc."),
    ("with respect to", "re:"),
    ("in relation to", "re:"),
    ("as opposed to", "vs."),
    ("versus", "vs."),
    ("and others", "et al."),
    ("before the common era", "BCE"),
    ("before christ", "BCE"),
    ("hours", "hr"),
    ("hour", "hr"),
    ("minutes", "min"),
    ("minute", "min"),
    ("kilograms", "kg"),
    ("kilogram", "kg"),
    ("milligrams", "mg"),
    ("milligram", "mg"),
    ("kilometers", "km"),
    ("kilometer", "km"),
    ("centimeters", "cm"),
    ("centimeter", "cm"),
    ("millimeters", "mm"),
    ("millimeter", "mm"),
    ("professor", "Prof."),
    ("united nations", "UN"),
    ("united states of america", "USA"),
    ("united kingdom", "UK"),
    ("european union", "EU"),
    ("world health organization", "WHO"),
];

const LEGAL_TERMS: &[(&str, &str)] = &[
    ("pursuant to", "per"),
    ("hereinafter", "later"),
    ("notwithstanding", "despite"),
    ("aforementioned", "mentioned"),
    ("in accordance with", "per"),
    ("without prejudice to", "without affecting"),
    ("for the avoidance of doubt", ""),
    ("including but not limited to", "including"),
    ("mutatis mutandis", "with necessary changes"),
    ("prima facie", "on first view"),
    ("inter alia", "among other things"),
    ("bona fide", "genuine"),
    ("force majeure", "unforeseeable circumstances"),
];

const TECHNICAL_TERMS: &[(&str, &str)] = &[
    ("graphical user interface", "GUI"),
    ("command line interface", "CLI"),
    ("object-oriented programming", "OOP"),
    ("application programming interface", "API"),
    ("integrated development environment", "IDE"),
    ("artificial intelligence", "AI"),
    ("machine learning", "ML"),
    ("natural language processing", "NLP"),
    ("random access memory", "RAM"),
    ("hypertext markup language", "HTML"),
    ("cascading style sheets", "CSS"),
    ("javascript object notation", "JSON"),
    ("representational state transfer", "REST"),
    ("extensible markup language", "XML"),
    ("database management system", "DBMS"),
    ("operating system", "OS"),
    ("internet of things", "IoT"),
    ("information technology", "IT"),
    ("user experience", "UX"),
    ("user interface", "UI"),
];

const ACADEMIC_TERMS: &[(&str, &str)] = &[
    ("in the literature", "in research"),
    ("to the best of our knowledge", ""),
    ("a growing body of literature", "research"),
    ("the literature suggests", "research suggests"),
    ("a plethora of studies", "many studies"),
    ("extant literature", "existing research"),
    ("previous studies have shown", "research shows"),
    ("a large number of studies", "many studies"),
    ("it is widely accepted that", ""),
    ("empirical evidence suggests", "evidence suggests"),
    ("it has been demonstrated that", ""),
    ("conceptual framework", "framework"),
    ("theoretical underpinnings", "theory"),
    ("methodological approach", "method"),
];

const BUSINESS_TERMS: &[(&str, &str)] = &[
    ("return on investment", "ROI"),
    ("key performance indicator", "KPI"),
    ("standard operating procedure", "SOP"),
    ("customer relationship management", "CRM"),
    ("business-to-business", "B2B"),
    ("business-to-consumer", "B2C"),
    ("chief executive officer", "CEO"),
    ("chief financial officer", "CFO"),
    ("chief information officer", "CIO"),
    ("chief technology officer", "CTO"),
    ("chief operating officer", "COO"),
    ("human resources", "HR"),
    ("research and development", "R&D"),
    ("mergers and acquisitions", "M&A"),
    ("initial public offering", "IPO"),
    ("profit and loss", "P&L"),
    ("generally accepted accounting principles", "GAAP"),
    ("year over year", "YoY"),
    ("quarter over quarter", "QoQ"),
];

const MEDICAL_TERMS: &[(&str, &str)] = &[
    ("electronic health record", "EHR"),
    ("electronic medical record", "EMR"),
    ("cardiovascular disease", "CVD"),
    ("myocardial infarction", "MI"),
    ("coronary artery disease", "CAD"),
    ("chronic obstructive pulmonary disease", "COPD"),
    ("diabetes mellitus", "DM"),
    ("blood pressure", "BP"),
    ("body mass index", "BMI"),
    ("randomized controlled trial", "RCT"),
    ("emergency department", "ED"),
    ("intensive care unit", "ICU"),
    ("quality of life", "QoL"),
    ("activities of daily living", "ADL"),
    ("over the counter", "OTC"),
    ("twice a day", "BID"),
    ("three times a day", "TID"),
    ("four times a day", "QID"),
];

/// A compiled phrase table.
pub struct TermTable {
    pattern: Regex,
    replacements: HashMap<String, &'static str>,
}

impl TermTable {
    fn compile(terms: &'static [(&'static str, &'static str)]) -> Self {
        let mut keys: Vec<&str> = terms.iter().map(|(k, _)| *k).collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        // A removed phrase also takes the comma and spaces after it; the next
        // letter is captured so a sentence-initial removal can re-capitalise.
        let pattern = format!(r"(?i)\b(?:{alternation})\b(?:(,?[ \t]+)(\p{{L}})?)?");
        Self {
            pattern: Regex::new(&pattern).unwrap(),
            replacements: terms
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
        }
    }

    /// Replace every phrase in `text`, keeping the case shape of the match.
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| self.replace(caps))
            .into_owned()
    }

    fn replace(&self, caps: &Captures<'_>) -> String {
        let whole = &caps[0];
        let tail_len = caps.get(1).map_or(0, |m| m.len()) + caps.get(2).map_or(0, |m| m.len());
        let phrase = &whole[..whole.len() - tail_len];
        let Some(replacement) = self.replacements.get(&phrase.to_lowercase()) else {
            return whole.to_string();
        };
        let next = caps.get(2).map_or("", |m| m.as_str());
        if replacement.is_empty() {
            // "It is clear that the sky" → "The sky"
            if starts_uppercase(phrase) {
                return capitalise(next);
            }
            return next.to_string();
        }
        let separator = caps.get(1).map_or("", |m| m.as_str());
        format!("{}{}{}", match_case(phrase, replacement), separator, next)
    }
}

static REDUNDANT: Lazy<TermTable> = Lazy::new(|| TermTable::compile(REDUNDANT_PHRASES));
static COMMON: Lazy<TermTable> = Lazy::new(|| TermTable::compile(COMMON_TERMS));
static LEGAL: Lazy<TermTable> = Lazy::new(|| TermTable::compile(LEGAL_TERMS));
static TECHNICAL: Lazy<TermTable> = Lazy::new(|| TermTable::compile(TECHNICAL_TERMS));
static ACADEMIC: Lazy<TermTable> = Lazy::new(|| TermTable::compile(ACADEMIC_TERMS));
static BUSINESS: Lazy<TermTable> = Lazy::new(|| TermTable::compile(BUSINESS_TERMS));
static MEDICAL: Lazy<TermTable> = Lazy::new(|| TermTable::compile(MEDICAL_TERMS));

pub fn redundant_phrases() -> &'static TermTable {
    &REDUNDANT
}

pub fn common_terms() -> &'static TermTable {
    &COMMON
}

pub fn domain_terms(domain: AbbreviationDomain) -> &'static TermTable {
    match domain {
        AbbreviationDomain::Legal => &LEGAL,
        AbbreviationDomain::Technical => &TECHNICAL,
        AbbreviationDomain::Academic => &ACADEMIC,
        AbbreviationDomain::Business => &BUSINESS,
        AbbreviationDomain::Medical => &MEDICAL,
    }
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shape `replacement` like `matched`: ALL CAPS stays caps, Capitalised
/// stays capitalised, anything else keeps the replacement as written.
fn match_case(matched: &str, replacement: &str) -> String {
    let mut letters = matched.chars().filter(|c| c.is_alphabetic());
    let multi_letter = matched.chars().filter(|c| c.is_alphabetic()).count() > 1;
    if multi_letter && letters.all(char::is_uppercase) {
        return replacement.to_uppercase();
    }
    if starts_uppercase(matched) {
        return capitalise(replacement);
    }
    replacement.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_phrases_shorten() {
        let t = redundant_phrases();
        assert_eq!(
            t.apply("We left due to the fact that it rained."),
            "We left because it rained."
        );
        assert_eq!(t.apply("Due to the fact that it rained"), "Because it rained");
        assert_eq!(t.apply("In order to win, train."), "To win, train.");
    }

    #[test]
    fn empty_replacement_recapitalises() {
        let t = redundant_phrases();
        assert_eq!(t.apply("It is clear that the plan works."), "The plan works.");
        assert_eq!(t.apply("So, needless to say, it works."), "So, it works.");
    }

    #[test]
    fn longer_phrase_wins() {
        assert_eq!(
            redundant_phrases().apply("in spite of the fact that it failed"),
            "although it failed"
        );
    }

    #[test]
    fn domain_tables_keep_acronyms() {
        let t = domain_terms(AbbreviationDomain::Technical);
        assert_eq!(t.apply("We use machine learning daily"), "We use ML daily");
        assert_eq!(t.apply("Machine learning works"), "ML works");
    }

    #[test]
    fn word_boundaries_respected() {
        assert_eq!(common_terms().apply("the hourglass"), "the hourglass");
        assert_eq!(common_terms().apply("two hours later"), "two hr later");
    }
}
