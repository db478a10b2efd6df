//! Name variant matching.
//!
//! A protocol item may appear in free text under a different case, without
//! its parenthetical qualifier ("Magnesium (glycinate)"), or under a synonym
//! ("cholecalciferol" for vitamin D). [`variants_of`] builds the set of
//! lookup strings for a name; [`matches`] tests them against a text blob.

pub mod synonyms;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use self::synonyms::{ABBREVIATIONS, SYNONYMS};

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("parenthetical pattern is valid"));

/// Build the lookup variants for an item name.
///
/// Contains the trimmed raw name, its lowercase form, the name with
/// parenthetical segments stripped (both cases), the spelled-out form of each
/// abbreviation written as a word of the name, and every phrase of each
/// synonym entry that applies to the name or one of those spelled-out forms.
/// Empty strings are never included.
pub fn variants_of(name: &str) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    let raw = name.trim();
    let lower = raw.to_lowercase();

    let stripped = PARENTHETICAL.replace_all(raw, "").trim().to_owned();
    let stripped_lower = stripped.to_lowercase();

    for variant in [raw.to_owned(), lower.clone(), stripped, stripped_lower] {
        if !variant.is_empty() {
            variants.insert(variant);
        }
    }

    let mut search = lower.clone();
    for (abbreviation, expansion) in ABBREVIATIONS {
        if lower.split(|c: char| !c.is_alphanumeric()).any(|word| word == *abbreviation) {
            variants.insert((*expansion).to_owned());
            search.push('\n');
            search.push_str(expansion);
        }
    }

    for (key, alternates) in SYNONYMS {
        let applies = search.contains(key) || alternates.iter().any(|alt| search.contains(alt));
        if applies {
            variants.insert((*key).to_owned());
            variants.extend(alternates.iter().map(|alt| (*alt).to_owned()));
        }
    }

    variants
}

/// True when any variant of `name` occurs in `text_blob`, ignoring case.
pub fn matches(name: &str, text_blob: &str) -> bool {
    NameVariants::new(name).found_in(&text_blob.to_lowercase())
}

/// Precomputed lowercase variants of one name, for matching against an
/// already-lowercased blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVariants {
    name: String,
    lowered: Vec<String>,
}

impl NameVariants {
    pub fn new(name: &str) -> Self {
        let lowered: BTreeSet<String> = variants_of(name)
            .into_iter()
            .map(|v| v.to_lowercase())
            .collect();
        Self {
            name: name.to_owned(),
            lowered: lowered.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `lower_blob` must already be lowercase.
    pub fn found_in(&self, lower_blob: &str) -> bool {
        self.lowered.iter().any(|v| lower_blob.contains(v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_include_case_and_stripped_forms() {
        let v = variants_of("Magnesium Glycinate (400mg)");
        assert!(v.contains("Magnesium Glycinate (400mg)"));
        assert!(v.contains("magnesium glycinate (400mg)"));
        assert!(v.contains("Magnesium Glycinate"));
        assert!(v.contains("magnesium glycinate"));
        // Synonym expansion through the "magnesium" entry.
        assert!(v.contains("magnesium"));
        assert!(v.contains("magnesium citrate"));
    }

    #[test]
    fn vitamin_d3_matches_plain_vitamin_d() {
        assert!(matches("Vitamin D3", "Start VITAMIN D with breakfast"));
    }

    #[test]
    fn synonym_alternate_in_name_pulls_in_key() {
        let v = variants_of("Ubiquinol 100mg");
        assert!(v.contains("coq10"));
        assert!(matches("Ubiquinol 100mg", "take coq10 daily"));
    }

    #[test]
    fn parenthetical_only_name_never_yields_empty_variant() {
        let v = variants_of("(tbd)");
        assert!(!v.contains(""));
        assert!(!matches("(tbd)", "some unrelated plan text"));
    }

    #[test]
    fn blank_name_matches_nothing() {
        assert!(variants_of("   ").is_empty());
        assert!(!matches("", "anything"));
    }

    #[test]
    fn unmatched_name() {
        assert!(!matches("Berberine", "magnesium and vitamin d"));
    }

    #[test]
    fn matching_is_deterministic() {
        assert_eq!(variants_of("Omega-3 Fish Oil"), variants_of("Omega-3 Fish Oil"));
    }

    #[test]
    fn abbreviation_does_not_match_inside_words() {
        assert!(!matches("N-Acetyl Cysteine (NAC)", "green spinach smoothie"));
        assert!(!matches("NAD+ infusion", "fresh lemonade"));
        assert!(!matches("hs-CRP", "crisp vegetables"));
        assert!(!variants_of("N-Acetyl Cysteine (NAC)").contains("nac"));
    }

    #[test]
    fn whole_word_abbreviation_is_spelled_out() {
        assert!(matches("NAC 600mg", "N-acetylcysteine twice daily"));
        assert!(matches("CMP", "repeat comprehensive metabolic panel"));
        assert!(variants_of("B12 (methyl)").contains("methylcobalamin"));
    }

    #[test]
    fn abbreviation_inside_a_word_is_not_expanded() {
        let v = variants_of("Spinach smoothie");
        assert!(!v.contains("n-acetyl cysteine"));
        assert!(!v.contains("nad+"));
        assert!(!variants_of("Canada trip").contains("nad+"));
    }

    #[test]
    fn name_variants_reports_name() {
        let nv = NameVariants::new("HBOT");
        assert_eq!(nv.name(), "HBOT");
        assert!(nv.found_in("session of hyperbaric oxygen"));
    }
}
