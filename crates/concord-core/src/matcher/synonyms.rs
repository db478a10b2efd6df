//! Synonym dictionary: canonical phrase -> alternate phrasings.
//!
//! An entry applies to a name when the lowercased name contains the key or
//! any alternate; every phrase of the entry then becomes a lookup variant.
//! All phrases are lowercase and long enough not to occur inside unrelated
//! words, since variants are matched as plain substrings.

pub const SYNONYMS: &[(&str, &[&str])] = &[
    ("vitamin d", &["vitamin d3", "cholecalciferol"]),
    ("vitamin b12", &["methylcobalamin", "cobalamin"]),
    ("folate", &["methylfolate", "5-mthf", "folinic acid"]),
    ("magnesium", &["magnesium glycinate", "magnesium citrate", "magnesium threonate"]),
    ("omega-3", &["omega 3", "fish oil", "epa/dha"]),
    ("coq10", &["coenzyme q10", "ubiquinol", "ubiquinone"]),
    ("n-acetyl cysteine", &["n-acetylcysteine"]),
    ("glutathione", &["liposomal glutathione", "reduced glutathione"]),
    ("probiotic", &["probiotics", "lactobacillus", "bifidobacterium"]),
    ("curcumin", &["turmeric"]),
    ("binder", &["activated charcoal", "bentonite clay", "zeolite", "chlorella"]),
    ("hbot", &["hyperbaric oxygen", "hyperbaric oxygen therapy"]),
    ("red light therapy", &["red light", "photobiomodulation"]),
    ("iv therapy", &["iv drip", "intravenous", "iv infusion"]),
    ("nad+", &["nicotinamide adenine dinucleotide"]),
    ("sauna", &["infrared sauna", "far infrared sauna"]),
    ("cold plunge", &["cold water immersion", "ice bath"]),
    ("pemf", &["pulsed electromagnetic field"]),
    ("hs-crp", &["c-reactive protein"]),
];

/// Abbreviation -> spelled-out phrase.
///
/// Applies only when the abbreviation is a whole word of the name, and only
/// the spelled-out phrase is added as a variant.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("nac", "n-acetyl cysteine"),
    ("gsh", "glutathione"),
    ("b12", "vitamin b12"),
    ("nad", "nad+"),
    ("crp", "c-reactive protein"),
    ("cbc", "complete blood count"),
    ("cmp", "comprehensive metabolic panel"),
];
