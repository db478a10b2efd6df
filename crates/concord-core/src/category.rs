//! Element categories, explicit tag parsing, and the legacy keyword inference
//! used for protocol items that carry no usable category tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The four buckets every extracted protocol element lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Supplement,
    ClinicTreatment,
    LifestyleProtocol,
    RetestItem,
}

impl ElementCategory {
    /// All categories, in report order.
    pub const ALL: [ElementCategory; 4] = [
        Self::Supplement,
        Self::ClinicTreatment,
        Self::LifestyleProtocol,
        Self::RetestItem,
    ];

    /// Key used for this category in serialized reports and element sets.
    pub fn report_key(self) -> &'static str {
        match self {
            Self::Supplement => "supplements",
            Self::ClinicTreatment => "clinicTreatments",
            Self::LifestyleProtocol => "lifestyleProtocols",
            Self::RetestItem => "retestItems",
        }
    }

    /// Human-readable plural label, e.g. for alignment notes.
    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Supplement => "supplements",
            Self::ClinicTreatment => "clinic treatments",
            Self::LifestyleProtocol => "lifestyle protocols",
            Self::RetestItem => "retest items",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Supplement => "supplement",
            Self::ClinicTreatment => "clinic_treatment",
            Self::LifestyleProtocol => "lifestyle_protocol",
            Self::RetestItem => "retest_item",
        };
        f.write_str(s)
    }
}

impl FromStr for ElementCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supplement" => Ok(Self::Supplement),
            "clinic_treatment" => Ok(Self::ClinicTreatment),
            "lifestyle_protocol" => Ok(Self::LifestyleProtocol),
            "retest_item" => Ok(Self::RetestItem),
            other => Err(CategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ElementCategory`] string.
#[derive(Debug, Clone)]
pub struct CategoryParseError(pub String);

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid element category: {:?}", self.0)
    }
}

impl std::error::Error for CategoryParseError {}

// ---------------------------------------------------------------------------

/// How an element's category was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The item carried a recognised category tag.
    Tagged,
    /// No usable tag; the legacy keyword matcher decided.
    Inferred,
    /// The protocol section the item came from fixes its category
    /// (clinic modalities, retest schedule).
    Section,
}

// ---------------------------------------------------------------------------
// Per-category container
// ---------------------------------------------------------------------------

/// One value per [`ElementCategory`], serialized as an object keyed by the
/// category report keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerCategory<T> {
    #[serde(default)]
    pub supplements: T,
    #[serde(default)]
    pub clinic_treatments: T,
    #[serde(default)]
    pub lifestyle_protocols: T,
    #[serde(default)]
    pub retest_items: T,
}

impl<T> PerCategory<T> {
    /// Build a value for each category from a function.
    pub fn from_fn(mut f: impl FnMut(ElementCategory) -> T) -> Self {
        Self {
            supplements: f(ElementCategory::Supplement),
            clinic_treatments: f(ElementCategory::ClinicTreatment),
            lifestyle_protocols: f(ElementCategory::LifestyleProtocol),
            retest_items: f(ElementCategory::RetestItem),
        }
    }

    pub fn get(&self, category: ElementCategory) -> &T {
        match category {
            ElementCategory::Supplement => &self.supplements,
            ElementCategory::ClinicTreatment => &self.clinic_treatments,
            ElementCategory::LifestyleProtocol => &self.lifestyle_protocols,
            ElementCategory::RetestItem => &self.retest_items,
        }
    }

    pub fn get_mut(&mut self, category: ElementCategory) -> &mut T {
        match category {
            ElementCategory::Supplement => &mut self.supplements,
            ElementCategory::ClinicTreatment => &mut self.clinic_treatments,
            ElementCategory::LifestyleProtocol => &mut self.lifestyle_protocols,
            ElementCategory::RetestItem => &mut self.retest_items,
        }
    }

    /// Iterate `(category, value)` pairs in report order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementCategory, &T)> {
        ElementCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

// ---------------------------------------------------------------------------
// Explicit tags
// ---------------------------------------------------------------------------

/// Tags that place an item in the supplement bucket.
pub const SUPPLEMENT_TAGS: &[&str] = &["supplement", "supplements", "binder", "binders"];

/// Tags that place an item in the clinic-treatment bucket.
pub const CLINIC_TREATMENT_TAGS: &[&str] = &[
    "clinic_treatment",
    "clinictreatment",
    "clinic",
    "iv",
    "therapy",
];

/// Tags that place an item in the lifestyle-protocol bucket.
pub const LIFESTYLE_TAGS: &[&str] = &[
    "lifestyle",
    "lifestyle_protocol",
    "lifestyleprotocol",
    "diet",
    "protocol",
];

/// Map an explicit category tag to a category.
///
/// Matching ignores case and treats `-` and spaces as `_`. Returns `None` for
/// unknown or empty tags so the caller can fall back to
/// [`infer_legacy_category`].
pub fn category_from_tag(tag: &str) -> Option<ElementCategory> {
    let folded: String = tag
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    if SUPPLEMENT_TAGS.contains(&folded.as_str()) {
        Some(ElementCategory::Supplement)
    } else if CLINIC_TREATMENT_TAGS.contains(&folded.as_str()) {
        Some(ElementCategory::ClinicTreatment)
    } else if LIFESTYLE_TAGS.contains(&folded.as_str()) {
        Some(ElementCategory::LifestyleProtocol)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Legacy inference
// ---------------------------------------------------------------------------

/// Name fragments that mark an untagged item as a clinic treatment.
/// Checked before [`LIFESTYLE_KEYWORDS`].
pub const CLINIC_TREATMENT_KEYWORDS: &[&str] = &[
    "iv ",
    "infusion",
    "hbot",
    "hyperbaric",
    "sauna",
    "red light",
    "cold plunge",
    "nad+",
    "peptide",
    "injection",
    "chelation",
    "ozone",
];

/// Name fragments that mark an untagged item as a lifestyle protocol.
pub const LIFESTYLE_KEYWORDS: &[&str] = &[
    "hydration",
    "elimination",
    "sleep",
    "exercise",
    "stress",
    "diet",
    "fasting",
];

/// Keyword-substring classification for historical, untagged protocol items.
///
/// Clinic-treatment keywords win over lifestyle keywords; anything matching
/// neither list is a supplement.
pub fn infer_legacy_category(name: &str) -> ElementCategory {
    let lower = name.to_lowercase();
    if CLINIC_TREATMENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ElementCategory::ClinicTreatment
    } else if LIFESTYLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ElementCategory::LifestyleProtocol
    } else {
        ElementCategory::Supplement
    }
}

/// Resolve an item's category: explicit tag first, legacy inference otherwise.
pub fn classify(name: &str, tag: Option<&str>) -> (ElementCategory, Classification) {
    match tag.and_then(category_from_tag) {
        Some(category) => (category, Classification::Tagged),
        None => (infer_legacy_category(name), Classification::Inferred),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_map_to_categories() {
        for tag in ["supplement", "Supplements", "binder", "Binder"] {
            assert_eq!(category_from_tag(tag), Some(ElementCategory::Supplement), "{tag}");
        }
        for tag in ["clinic_treatment", "clinic", "IV", "therapy", "ClinicTreatment", "clinic-treatment"] {
            assert_eq!(category_from_tag(tag), Some(ElementCategory::ClinicTreatment), "{tag}");
        }
        for tag in ["lifestyle", "diet", "protocol", "LifestyleProtocol"] {
            assert_eq!(category_from_tag(tag), Some(ElementCategory::LifestyleProtocol), "{tag}");
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert_eq!(category_from_tag("medication"), None);
        assert_eq!(category_from_tag(""), None);
    }

    #[test]
    fn iv_prefix_is_clinic_treatment() {
        assert_eq!(
            infer_legacy_category("IV Glutathione"),
            ElementCategory::ClinicTreatment
        );
    }

    #[test]
    fn clinic_keywords_checked_before_lifestyle() {
        // "sauna" (clinic) and "stress" (lifestyle) both present.
        assert_eq!(
            infer_legacy_category("Infrared sauna for stress"),
            ElementCategory::ClinicTreatment
        );
    }

    #[test]
    fn lifestyle_keywords() {
        assert_eq!(
            infer_legacy_category("Sleep hygiene routine"),
            ElementCategory::LifestyleProtocol
        );
        assert_eq!(
            infer_legacy_category("Elimination Diet"),
            ElementCategory::LifestyleProtocol
        );
    }

    #[test]
    fn default_is_supplement() {
        assert_eq!(
            infer_legacy_category("Magnesium Glycinate"),
            ElementCategory::Supplement
        );
    }

    #[test]
    fn classify_prefers_tag_over_keywords() {
        let (cat, how) = classify("Sauna blend tea", Some("supplement"));
        assert_eq!(cat, ElementCategory::Supplement);
        assert_eq!(how, Classification::Tagged);

        let (cat, how) = classify("Sauna sessions", Some("unknown"));
        assert_eq!(cat, ElementCategory::ClinicTreatment);
        assert_eq!(how, Classification::Inferred);
    }

    #[test]
    fn category_display_roundtrips_through_from_str() {
        for cat in ElementCategory::ALL {
            assert_eq!(cat.to_string().parse::<ElementCategory>().unwrap(), cat);
        }
        assert!("vitamin".parse::<ElementCategory>().is_err());
    }

    #[test]
    fn per_category_serializes_with_report_keys() {
        let counts = PerCategory::from_fn(|c| c.report_key().len());
        let json = serde_json::to_value(&counts).unwrap();
        for cat in ElementCategory::ALL {
            assert_eq!(json[cat.report_key()], cat.report_key().len());
        }
    }
}
