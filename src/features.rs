//! Discrete feature extraction and matching: sterilization, materials, standards

use crate::text::normalize;
use crate::types::{FeatureScore, Sterilization, SubjectDeviceProfile};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

pub const STERILIZATION_MAX: f32 = 15.0;
pub const MATERIALS_MAX: f32 = 10.0;
pub const STANDARDS_MAX: f32 = 5.0;

/// Canonical material name and the spellings that map to it
const MATERIAL_VOCABULARY: &[(&str, &[&str])] = &[
    ("titanium", &["titanium", "ti-6al-4v", "ti6al4v"]),
    ("stainless steel", &["stainless steel", "316l", "304 stainless"]),
    ("nitinol", &["nitinol", "nickel titanium", "nickel-titanium", "niti"]),
    ("cobalt chromium", &["cobalt chromium", "cobalt-chromium", "cocr", "l605", "mp35n"]),
    ("platinum", &["platinum", "platinum iridium", "pt-ir"]),
    ("polyurethane", &["polyurethane", "pellethane", "tecoflex"]),
    ("silicone", &["silicone", "polysiloxane", "pdms"]),
    ("ptfe", &["ptfe", "teflon", "polytetrafluoroethylene", "eptfe"]),
    ("peek", &["peek", "polyetheretherketone", "polyether ether ketone"]),
    ("polyethylene", &["polyethylene", "uhmwpe", "hdpe", "ldpe"]),
    ("polypropylene", &["polypropylene"]),
    ("nylon", &["nylon", "polyamide"]),
    ("pebax", &["pebax", "polyether block amide"]),
    ("polycarbonate", &["polycarbonate"]),
    ("pvc", &["pvc", "polyvinyl chloride"]),
    ("polyester", &["polyester", "dacron", "polyethylene terephthalate"]),
    ("polyimide", &["polyimide"]),
    ("hydroxyapatite", &["hydroxyapatite"]),
    ("ceramic", &["ceramic", "alumina", "zirconia"]),
    ("collagen", &["collagen"]),
    ("hydrogel", &["hydrogel"]),
    ("latex", &["latex", "natural rubber"]),
];

fn sterilization_patterns() -> &'static [(Sterilization, Regex)] {
    static PATTERNS: OnceLock<Vec<(Sterilization, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Priority order: first match wins
        [
            (
                Sterilization::EthyleneOxide,
                r"\bethylene[\s-]*oxide\b|\beto\b|\beo[\s-]+(?:gas|steril\w*)",
            ),
            (
                Sterilization::Radiation,
                r"\bgamma\b|\bradiation\b|\birradiat\w*|\be[\s-]?beam\b|\belectron[\s-]+beam\b",
            ),
            (Sterilization::Steam, r"\bsteam\b|\bautoclav\w*|\bmoist\s+heat\b"),
            (
                Sterilization::NonSterile,
                r"\bnon[\s-]?sterile\b|\bnot\s+(?:supplied\s+|provided\s+)?sterile\b",
            ),
        ]
        .into_iter()
        .map(|(method, pattern)| {
            (
                method,
                Regex::new(pattern).expect("sterilization pattern is valid"),
            )
        })
        .collect()
    })
}

/// One alternation over every alias, longest first, so overlapping aliases
/// resolve to the longest spelling ("nickel-titanium" never also yields titanium)
fn material_matcher() -> &'static (Regex, HashMap<&'static str, &'static str>) {
    static MATCHER: OnceLock<(Regex, HashMap<&'static str, &'static str>)> = OnceLock::new();
    MATCHER.get_or_init(|| {
        let mut aliases: Vec<(&'static str, &'static str)> = MATERIAL_VOCABULARY
            .iter()
            .flat_map(|(canonical, aliases)| aliases.iter().map(move |alias| (*alias, *canonical)))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        let alternation = aliases
            .iter()
            .map(|(alias, _)| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"\b(?:{alternation})\b");
        (
            Regex::new(&pattern).expect("material pattern is valid"),
            aliases.into_iter().collect(),
        )
    })
}

/// Canonical name and matched length for each material mention in normalized text
fn material_hits(normalized: &str) -> impl Iterator<Item = (&'static str, usize)> + '_ {
    let (re, canonical) = material_matcher();
    re.find_iter(normalized)
        .filter_map(move |m| canonical.get(m.as_str()).map(|name| (*name, m.len())))
}

fn standard_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // ISO 10993-1, IEC 60601-1-2, EN 556-1
            r"(?i)\b(ISO|IEC|EN|ANSI|UL|IEEE)\s*(\d{2,5}(?:-\d{1,3})*)\b",
            // ASTM F2063, ASTM D4169
            r"(?i)\b(ASTM)\s*([A-Z]\d{2,5})\b",
            // AAMI ST72, AAMI TIR28
            r"(?i)\b(AAMI)\s*((?:ST|TIR)\s*\d{1,3})\b",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("standard pattern is valid"))
        .collect()
    })
}

/// Sterilization method named in free text, by keyword priority
pub fn detect_sterilization(text: &str) -> Option<Sterilization> {
    let text = normalize(text);
    sterilization_patterns()
        .iter()
        .find(|(_, re)| re.is_match(&text))
        .map(|(method, _)| method.clone())
}

/// Map a declared method onto the known set; unknown methods are kept verbatim
pub fn normalize_sterilization(declared: &str) -> Option<Sterilization> {
    let trimmed = declared.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        detect_sterilization(trimmed)
            .unwrap_or_else(|| Sterilization::Other(normalize(trimmed))),
    )
}

pub fn extract_materials(text: &str) -> BTreeSet<String> {
    let text = normalize(text);
    material_hits(&text)
        .map(|(canonical, _)| canonical.to_string())
        .collect()
}

pub fn canonical_material(declared: &str) -> Option<String> {
    let normalized = normalize(declared.trim());
    if normalized.is_empty() {
        return None;
    }
    let best = material_hits(&normalized)
        .max_by_key(|(_, len)| *len)
        .map(|(canonical, _)| canonical.to_string());
    Some(best.unwrap_or_else(|| collapse_whitespace(&normalized)))
}

pub fn extract_standards(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for re in standard_patterns() {
        for caps in re.captures_iter(text) {
            found.insert(format_standard(&caps[1], &caps[2]));
        }
    }
    found
}

pub fn canonical_standard(declared: &str) -> Option<String> {
    let trimmed = declared.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = standard_patterns().iter().find_map(|re| {
        re.captures(trimmed)
            .map(|caps| format_standard(&caps[1], &caps[2]))
    });
    Some(parsed.unwrap_or_else(|| collapse_whitespace(trimmed).to_uppercase()))
}

fn format_standard(org: &str, number: &str) -> String {
    let number: String = number.split_whitespace().collect();
    format!("{} {}", org.to_uppercase(), number.to_uppercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Subject-side features, canonicalized once per run
#[derive(Debug, Clone, Default)]
pub struct SubjectFeatures {
    pub sterilization: Option<Sterilization>,
    pub materials: BTreeSet<String>,
    pub standards: BTreeSet<String>,
}

impl SubjectFeatures {
    pub fn from_profile(subject: &SubjectDeviceProfile) -> Self {
        Self {
            sterilization: subject
                .sterilization_method
                .as_deref()
                .and_then(normalize_sterilization),
            materials: subject
                .materials
                .iter()
                .filter_map(|m| canonical_material(m))
                .collect(),
            standards: subject
                .standards_referenced
                .iter()
                .filter_map(|s| canonical_standard(s))
                .collect(),
        }
    }

    /// Points the subject's declarations make reachable
    pub fn applicable_max(&self) -> f32 {
        let mut max = 0.0;
        if self.sterilization.is_some() {
            max += STERILIZATION_MAX;
        }
        if !self.materials.is_empty() {
            max += MATERIALS_MAX;
        }
        if !self.standards.is_empty() {
            max += STANDARDS_MAX;
        }
        max
    }
}

fn sterilization_points(subject: Option<&Sterilization>, cand: Option<&Sterilization>) -> f32 {
    match (subject, cand) {
        (Some(a), Some(b)) if a == b => STERILIZATION_MAX,
        (Some(a), Some(b)) if a.is_terminal() && b.is_terminal() => STERILIZATION_MAX / 2.0,
        _ => 0.0,
    }
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let union = a.union(b).count();
    a.intersection(b).count() as f32 / union as f32
}

/// Score one candidate's free text against the subject's declared features
pub fn score_features(subject: &SubjectFeatures, candidate_text: &str) -> FeatureScore {
    let candidate_sterilization = detect_sterilization(candidate_text);
    let cand_materials = extract_materials(candidate_text);
    let cand_standards = extract_standards(candidate_text);

    let sterilization = sterilization_points(
        subject.sterilization.as_ref(),
        candidate_sterilization.as_ref(),
    );
    let materials = jaccard(&subject.materials, &cand_materials) * MATERIALS_MAX;

    let matched_standards: Vec<String> = subject
        .standards
        .intersection(&cand_standards)
        .cloned()
        .collect();
    let standards = if subject.standards.is_empty() {
        0.0
    } else {
        matched_standards.len() as f32 / subject.standards.len() as f32 * STANDARDS_MAX
    };

    let raw_total = sterilization + materials + standards;
    let applicable_max = subject.applicable_max();
    let normalized = (applicable_max > 0.0).then(|| (raw_total / applicable_max * 100.0).min(100.0));

    FeatureScore {
        sterilization,
        materials,
        standards,
        raw_total,
        applicable_max,
        normalized,
        candidate_sterilization,
        matched_materials: subject
            .materials
            .intersection(&cand_materials)
            .cloned()
            .collect(),
        matched_standards,
    }
}
