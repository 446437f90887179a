//! Care router — maps a diagnosis record to a nearby-care search.
//!
//! Pure and deterministic: no I/O, no hidden state. The decision policy is
//! evaluated in strict priority order, first match wins:
//!
//! 1. Emergency flag — dominates every other signal.
//! 2. Care-level substring ("urgent", then "primary").
//! 3. Top condition name scanned against the ordered specialty table.
//! 4. General hospitals & urgent care default.
//!
//! The specialty table is an immutable ordered sequence injected into the
//! router (`route_with`), so alternate rule sets are testable in isolation.
//! Table order is the tie-break; do not reorder.

use serde::{Deserialize, Serialize};

use crate::models::DiagnosisRecord;

/// Routing parameters handed to the downstream nearby-care search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyRoute {
    pub label: String,
    pub keyword: String,
    pub place_type: String,
    /// Search radius in meters.
    pub radius: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One row of the specialty rule table.
#[derive(Debug, Clone, Copy)]
pub struct SpecialtyMatcher {
    pub label: &'static str,
    pub keyword: &'static str,
    pub place_type: &'static str,
    pub radius: u32,
    pub note: &'static str,
    /// Substrings matched against the lowercased top condition name.
    pub triggers: &'static [&'static str],
}

impl From<&SpecialtyMatcher> for SpecialtyRoute {
    fn from(matcher: &SpecialtyMatcher) -> Self {
        Self {
            label: matcher.label.to_string(),
            keyword: matcher.keyword.to_string(),
            place_type: matcher.place_type.to_string(),
            radius: matcher.radius,
            note: Some(matcher.note.to_string()),
        }
    }
}

/// Ordered specialty rule table. Declaration order is significant.
pub const SPECIALTY_MATCHERS: &[SpecialtyMatcher] = &[
    SpecialtyMatcher {
        label: "Dermatology clinics",
        keyword: "dermatology clinic",
        place_type: "doctor",
        radius: 7000,
        note: "Skin-focused specialists near you.",
        triggers: &["dermat", "eczema", "psoriasis", "acne", "rash", "skin"],
    },
    SpecialtyMatcher {
        label: "Cardiology specialists",
        keyword: "cardiologist",
        place_type: "doctor",
        radius: 9000,
        note: "Heart-focused care for your symptoms.",
        triggers: &["cardio", "chest pain", "heart", "arrhythm", "angina"],
    },
    SpecialtyMatcher {
        label: "Neurology specialists",
        keyword: "neurologist",
        place_type: "doctor",
        radius: 9000,
        note: "Brain and nerve specialists near you.",
        triggers: &["neuro", "brain", "migraine", "stroke", "seiz", "nerve"],
    },
    SpecialtyMatcher {
        label: "Pulmonology & respiratory care",
        keyword: "pulmonologist",
        place_type: "doctor",
        radius: 9000,
        note: "Breathing and lung experts close by.",
        triggers: &["asthma", "respir", "lung", "pulmon", "copd", "bronch"],
    },
    SpecialtyMatcher {
        label: "Orthopedic & injury clinics",
        keyword: "orthopedic clinic",
        place_type: "doctor",
        radius: 9000,
        note: "Bone, joint, and sports medicine support.",
        triggers: &["orthoped", "fracture", "sprain", "joint", "bone", "muscle"],
    },
    SpecialtyMatcher {
        label: "Mental health clinics",
        keyword: "mental health clinic",
        place_type: "doctor",
        radius: 8000,
        note: "Behavioral health and therapy resources.",
        triggers: &["mental", "anxiety", "depress", "psych", "ptsd", "stress"],
    },
    SpecialtyMatcher {
        label: "Endocrinology specialists",
        keyword: "endocrinologist",
        place_type: "doctor",
        radius: 9000,
        note: "Hormone and metabolic care near you.",
        triggers: &["endocr", "diabet", "thyroid", "hormone"],
    },
    SpecialtyMatcher {
        label: "Allergy & immunology clinics",
        keyword: "allergist",
        place_type: "doctor",
        radius: 8000,
        note: "Allergy-focused clinics around you.",
        triggers: &["allerg", "immun", "hives"],
    },
    SpecialtyMatcher {
        label: "OB/GYN & reproductive health",
        keyword: "obgyn",
        place_type: "doctor",
        radius: 8000,
        note: "Reproductive care and prenatal support.",
        triggers: &["preg", "ob", "gyn", "uterus", "menstru", "fertility"],
    },
    SpecialtyMatcher {
        label: "Urology & kidney clinics",
        keyword: "urologist",
        place_type: "doctor",
        radius: 9000,
        note: "Kidney and urinary health specialists.",
        triggers: &["urolog", "kidney", "renal", "urinary", "prostate"],
    },
    SpecialtyMatcher {
        label: "Pediatric care centers",
        keyword: "pediatric clinic",
        place_type: "doctor",
        radius: 7000,
        note: "Care teams experienced with children.",
        triggers: &["pediatric", "child", "infant", "newborn"],
    },
    SpecialtyMatcher {
        label: "Gastroenterology clinics",
        keyword: "gastroenterologist",
        place_type: "doctor",
        radius: 9000,
        note: "Digestive health experts near you.",
        triggers: &["gastro", "stomach", "abdomen", "ulcer", "digest", "ibd"],
    },
    SpecialtyMatcher {
        label: "Ophthalmology & eye care",
        keyword: "ophthalmologist",
        place_type: "doctor",
        radius: 7000,
        note: "Eye and vision specialists nearby.",
        triggers: &["eye", "vision", "optic", "glaucoma"],
    },
];

/// Fixed route for emergency-flagged records. Overrides everything else.
pub fn emergency_route() -> SpecialtyRoute {
    SpecialtyRoute {
        label: "Emergency departments near you".into(),
        keyword: "emergency room".into(),
        place_type: "hospital".into(),
        radius: 10_000,
        note: Some("Call for emergency services if travel feels unsafe.".into()),
    }
}

pub fn urgent_care_route() -> SpecialtyRoute {
    SpecialtyRoute {
        label: "Urgent care centers".into(),
        keyword: "urgent care".into(),
        place_type: "hospital".into(),
        radius: 8_000,
        note: Some("Walk-in urgent care clinics nearby.".into()),
    }
}

pub fn primary_care_route() -> SpecialtyRoute {
    SpecialtyRoute {
        label: "Primary care clinics".into(),
        keyword: "primary care doctor".into(),
        place_type: "doctor".into(),
        radius: 8_000,
        note: Some("Family doctors who can coordinate next steps.".into()),
    }
}

/// General hospitals & urgent care — the route of last resort.
pub fn default_route() -> SpecialtyRoute {
    SpecialtyRoute {
        label: "Hospitals & urgent care".into(),
        keyword: String::new(),
        place_type: "hospital".into(),
        radius: 7_000,
        note: Some("General hospitals and clinics around you.".into()),
    }
}

/// Route a record using the built-in specialty table.
pub fn route(record: &DiagnosisRecord) -> SpecialtyRoute {
    route_with(SPECIALTY_MATCHERS, record)
}

/// Route a record against an injected rule table.
pub fn route_with(matchers: &[SpecialtyMatcher], record: &DiagnosisRecord) -> SpecialtyRoute {
    if record.emergency {
        return emergency_route();
    }

    let care_level = record.recommended_care_level.to_lowercase();
    if care_level.contains("urgent") {
        return urgent_care_route();
    }
    if care_level.contains("primary") {
        return primary_care_route();
    }

    let condition = record
        .primary_condition()
        .unwrap_or("")
        .to_lowercase()
        .trim()
        .to_string();
    if !condition.is_empty() {
        let matched = matchers
            .iter()
            .find(|m| m.triggers.iter().any(|t| condition.contains(t)));
        if let Some(matcher) = matched {
            return matcher.into();
        }
    }

    default_route()
}
