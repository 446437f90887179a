use serde::{Deserialize, Serialize};

/// One candidate condition, ranked by the model (descending probability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    /// Likelihood label as produced by the model: "High" | "Medium" | "Low".
    pub probability: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prevention_tips: Vec<String>,
}

/// Canonical structured output of one inference call.
///
/// `conditions` carries at least one entry when the model honored its
/// contract; the parse-fallback record (see `triage::normalize`) is the only
/// place an empty list is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub summary: String,
    pub emergency: bool,
    pub emergency_reason: String,
    pub conditions: Vec<Condition>,
    pub recommended_care_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub self_care_tips: Vec<String>,
}

impl DiagnosisRecord {
    /// Name of the top-ranked condition, if any.
    pub fn primary_condition(&self) -> Option<&str> {
        self.conditions.first().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DiagnosisRecord {
        DiagnosisRecord {
            summary: "Likely contact dermatitis from a plant exposure.".into(),
            emergency: false,
            emergency_reason: "No systemic symptoms reported.".into(),
            conditions: vec![Condition {
                name: "Contact dermatitis".into(),
                probability: "High".into(),
                description: "Local inflammatory skin reaction.".into(),
                recommended_actions: vec!["Wash the area with mild soap".into()],
                medications: vec!["Hydrocortisone 1% cream".into()],
                prevention_tips: vec![],
            }],
            recommended_care_level: "Home care".into(),
            follow_up: Some("See a doctor if the rash spreads.".into()),
            self_care_tips: vec!["Avoid scratching".into()],
        }
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"emergencyReason\""));
        assert!(json.contains("\"recommendedCareLevel\""));
        assert!(json.contains("\"followUp\""));
        assert!(json.contains("\"selfCareTips\""));
        assert!(json.contains("\"recommendedActions\""));
    }

    #[test]
    fn round_trips_through_json() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: DiagnosisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{
            "summary": "s",
            "emergency": false,
            "emergencyReason": "",
            "conditions": [{"name": "Flu", "probability": "Medium", "description": "Viral infection"}],
            "recommendedCareLevel": "Primary care"
        }"#;
        let record: DiagnosisRecord = serde_json::from_str(json).unwrap();
        assert!(record.follow_up.is_none());
        assert!(record.self_care_tips.is_empty());
        assert!(record.conditions[0].recommended_actions.is_empty());
        assert!(record.conditions[0].medications.is_empty());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        // No recommendedCareLevel — strict parse must fail so the
        // normalizer can fall back.
        let json = r#"{
            "summary": "s",
            "emergency": false,
            "emergencyReason": "",
            "conditions": []
        }"#;
        assert!(serde_json::from_str::<DiagnosisRecord>(json).is_err());
    }

    #[test]
    fn primary_condition_name() {
        let record = sample_record();
        assert_eq!(record.primary_condition(), Some("Contact dermatitis"));

        let empty = DiagnosisRecord {
            conditions: vec![],
            ..record
        };
        assert!(empty.primary_condition().is_none());
    }
}
