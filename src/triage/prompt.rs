//! Fixed instruction prompt and strict output schema for the inference call.

use serde_json::{json, Value};

pub const DIAGNOSIS_SYSTEM_PROMPT: &str = r#"
You are Herb, an AI health assistant. You analyze a patient's free-text
symptom description, together with any attached photos, and produce a
structured triage assessment.

RULES — ABSOLUTE, NO EXCEPTIONS:
1. Base every statement on the symptoms and photos actually provided.
2. Rank possible conditions from most to least likely. Label each with a
   probability of exactly "High", "Medium", or "Low".
3. Set "emergency" to true whenever the presentation could plausibly be
   life-threatening (e.g. crushing chest pain, stroke signs, anaphylaxis,
   uncontrolled bleeding). Be conservative: when in doubt, flag it.
4. Always explain the emergency decision in "emergencyReason", including
   when emergency is false.
5. "recommendedCareLevel" is a short phrase such as "Emergency care",
   "Urgent care", "Primary care", or "Home care".
6. You are not a doctor and never prescribe. Suggested medications are
   over-the-counter options to discuss with a professional.
7. Respond with a single JSON object matching the provided schema. No
   Markdown, no commentary outside the JSON.
"#;

/// Strict response schema sent alongside the system instruction.
///
/// The required list pins the canonical envelope: a response missing any of
/// these fields is treated as schema-nonconforming and absorbed by the
/// normalizer, never surfaced to the caller.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "emergency": { "type": "BOOLEAN" },
            "emergencyReason": { "type": "STRING" },
            "conditions": {
                "type": "ARRAY",
                "minItems": 1,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "probability": {
                            "type": "STRING",
                            "enum": ["High", "Medium", "Low"]
                        },
                        "description": { "type": "STRING" },
                        "recommendedActions": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        },
                        "medications": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        },
                        "preventionTips": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        }
                    },
                    "required": ["name", "probability", "description"]
                }
            },
            "recommendedCareLevel": { "type": "STRING" },
            "followUp": { "type": "STRING" },
            "selfCareTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": [
            "summary",
            "emergency",
            "emergencyReason",
            "conditions",
            "recommendedCareLevel"
        ]
    })
}

/// Build the user-visible part of the prompt from the narrative.
pub fn build_user_prompt(narrative: &str) -> String {
    if narrative.is_empty() {
        "The patient provided no written description. Analyze the attached \
         photos and describe what you observe."
            .to_string()
    } else {
        format!("Patient's symptom description:\n\n{narrative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_pins_required_envelope() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec![
                "summary",
                "emergency",
                "emergencyReason",
                "conditions",
                "recommendedCareLevel"
            ]
        );
    }

    #[test]
    fn schema_requires_at_least_one_condition() {
        let schema = response_schema();
        assert_eq!(schema["properties"]["conditions"]["minItems"], 1);
    }

    #[test]
    fn probability_labels_are_enumerated() {
        let schema = response_schema();
        let labels = &schema["properties"]["conditions"]["items"]["properties"]
            ["probability"]["enum"];
        assert_eq!(labels, &json!(["High", "Medium", "Low"]));
    }

    #[test]
    fn system_prompt_demands_json_only() {
        assert!(DIAGNOSIS_SYSTEM_PROMPT.contains("single JSON object"));
        assert!(DIAGNOSIS_SYSTEM_PROMPT.contains("emergencyReason"));
    }

    #[test]
    fn user_prompt_embeds_narrative() {
        let prompt = build_user_prompt("red itchy rash after hiking");
        assert!(prompt.contains("red itchy rash after hiking"));
    }

    #[test]
    fn user_prompt_handles_photo_only_submission() {
        let prompt = build_user_prompt("");
        assert!(prompt.contains("attached"));
        assert!(prompt.contains("photos"));
    }
}
