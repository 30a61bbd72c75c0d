use serde_json::{json, Value};

/// System prompt for trend discovery. Shared by both providers.
pub const TREND_SYSTEM_PROMPT: &str = r#"You are the Austpek Trend & Ad Strategist.
Simulate a search for viral bathroom trends focusing on #bathroomvanity, #luxuryrenovation, and #homedesign across US, UK, and AU.
Identify "Trend Lag": what is big in the US/UK that hasn't hit Australia yet.
Return a strict JSON response."#;

/// System prompt for creative rating. The rubric lives here and only here so
/// the provider choice can never change what a creative is scored against.
pub const GEM_SYSTEM_PROMPT: &str = r#"You are the Austpek Trend & Ad Strategist. Your goal is to rate ads using the 2026 Meta GEM framework.

Meta GEM 2026 Rating Criteria:
1. Creative Diversity (0-25 pts): Does the ad offer a unique visual style compared to generic bathroom ads?
2. Visual Signal (0-25 pts): Are textures like fluted wood, brushed brass, or stone clearly visible for AI detection?
3. Hook Velocity (0-25 pts): Does the visual "stop the scroll" in under 1 second?
4. Intent Match (0-25 pts): Does the ad target a specific 2026 trend (e.g., "Home Spa" or "Japandi")?

Analyze the provided image or video frame. Return a strict JSON response."#;

pub const TREND_USER_INSTRUCTION: &str =
    "Find current viral bathroom trends for US, UK, and AU. Focus on 'Trend Lag'. Return JSON only.";

pub const GEM_USER_INSTRUCTION: &str =
    "Analyze this creative against the Meta GEM 2026 framework. Return valid JSON.";

/// Spelled-out output shape for calls that can't carry a schema.
const TREND_SHAPE_HINT: &str = "Return the result as a strict JSON array of objects with keys: \
region (one of US, UK, AU), topic, description, viralScore (integer 0-100), trendLagStatus, hashtags (array of strings).";

const GEM_SHAPE_HINT: &str = "Return a JSON object with keys: totalScore (integer, sum of all scores), \
breakdown (object with integer keys creativeDiversity, visualSignal, hookVelocity, intentMatch), \
reasoning (object with string keys creativeDiversity, visualSignal, hookVelocity, intentMatch), \
matchedTrend (string), improvementTips (array of 3 strings).";

/// Trend system prompt, with the shape spelled out when no schema is sent.
pub fn trend_system_prompt(with_shape_hint: bool) -> String {
    with_hint(TREND_SYSTEM_PROMPT, with_shape_hint.then_some(TREND_SHAPE_HINT))
}

/// GEM system prompt, with the shape spelled out when no schema is sent.
pub fn gem_system_prompt(with_shape_hint: bool) -> String {
    with_hint(GEM_SYSTEM_PROMPT, with_shape_hint.then_some(GEM_SHAPE_HINT))
}

fn with_hint(base: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!("{base}\n{hint}"),
        None => base.to_string(),
    }
}

/// Response schema for a trend report, in Gemini's schema dialect.
pub fn trend_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "region": { "type": "STRING", "enum": ["US", "UK", "AU"] },
                "topic": { "type": "STRING" },
                "description": { "type": "STRING" },
                "viralScore": { "type": "INTEGER" },
                "trendLagStatus": {
                    "type": "STRING",
                    "description": "Explanation of the trend lag between regions"
                },
                "hashtags": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["region", "topic", "description", "viralScore", "trendLagStatus", "hashtags"]
        }
    })
}

/// Response schema for a GEM report, in Gemini's schema dialect.
pub fn gem_schema() -> Value {
    let dimensions = ["creativeDiversity", "visualSignal", "hookVelocity", "intentMatch"];
    let scores: serde_json::Map<String, Value> = dimensions
        .iter()
        .map(|d| (d.to_string(), json!({ "type": "INTEGER" })))
        .collect();
    let reasons: serde_json::Map<String, Value> = dimensions
        .iter()
        .map(|d| (d.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "totalScore": { "type": "INTEGER", "description": "Sum of all scores" },
            "breakdown": { "type": "OBJECT", "properties": scores, "required": dimensions },
            "reasoning": { "type": "OBJECT", "properties": reasons, "required": dimensions },
            "matchedTrend": {
                "type": "STRING",
                "description": "The specific 2026 trend this ad targets"
            },
            "improvementTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3 actionable tips to improve the GEM score"
            }
        },
        "required": ["totalScore", "breakdown", "reasoning", "matchedTrend", "improvementTips"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{GemReasoning, GemReport, GemScoreBreakdown, Region, TrendItem};

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect()
    }

    fn sample_report() -> GemReport {
        GemReport {
            total_score: 80,
            breakdown: GemScoreBreakdown {
                creative_diversity: 20,
                visual_signal: 20,
                hook_velocity: 20,
                intent_match: 20,
            },
            reasoning: GemReasoning {
                creative_diversity: "a".into(),
                visual_signal: "b".into(),
                hook_velocity: "c".into(),
                intent_match: "d".into(),
            },
            matched_trend: "Japandi".into(),
            improvement_tips: vec!["tip".into()],
        }
    }

    #[test]
    fn trend_schema_matches_trend_item() {
        let item = TrendItem {
            region: Region::Au,
            topic: "t".into(),
            description: "d".into(),
            viral_score: 50,
            trend_lag_status: "s".into(),
            hashtags: vec![],
        };
        let wire = serde_json::to_value(&item).unwrap();
        let schema = trend_schema();
        let keys = required(&schema["items"]);
        assert_eq!(keys.len(), wire.as_object().unwrap().len());
        for key in keys {
            assert!(wire.get(key).is_some(), "schema key {key} missing from TrendItem");
        }
    }

    #[test]
    fn gem_schema_matches_gem_report() {
        let wire = serde_json::to_value(sample_report()).unwrap();
        let schema = gem_schema();
        for key in required(&schema) {
            assert!(wire.get(key).is_some(), "schema key {key} missing from GemReport");
        }
        for nested in ["breakdown", "reasoning"] {
            for key in required(&schema["properties"][nested]) {
                assert!(wire[nested].get(key).is_some(), "{nested}.{key} missing");
            }
        }
    }

    #[test]
    fn hints_extend_the_same_rubric() {
        let hinted = gem_system_prompt(true);
        assert!(hinted.starts_with(GEM_SYSTEM_PROMPT));
        assert!(hinted.contains("improvementTips"));
        assert_eq!(gem_system_prompt(false), GEM_SYSTEM_PROMPT);
    }

    #[test]
    fn trend_hint_names_every_field() {
        let hinted = trend_system_prompt(true);
        for key in ["region", "topic", "description", "viralScore", "trendLagStatus", "hashtags"] {
            assert!(hinted.contains(key));
        }
        assert_eq!(trend_system_prompt(false), TREND_SYSTEM_PROMPT);
    }

    #[test]
    fn rubric_has_four_dimensions() {
        assert_eq!(GEM_SYSTEM_PROMPT.matches("(0-25 pts)").count(), 4);
    }
}
