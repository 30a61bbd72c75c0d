use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Market a trend was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
    #[serde(rename = "AU")]
    Au,
}

/// Models are inconsistent about casing, so the region code is matched
/// case-insensitively. Anything outside the three markets is rejected.
impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Region::Us),
            "UK" => Ok(Region::Uk),
            "AU" => Ok(Region::Au),
            other => Err(de::Error::custom(format!("unknown region `{other}`"))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => write!(f, "US"),
            Region::Uk => write!(f, "UK"),
            Region::Au => write!(f, "AU"),
        }
    }
}

/// One market signal from a trend report.
///
/// `viral_score` is whatever the model said it was; the 0-100 range is a
/// prompt instruction, not something checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendItem {
    pub region: Region,
    pub topic: String,
    pub description: String,
    #[serde(deserialize_with = "integral")]
    pub viral_score: i64,
    pub trend_lag_status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hashtags: Vec<String>,
}

/// A citation returned by a search-grounded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub title: String,
    pub uri: String,
}

/// Result of one trend fetch. Never constructed with an empty `trends`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResponse {
    pub trends: Vec<TrendItem>,
    pub sources: Vec<WebSource>,
}

/// The four GEM sub-scores, each nominally 0-25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemScoreBreakdown {
    #[serde(deserialize_with = "integral")]
    pub creative_diversity: i64,
    #[serde(deserialize_with = "integral")]
    pub visual_signal: i64,
    #[serde(deserialize_with = "integral")]
    pub hook_velocity: i64,
    #[serde(deserialize_with = "integral")]
    pub intent_match: i64,
}

/// Free-text justification for each GEM dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemReasoning {
    pub creative_diversity: String,
    pub visual_signal: String,
    pub hook_velocity: String,
    pub intent_match: String,
}

/// A creative rated against the GEM framework.
///
/// `total_score` is taken as the model reported it. It is not recomputed from
/// the breakdown and may disagree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemReport {
    #[serde(deserialize_with = "integral")]
    pub total_score: i64,
    pub breakdown: GemScoreBreakdown,
    pub reasoning: GemReasoning,
    pub matched_trend: String,
    pub improvement_tips: Vec<String>,
}

impl GemReport {
    /// Each GEM dimension as (label, score, reasoning), in rubric order.
    pub fn dimensions(&self) -> [(&'static str, i64, &str); 4] {
        let b = &self.breakdown;
        let r = &self.reasoning;
        [
            ("Creative Diversity", b.creative_diversity, r.creative_diversity.as_str()),
            ("Visual Signal", b.visual_signal, r.visual_signal.as_str()),
            ("Hook Velocity", b.hook_velocity, r.hook_velocity.as_str()),
            ("Intent Match", b.intent_match, r.intent_match.as_str()),
        ]
    }
}

/// Accept `80` and `80.0` alike. Fractions, strings and anything that
/// doesn't fit an `i64` exactly are rejected.
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    // 2^63 is exact as an f64; `i64::MAX as f64` rounds up to it.
    const UPPER: f64 = 9_223_372_036_854_775_808.0;

    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.is_f64() {
        if let Some(f) = number.as_f64() {
            if f.fract() == 0.0 && f >= -UPPER && f < UPPER {
                return Ok(f as i64);
            }
        }
    }
    Err(de::Error::custom(format!(
        "expected an integer score, got {number}"
    )))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
