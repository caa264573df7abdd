//! Verdict: the terminal scorecard of a research run

use serde::{Deserialize, Deserializer, Serialize};

/// What the founder should do with the idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Build,
    Explore,
    Pivot,
    Abandon,
}

impl Recommendation {
    /// Convert from LLM text (case-insensitive, tolerant of synonyms).
    ///
    /// Unknown text maps to `Explore`, the non-committal middle ground.
    pub fn from_str_loose(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("abandon") || lower.contains("drop") || lower.contains("kill") {
            Recommendation::Abandon
        } else if lower.contains("pivot") || lower.contains("rethink") {
            Recommendation::Pivot
        } else if lower.contains("build") || lower.contains("go ahead") || lower.contains("proceed") {
            Recommendation::Build
        } else {
            Recommendation::Explore
        }
    }

    /// Default mapping from a 0-100 score.
    pub fn from_score(score: u8) -> Self {
        match score {
            75..=100 => Recommendation::Build,
            50..=74 => Recommendation::Explore,
            30..=49 => Recommendation::Pivot,
            _ => Recommendation::Abandon,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Build => write!(f, "build"),
            Recommendation::Explore => write!(f, "explore"),
            Recommendation::Pivot => write!(f, "pivot"),
            Recommendation::Abandon => write!(f, "abandon"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTiming {
    TooEarly,
    Emerging,
    Ripe,
    Saturated,
}

impl MarketTiming {
    pub fn from_str_loose(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("early") {
            MarketTiming::TooEarly
        } else if lower.contains("saturat") || lower.contains("crowded") || lower.contains("late") {
            MarketTiming::Saturated
        } else if lower.contains("ripe") || lower.contains("now") || lower.contains("right") {
            MarketTiming::Ripe
        } else {
            MarketTiming::Emerging
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Competition {
    Low,
    Moderate,
    High,
}

impl Competition {
    pub fn from_str_loose(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("high") || lower.contains("intense") || lower.contains("crowded") {
            Competition::High
        } else if lower.contains("low") || lower.contains("none") || lower.contains("minimal") {
            Competition::Low
        } else {
            Competition::Moderate
        }
    }

    /// Rough level from the number of competitor posts seen.
    pub fn from_mentions(competitor_posts: usize) -> Self {
        match competitor_posts {
            0..=4 => Competition::Low,
            5..=24 => Competition::Moderate,
            _ => Competition::High,
        }
    }
}

/// Which tier of the synthesis produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOrigin {
    /// Full synthesis prompt parsed cleanly
    Synthesis,
    /// Simplified second-chance prompt
    Simplified,
    /// Built from run state alone, no LLM
    Fallback,
}

/// Final scorecard. Created once by the verdict stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// 0-100
    pub score: u8,
    pub recommendation: Recommendation,
    pub market_timing: MarketTiming,
    pub competition: Competition,
    pub headline: String,
    pub summary: String,
    pub target_audience: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
    pub origin: VerdictOrigin,
}

/// Verdict as the LLM returns it; every field optional and loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerdictDraft {
    #[serde(deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    pub recommendation: Option<String>,
    pub market_timing: Option<String>,
    pub competition: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub target_audience: Option<String>,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
}

impl VerdictDraft {
    /// A draft is usable once it carries a score and some narrative.
    pub fn is_usable(&self) -> bool {
        self.score.is_some_and(f64::is_finite)
            && (self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
                || self.headline.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Normalize into a [`Verdict`], clamping the score into 0-100.
    pub fn into_verdict(self, origin: VerdictOrigin) -> Verdict {
        let score = clamp_score(self.score.unwrap_or(0.0));
        let recommendation = self
            .recommendation
            .as_deref()
            .map_or_else(|| Recommendation::from_score(score), Recommendation::from_str_loose);
        let summary = self.summary.unwrap_or_default();
        Verdict {
            score,
            recommendation,
            market_timing: self
                .market_timing
                .as_deref()
                .map_or(MarketTiming::Emerging, MarketTiming::from_str_loose),
            competition: self
                .competition
                .as_deref()
                .map_or(Competition::Moderate, Competition::from_str_loose),
            headline: self.headline.unwrap_or_else(|| first_sentence(&summary)),
            summary,
            target_audience: self.target_audience.unwrap_or_default(),
            strengths: self.strengths,
            risks: self.risks,
            next_steps: self.next_steps,
            origin,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_score(raw: f64) -> u8 {
    if raw.is_finite() {
        raw.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn first_sentence(text: &str) -> String {
    text.split_terminator(['.', '!', '?'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Accept `72`, `72.5` or `"72"` for the score.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_from_loose_text() {
        assert_eq!(Recommendation::from_str_loose("BUILD it"), Recommendation::Build);
        assert_eq!(Recommendation::from_str_loose("pivot"), Recommendation::Pivot);
        assert_eq!(Recommendation::from_str_loose("Abandon"), Recommendation::Abandon);
        assert_eq!(Recommendation::from_str_loose("unclear"), Recommendation::Explore);
    }

    #[test]
    fn draft_score_is_clamped_and_lenient() {
        let draft: VerdictDraft =
            serde_json::from_str(r#"{"score": "140", "summary": "Strong pull."}"#).unwrap();
        let verdict = draft.into_verdict(VerdictOrigin::Synthesis);
        assert_eq!(verdict.score, 100);
        assert_eq!(verdict.recommendation, Recommendation::Build);
        assert_eq!(verdict.headline, "Strong pull");
    }

    #[test]
    fn draft_without_score_is_not_usable() {
        let draft: VerdictDraft = serde_json::from_str(r#"{"summary": "text"}"#).unwrap();
        assert!(!draft.is_usable());
    }

    #[test]
    fn verdict_serializes_closed_enums_in_snake_case() {
        let draft: VerdictDraft = serde_json::from_str(
            r#"{"score": 61, "recommendation": "explore", "market_timing": "too early",
                "competition": "high", "headline": "h"}"#,
        )
        .unwrap();
        let json = serde_json::to_value(draft.into_verdict(VerdictOrigin::Simplified)).unwrap();
        assert_eq!(json["recommendation"], "explore");
        assert_eq!(json["market_timing"], "too_early");
        assert_eq!(json["competition"], "high");
        assert_eq!(json["origin"], "simplified");
    }
}
