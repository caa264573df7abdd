//! Keyword heuristics for classifying social posts and profiles
//!
//! All functions are pure, stateless text filters. They are deliberately
//! simple: the pipeline's value comes from aggregate counts, not from the
//! precision of any single classification.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::ScoringConfig;
use crate::config::defaults::{DEMAND_ENGAGEMENT_SATURATION, DEMAND_VOLUME_SATURATION};
use crate::types::{SentimentBreakdown, UserProfile};

/// At most this many keywords are taken from an idea.
pub const MAX_KEYWORDS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "your", "you", "our", "are",
    "app", "apps", "tool", "tools", "platform", "based", "using", "who", "which", "their",
    "will", "can", "help", "helps", "people", "new", "way", "all", "any", "via", "about",
];

const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "amazing", "awesome", "excited", "helpful", "recommend", "game changer",
    "finally", "best", "useful", "perfect",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "terrible", "awful", "worst", "broken", "useless", "disappointed", "annoying",
    "waste", "scam", "frustrating",
];

const PAIN_PHRASES: &[&str] = &[
    "frustrat", "struggl", "annoying", "hate when", "wish there was", "wish someone",
    "why is there no", "can't find", "cannot find", "so hard to", "pain in the", "nightmare",
    "tired of", "sick of", "need a better", "is there an app", "looking for a tool",
];

const INVESTOR_MARKERS: &[&str] = &[
    "investor", "venture", " vc", "vc ", "angel", "general partner", "managing partner",
    "partner at", "pre-seed", "seed fund", "capital", "ventures", "portfolio",
];

const FUNDING_PHRASES: &[&str] = &[
    "raised", "funding", "seed round", "series a", "series b", "pre-seed", "backed by",
    "investment", "valuation",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9+#\-]*").expect("static regex is valid"))
}

/// Significant lowercase keywords of an idea, in order of appearance.
pub fn keywords(idea: &str) -> Vec<String> {
    let lower = idea.to_lowercase();
    let mut seen = HashSet::new();
    word_regex()
        .find_iter(&lower)
        .map(|m| m.as_str().trim_matches('-'))
        .filter(|w| w.len() >= 3 && !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Keywords joined by spaces; the trimmed idea when nothing survives filtering.
pub fn keyword_phrase(idea: &str) -> String {
    let words = keywords(idea);
    if words.is_empty() {
        idea.trim().to_lowercase()
    } else {
        words.join(" ")
    }
}

/// True when `text` mentions at least one of `keywords`.
pub fn mentions_any(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

fn contains_any(lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| lower.contains(n))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

pub fn sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Tally sentiment over a set of texts.
pub fn sentiment_breakdown<'a>(texts: impl IntoIterator<Item = &'a str>) -> SentimentBreakdown {
    texts
        .into_iter()
        .fold(SentimentBreakdown::default(), |mut acc, text| {
            match sentiment(text) {
                Sentiment::Positive => acc.positive += 1,
                Sentiment::Negative => acc.negative += 1,
                Sentiment::Neutral => acc.neutral += 1,
            }
            acc
        })
}

/// Post describes a problem someone wants solved.
pub fn is_pain_signal(text: &str) -> bool {
    contains_any(&text.to_lowercase(), PAIN_PHRASES)
}

/// Profile looks like it belongs to an investor.
pub fn is_investor_profile(profile: &UserProfile) -> bool {
    let haystack = format!(" {} {} ", profile.name, profile.bio).to_lowercase();
    contains_any(&haystack, INVESTOR_MARKERS)
}

/// Post talks about raising or deploying money.
pub fn is_funding_post(text: &str) -> bool {
    contains_any(&text.to_lowercase(), FUNDING_PHRASES)
}

/// Weighted 0-100 demand score.
///
/// `volume` saturates at `DEMAND_VOLUME_SATURATION` posts, engagement is
/// log-scaled against `DEMAND_ENGAGEMENT_SATURATION`, and the pain component
/// is the share of posts that read as pain signals.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn demand_score(
    post_count: usize,
    total_engagement: u64,
    pain_posts: usize,
    weights: &ScoringConfig,
) -> u8 {
    if post_count == 0 {
        return 0;
    }
    let volume = (post_count as f64 / DEMAND_VOLUME_SATURATION).min(1.0);
    let engagement = ((1.0 + total_engagement as f64).ln()
        / (1.0 + DEMAND_ENGAGEMENT_SATURATION).ln())
    .min(1.0);
    let pain = (pain_posts as f64 / post_count as f64).min(1.0);

    let raw = 100.0
        * (weights.volume_weight * volume
            + weights.engagement_weight * engagement
            + weights.pain_weight * pain);
    raw.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_drop_stop_words_and_short_tokens() {
        assert_eq!(
            keywords("AI meal planner for diabetics"),
            vec!["meal", "planner", "diabetics"]
        );
        assert_eq!(keyword_phrase("An app for the"), "an app for the");
    }

    #[test]
    fn keywords_are_capped_and_unique() {
        let k = keywords("fitness fitness tracker coach nutrition sleep recovery");
        assert_eq!(k.len(), MAX_KEYWORDS);
        assert_eq!(k[0], "fitness");
        assert_eq!(k[1], "tracker");
    }

    #[test]
    fn classifies_sentiment_and_pain() {
        assert_eq!(sentiment("I love this, game changer"), Sentiment::Positive);
        assert_eq!(sentiment("this is useless and broken"), Sentiment::Negative);
        assert_eq!(sentiment("meal plans"), Sentiment::Neutral);
        assert!(is_pain_signal("So frustrated counting carbs every meal"));
        assert!(!is_pain_signal("Had a nice lunch"));
    }

    #[test]
    fn detects_investor_profiles() {
        let vc = UserProfile {
            handle: "jane".into(),
            bio: "Partner at Acme Ventures. Pre-seed health tech.".into(),
            ..Default::default()
        };
        let founder = UserProfile {
            handle: "bob".into(),
            bio: "Building things with food".into(),
            ..Default::default()
        };
        assert!(is_investor_profile(&vc));
        assert!(!is_investor_profile(&founder));
    }

    #[test]
    fn demand_score_is_bounded_and_monotonic() {
        let weights = ScoringConfig::default();
        assert_eq!(demand_score(0, 0, 0, &weights), 0);
        let low = demand_score(5, 10, 0, &weights);
        let high = demand_score(100, 10_000, 100, &weights);
        assert!(low < high);
        assert_eq!(high, 100);
    }
}
