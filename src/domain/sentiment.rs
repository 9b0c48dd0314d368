//! Fear & Greed sentiment buckets and daily observations.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// The five ordered Fear & Greed buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sentiment {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl Sentiment {
    /// All buckets, fearful to greedy. Every per-sentiment table is indexed in this order.
    pub const ALL: [Sentiment; 5] = [
        Sentiment::ExtremeFear,
        Sentiment::Fear,
        Sentiment::Neutral,
        Sentiment::Greed,
        Sentiment::ExtremeGreed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::ExtremeFear => "Extreme Fear",
            Sentiment::Fear => "Fear",
            Sentiment::Neutral => "Neutral",
            Sentiment::Greed => "Greed",
            Sentiment::ExtremeGreed => "Extreme Greed",
        }
    }

    /// Ordinal score, 1 (Extreme Fear) through 5 (Extreme Greed).
    pub fn score(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Position in [`Sentiment::ALL`].
    pub fn index(self) -> usize {
        match self {
            Sentiment::ExtremeFear => 0,
            Sentiment::Fear => 1,
            Sentiment::Neutral => 2,
            Sentiment::Greed => 3,
            Sentiment::ExtremeGreed => 4,
        }
    }

    /// Chart colour, red through green.
    pub fn color(self) -> &'static str {
        match self {
            Sentiment::ExtremeFear => "#d32f2f",
            Sentiment::Fear => "#f57c00",
            Sentiment::Neutral => "#fbc02d",
            Sentiment::Greed => "#7cb342",
            Sentiment::ExtremeGreed => "#388e3c",
        }
    }

    /// Map a published classification to a bucket. Unknown labels fall back to `Neutral`.
    pub fn from_classification(raw: &str) -> Self {
        raw.parse().unwrap_or(Sentiment::Neutral)
    }

    /// Short form used in query strings.
    pub fn slug(self) -> &'static str {
        match self {
            Sentiment::ExtremeFear => "extreme-fear",
            Sentiment::Fear => "fear",
            Sentiment::Neutral => "neutral",
            Sentiment::Greed => "greed",
            Sentiment::ExtremeGreed => "extreme-greed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSentiment(pub String);

impl fmt::Display for UnknownSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sentiment '{}'", self.0)
    }
}

impl std::error::Error for UnknownSentiment {}

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    /// Accepts the published labels ("Extreme Fear") and slugs ("extreme-fear"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(exact) = Sentiment::ALL.iter().find(|b| b.label() == trimmed) {
            return Ok(*exact);
        }
        let normalized = trimmed.to_lowercase().replace(['_', ' '], "-");
        Sentiment::ALL
            .iter()
            .find(|b| b.slug() == normalized)
            .copied()
            .ok_or_else(|| UnknownSentiment(trimmed.to_string()))
    }
}

/// One published daily index reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentObservation {
    pub date: NaiveDate,
    pub value: f64,
    pub classification: String,
}

impl SentimentObservation {
    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_classification(&self.classification)
    }
}
