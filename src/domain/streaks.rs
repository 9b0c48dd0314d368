//! Consecutive winning and losing trade runs.

use std::collections::BTreeMap;

use super::sentiment::Sentiment;
use super::trade::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Streak {
    pub is_win: bool,
    pub length: usize,
    pub total_pnl: f64,
    /// Most frequent sentiment within the run. Ties go to the more fearful bucket
    /// by index order, not alphabetically by label, so Fear beats Extreme Greed.
    pub dominant_sentiment: Sentiment,
}

/// Split trades, ordered by timestamp, into maximal runs of equal profitability.
pub fn find_streaks(trades: &[&TradeRecord]) -> Vec<Streak> {
    let mut sorted: Vec<&TradeRecord> = trades.to_vec();
    sorted.sort_by_key(|t| t.timestamp);

    let mut streaks = Vec::new();
    let mut start = 0;
    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i].is_profitable != sorted[start].is_profitable {
            streaks.push(summarize(&sorted[start..i]));
            start = i;
        }
    }
    streaks
}

fn summarize(run: &[&TradeRecord]) -> Streak {
    let mut counts = [0usize; 5];
    for t in run {
        counts[t.sentiment.index()] += 1;
    }
    let mut dominant = Sentiment::ALL[0];
    for s in Sentiment::ALL {
        if counts[s.index()] > counts[dominant.index()] {
            dominant = s;
        }
    }
    Streak {
        is_win: run[0].is_profitable,
        length: run.len(),
        total_pnl: run.iter().filter_map(|t| t.net_pnl).sum(),
        dominant_sentiment: dominant,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreakSummary {
    pub longest_win: usize,
    pub longest_loss: usize,
    pub avg_win: Option<f64>,
    pub avg_loss: Option<f64>,
    pub win_streaks: usize,
    pub loss_streaks: usize,
    /// Streak length to (win count, loss count).
    pub distribution: BTreeMap<usize, (usize, usize)>,
    /// Mean (win, loss) streak length per dominant sentiment, in bucket order.
    pub by_sentiment: Vec<(Sentiment, Option<f64>, Option<f64>)>,
}

impl StreakSummary {
    pub fn compute(streaks: &[Streak]) -> Self {
        let wins: Vec<usize> = streaks.iter().filter(|s| s.is_win).map(|s| s.length).collect();
        let losses: Vec<usize> = streaks.iter().filter(|s| !s.is_win).map(|s| s.length).collect();

        let mut distribution: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for s in streaks {
            let entry = distribution.entry(s.length).or_default();
            if s.is_win {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }

        let by_sentiment = Sentiment::ALL
            .iter()
            .map(|&sent| {
                let of = |win: bool| {
                    let lens: Vec<usize> = streaks
                        .iter()
                        .filter(|s| s.dominant_sentiment == sent && s.is_win == win)
                        .map(|s| s.length)
                        .collect();
                    mean_len(&lens)
                };
                (sent, of(true), of(false))
            })
            .collect();

        Self {
            longest_win: wins.iter().copied().max().unwrap_or(0),
            longest_loss: losses.iter().copied().max().unwrap_or(0),
            avg_win: mean_len(&wins),
            avg_loss: mean_len(&losses),
            win_streaks: wins.len(),
            loss_streaks: losses.len(),
            distribution,
            by_sentiment,
        }
    }
}

fn mean_len(lengths: &[usize]) -> Option<f64> {
    if lengths.is_empty() {
        None
    } else {
        Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::SentimentObservation;
    use crate::domain::trade::{RawTrade, Side};
    use chrono::NaiveDateTime;
    use proptest::prelude::*;

    fn rec(minute: u32, pnl: f64, class: &str) -> TradeRecord {
        let raw = RawTrade {
            timestamp: NaiveDateTime::parse_from_str(
                &format!("2024-01-01 10:{:02}", minute),
                "%Y-%m-%d %H:%M",
            )
            .unwrap(),
            account: "a".into(),
            coin: None,
            side: Some(Side::Buy),
            size_usd: Some(1.0),
            closed_pnl: Some(pnl),
            fee: Some(0.0),
        };
        let obs = SentimentObservation {
            date: raw.timestamp.date(),
            value: 50.0,
            classification: class.into(),
        };
        TradeRecord::enrich(raw, &obs)
    }

    #[test]
    fn splits_runs_in_timestamp_order() {
        let trades = vec![
            rec(3, -1.0, "Fear"),
            rec(0, 5.0, "Greed"),
            rec(1, 2.0, "Greed"),
            rec(2, -4.0, "Fear"),
            rec(4, 3.0, "Neutral"),
        ];
        let refs: Vec<&TradeRecord> = trades.iter().collect();
        let streaks = find_streaks(&refs);
        assert_eq!(streaks.len(), 3);
        assert!(streaks[0].is_win);
        assert_eq!(streaks[0].length, 2);
        assert_eq!(streaks[0].total_pnl, 7.0);
        assert_eq!(streaks[0].dominant_sentiment, Sentiment::Greed);
        assert!(!streaks[1].is_win);
        assert_eq!(streaks[1].length, 2);
        assert_eq!(streaks[2].length, 1);
    }

    #[test]
    fn dominant_sentiment_tie_prefers_fearful_bucket() {
        let trades = vec![rec(0, 1.0, "Greed"), rec(1, 1.0, "Fear")];
        let refs: Vec<&TradeRecord> = trades.iter().collect();
        assert_eq!(find_streaks(&refs)[0].dominant_sentiment, Sentiment::Fear);
    }

    #[test]
    fn dominant_sentiment_tie_ignores_label_order() {
        let trades = vec![
            rec(0, -1.0, "Extreme Greed"),
            rec(1, -1.0, "Fear"),
            rec(2, -1.0, "Fear"),
            rec(3, -1.0, "Extreme Greed"),
        ];
        let refs: Vec<&TradeRecord> = trades.iter().collect();
        let streaks = find_streaks(&refs);
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].dominant_sentiment, Sentiment::Fear);
    }

    #[test]
    fn empty_input_has_no_streaks() {
        assert!(find_streaks(&[]).is_empty());
        let summary = StreakSummary::compute(&[]);
        assert_eq!(summary.longest_win, 0);
        assert_eq!(summary.avg_loss, None);
    }

    #[test]
    fn summary_statistics() {
        let trades = vec![
            rec(0, 1.0, "Greed"),
            rec(1, 1.0, "Greed"),
            rec(2, 1.0, "Greed"),
            rec(3, -1.0, "Fear"),
            rec(4, 1.0, "Fear"),
            rec(5, -1.0, "Fear"),
            rec(6, -1.0, "Fear"),
        ];
        let refs: Vec<&TradeRecord> = trades.iter().collect();
        let summary = StreakSummary::compute(&find_streaks(&refs));
        assert_eq!(summary.longest_win, 3);
        assert_eq!(summary.longest_loss, 2);
        assert_eq!(summary.avg_win, Some(2.0));
        assert_eq!(summary.avg_loss, Some(1.5));
        assert_eq!(summary.distribution.get(&1), Some(&(1, 1)));
        assert_eq!(summary.distribution.get(&3), Some(&(1, 0)));
        let fear = &summary.by_sentiment[1];
        assert_eq!(fear.0, Sentiment::Fear);
        assert_eq!(fear.1, Some(1.0));
        assert_eq!(fear.2, Some(1.5));
    }

    proptest! {
        #[test]
        fn streak_lengths_cover_every_trade(signs in prop::collection::vec(any::<bool>(), 0..60)) {
            let trades: Vec<TradeRecord> = signs
                .iter()
                .enumerate()
                .map(|(i, win)| rec(i as u32, if *win { 1.0 } else { -1.0 }, "Neutral"))
                .collect();
            let refs: Vec<&TradeRecord> = trades.iter().collect();
            let streaks = find_streaks(&refs);
            prop_assert_eq!(streaks.iter().map(|s| s.length).sum::<usize>(), trades.len());
            for pair in streaks.windows(2) {
                prop_assert_ne!(pair[0].is_win, pair[1].is_win);
            }
        }
    }
}
