use analysis_core::{Direction, Timeframe};
use log::debug;
use market_structure::CurrentStructure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Banded reading of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl Interpretation {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Interpretation::StrongBullish => "Strong Bullish",
            Interpretation::Bullish => "Bullish",
            Interpretation::Neutral => "Neutral",
            Interpretation::Bearish => "Bearish",
            Interpretation::StrongBearish => "Strong Bearish",
        }
    }
}

/// One timeframe's contribution to the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfEntry {
    pub timeframe: Timeframe,
    pub weight: f64,
    pub direction: Direction,
    pub reasoning: String,
}

/// Weighted trend agreement across timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfScore {
    /// -100 (all bearish) to +100 (all bullish)
    pub composite: f64,
    pub interpretation: Interpretation,
    /// Sum of direction x weight
    pub raw_score: f64,
    /// Sum of weights
    pub max_score: f64,
    pub entries: Vec<MtfEntry>,
}

impl MtfScore {
    /// Whether the composite leans the same way as `direction` (beyond the neutral band).
    pub fn agrees_with(&self, direction: Direction) -> bool {
        match direction {
            Direction::Bullish => matches!(
                self.interpretation,
                Interpretation::Bullish | Interpretation::StrongBullish
            ),
            Direction::Bearish => matches!(
                self.interpretation,
                Interpretation::Bearish | Interpretation::StrongBearish
            ),
            Direction::Ranging => false,
        }
    }
}

/// Multi-timeframe composite scorer
///
/// Higher timeframes carry more weight. The composite is the weighted mean
/// of per-timeframe directions (+1, -1, 0) scaled to +/-100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtfScorer {
    pub weights: BTreeMap<Timeframe, f64>,

    /// |composite| at or above this is a strong reading
    pub strong_threshold: f64,

    /// |composite| at or above this (and below strong) is directional
    pub directional_threshold: f64,
}

impl Default for MtfScorer {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (Timeframe::M5, 0.25),
                (Timeframe::M15, 0.5),
                (Timeframe::M30, 0.75),
                (Timeframe::H1, 1.0),
                (Timeframe::H4, 1.5),
                (Timeframe::D1, 2.0),
                (Timeframe::W1, 3.0),
                (Timeframe::MN1, 4.0),
            ]),
            strong_threshold: 60.0,
            directional_threshold: 20.0,
        }
    }
}

impl MtfScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(&self, timeframe: Timeframe) -> f64 {
        self.weights.get(&timeframe).copied().unwrap_or(1.0)
    }

    /// Score per-timeframe directions. Later duplicates of a timeframe are ignored.
    pub fn score(&self, directions: &[(Timeframe, Direction)]) -> MtfScore {
        let mut seen = Vec::new();
        let inputs: Vec<(Timeframe, Direction)> = directions
            .iter()
            .filter(|(tf, _)| {
                if seen.contains(tf) {
                    false
                } else {
                    seen.push(*tf);
                    true
                }
            })
            .copied()
            .collect();

        let max_score: f64 = inputs.iter().map(|(tf, _)| self.weight(*tf)).sum();
        let raw_score: f64 = inputs.iter().map(|(tf, d)| d.sign() * self.weight(*tf)).sum();

        let composite = if max_score > 0.0 {
            (raw_score / max_score * 100.0).clamp(-100.0, 100.0)
        } else {
            0.0
        };

        let entries = inputs
            .iter()
            .map(|(tf, direction)| {
                let weight = self.weight(*tf);
                MtfEntry {
                    timeframe: *tf,
                    weight,
                    direction: *direction,
                    reasoning: explain(*tf, *direction, weight, max_score),
                }
            })
            .collect();

        let interpretation = self.interpret(composite);
        debug!(
            "MTF composite {:.1} ({}) from {} timeframes",
            composite,
            interpretation.name(),
            inputs.len()
        );

        MtfScore {
            composite,
            interpretation,
            raw_score,
            max_score,
            entries,
        }
    }

    /// Score current structures, one per timeframe.
    pub fn score_structures(&self, structures: &[(Timeframe, &CurrentStructure)]) -> MtfScore {
        let directions: Vec<(Timeframe, Direction)> =
            structures.iter().map(|(tf, cs)| (*tf, cs.direction)).collect();
        self.score(&directions)
    }

    pub fn interpret(&self, composite: f64) -> Interpretation {
        match composite {
            c if c >= self.strong_threshold => Interpretation::StrongBullish,
            c if c >= self.directional_threshold => Interpretation::Bullish,
            c if c > -self.directional_threshold => Interpretation::Neutral,
            c if c > -self.strong_threshold => Interpretation::Bearish,
            _ => Interpretation::StrongBearish,
        }
    }
}

fn explain(timeframe: Timeframe, direction: Direction, weight: f64, max_score: f64) -> String {
    let share = if max_score > 0.0 { weight / max_score * 100.0 } else { 0.0 };
    match direction {
        Direction::Ranging => format!(
            "{} is ranging: weight {:.2} contributes 0 of {:.2}",
            timeframe, weight, max_score
        ),
        _ => format!(
            "{} is {}: weight {:.2} contributes {:+.2} of {:.2} ({:+.0} points)",
            timeframe,
            direction,
            weight,
            direction.sign() * weight,
            max_score,
            direction.sign() * share
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unanimous_directions_hit_the_bounds() {
        let scorer = MtfScorer::new();
        let all = [Timeframe::MN1, Timeframe::W1, Timeframe::D1, Timeframe::H4];

        let bull: Vec<_> = all.iter().map(|tf| (*tf, Direction::Bullish)).collect();
        let score = scorer.score(&bull);
        assert_eq!(score.composite, 100.0);
        assert_eq!(score.interpretation, Interpretation::StrongBullish);
        assert_relative_eq!(score.raw_score, score.max_score);

        let bear: Vec<_> = all.iter().map(|tf| (*tf, Direction::Bearish)).collect();
        let score = scorer.score(&bear);
        assert_eq!(score.composite, -100.0);
        assert_eq!(score.interpretation, Interpretation::StrongBearish);
    }

    #[test]
    fn test_weighted_mix() {
        let scorer = MtfScorer::new();
        // +4 -3 +2 +0 over 10.5
        let score = scorer.score(&[
            (Timeframe::MN1, Direction::Bullish),
            (Timeframe::W1, Direction::Bearish),
            (Timeframe::D1, Direction::Bullish),
            (Timeframe::H4, Direction::Ranging),
        ]);
        assert_relative_eq!(score.raw_score, 3.0);
        assert_relative_eq!(score.max_score, 10.5);
        assert_relative_eq!(score.composite, 300.0 / 10.5, epsilon = 1e-9);
        assert_eq!(score.interpretation, Interpretation::Bullish);
        assert_eq!(score.entries.len(), 4);
        assert!(score.entries[1].reasoning.starts_with("W1 is bearish"));
        assert!(score.entries[3].reasoning.contains("ranging"));
    }

    #[test]
    fn test_empty_and_duplicate_inputs() {
        let scorer = MtfScorer::new();
        let empty = scorer.score(&[]);
        assert_eq!(empty.composite, 0.0);
        assert_eq!(empty.interpretation, Interpretation::Neutral);

        let dup = scorer.score(&[(Timeframe::D1, Direction::Bullish), (Timeframe::D1, Direction::Bearish)]);
        assert_eq!(dup.entries.len(), 1);
        assert_eq!(dup.composite, 100.0);
    }

    #[test]
    fn test_bands() {
        let scorer = MtfScorer::new();
        assert_eq!(scorer.interpret(60.0), Interpretation::StrongBullish);
        assert_eq!(scorer.interpret(19.9), Interpretation::Neutral);
        assert_eq!(scorer.interpret(-20.0), Interpretation::Bearish);
        assert_eq!(scorer.interpret(-60.0), Interpretation::StrongBearish);
    }

    #[test]
    fn test_composite_stays_in_range() {
        let scorer = MtfScorer::new();
        let dirs = [Direction::Bullish, Direction::Bearish, Direction::Ranging];
        for a in dirs {
            for b in dirs {
                for c in dirs {
                    let s = scorer.score(&[(Timeframe::W1, a), (Timeframe::D1, b), (Timeframe::H1, c)]);
                    assert!((-100.0..=100.0).contains(&s.composite));
                }
            }
        }
    }

    #[test]
    fn test_agreement() {
        let scorer = MtfScorer::new();
        let score = scorer.score(&[(Timeframe::D1, Direction::Bearish)]);
        assert!(score.agrees_with(Direction::Bearish));
        assert!(!score.agrees_with(Direction::Bullish));
        assert!(!score.agrees_with(Direction::Ranging));
    }

    #[test]
    fn test_weights_load_from_json() {
        let scorer: MtfScorer = serde_json::from_str(
            r#"{"weights": {"D1": 1.0, "H1": 3.0}, "strong_threshold": 50.0, "directional_threshold": 10.0}"#,
        )
        .unwrap();
        let score = scorer.score(&[(Timeframe::D1, Direction::Bearish), (Timeframe::H1, Direction::Bullish)]);
        assert_relative_eq!(score.composite, 50.0);
        assert_eq!(score.interpretation, Interpretation::StrongBullish);
        // unlisted timeframes weigh 1
        assert_eq!(scorer.weight(Timeframe::W1), 1.0);

        let json = serde_json::to_string(&score.interpretation).unwrap();
        assert_eq!(json, "\"strong_bullish\"");
    }

    #[test]
    fn test_scores_current_structures() {
        let scorer = MtfScorer::new();
        let mut daily = CurrentStructure::ranging();
        daily.direction = Direction::Bullish;
        let weekly = CurrentStructure::ranging();
        let score = scorer.score_structures(&[(Timeframe::D1, &daily), (Timeframe::W1, &weekly)]);
        assert_relative_eq!(score.composite, 40.0);
    }
}
