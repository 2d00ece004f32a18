use analysis_core::{nearest_news, Candle, Direction, Impact, NewsEvent, TradingSession};
use market_structure::{levels_crossed, BosEnrichment, BosEvent, KeyLevel};
use multi_timeframe::MtfScore;
use serde::{Deserialize, Serialize};

/// Cross-market positioning read (for example from COT reports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositioningBias {
    pub direction: Direction,
    /// Share of net-long speculative positioning, if known
    #[serde(default)]
    pub net_long_percent: Option<f64>,
}

/// Point allocation for the significance score. Components sum to 100 at most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentWeights {
    /// Points for a break of exactly `magnitude_cap_pips`
    pub magnitude_points: f64,
    /// Extra points available past the cap, approached with diminishing returns
    pub magnitude_excess_points: f64,
    pub magnitude_cap_pips: f64,

    pub key_level_points: f64,
    pub max_key_levels: usize,

    pub positioning_points: f64,
    pub mtf_points: f64,

    pub overlap_session_points: f64,
    pub main_session_points: f64,
    pub asian_session_points: f64,

    /// News within this many minutes of the break is reported
    pub news_window_minutes: i64,

    pub high_conviction_threshold: f64,
}

impl Default for EnrichmentWeights {
    fn default() -> Self {
        Self {
            magnitude_points: 25.0,
            magnitude_excess_points: 10.0,
            magnitude_cap_pips: 50.0,
            key_level_points: 10.0,
            max_key_levels: 2,
            positioning_points: 15.0,
            mtf_points: 15.0,
            overlap_session_points: 15.0,
            main_session_points: 10.0,
            asian_session_points: 4.0,
            news_window_minutes: 60,
            high_conviction_threshold: 70.0,
        }
    }
}

impl EnrichmentWeights {
    /// Linear up to the cap, then square-root growth toward the excess allowance.
    pub fn magnitude_score(&self, pips: f64) -> f64 {
        if !(pips.is_finite() && pips > 0.0) || self.magnitude_cap_pips <= 0.0 {
            return 0.0;
        }
        let cap = self.magnitude_cap_pips;
        let base = pips.min(cap) / cap * self.magnitude_points;
        let excess = ((pips - cap).max(0.0) / cap).sqrt().min(1.0) * self.magnitude_excess_points;
        base + excess
    }

    pub fn session_score(&self, session: TradingSession) -> f64 {
        match session {
            TradingSession::LondonNyOverlap => self.overlap_session_points,
            TradingSession::London | TradingSession::NewYork => self.main_session_points,
            TradingSession::Asian => self.asian_session_points,
            TradingSession::OffHours => 0.0,
        }
    }
}

/// Everything a break is judged against, gathered once per request.
pub struct EnrichmentContext<'a> {
    pub weights: &'a EnrichmentWeights,
    pub key_levels: &'a [KeyLevel],
    pub mtf: &'a MtfScore,
    pub positioning: Option<&'a PositioningBias>,
    pub news: &'a [NewsEvent],
    /// Currencies of the traded pair, for news relevance
    pub currencies: &'a [String],
}

impl EnrichmentContext<'_> {
    /// Copy of `event` with its enrichment attached.
    pub fn enrich(&self, event: &BosEvent, candles: &[Candle]) -> BosEvent {
        let w = self.weights;
        let open = candles
            .get(event.index)
            .map(|c| c.open)
            .filter(|o| o.is_finite())
            .unwrap_or(event.level);

        let key_levels_broken: Vec<KeyLevel> =
            levels_crossed(self.key_levels, event.direction, open, event.level, event.close)
                .into_iter()
                .cloned()
                .collect();

        let cot_direction = self.positioning.map(|p| p.direction);
        let cot_aligned = cot_direction.map(|d| d == event.direction);
        let mtf_aligned = self.mtf.agrees_with(event.direction);
        let session = TradingSession::at(event.timestamp);

        let level_score = key_levels_broken.len().min(w.max_key_levels) as f64 * w.key_level_points;
        let positioning_score = if cot_aligned == Some(true) { w.positioning_points } else { 0.0 };
        let mtf_score = if mtf_aligned { w.mtf_points } else { 0.0 };
        let significance = (w.magnitude_score(event.magnitude_pips)
            + level_score
            + positioning_score
            + mtf_score
            + w.session_score(session))
        .clamp(0.0, 100.0);

        let news_proximity = nearest_news(
            self.news,
            self.currencies,
            event.timestamp,
            w.news_window_minutes,
            Impact::Medium,
        );

        let mut enriched = event.clone();
        enriched.enrichment = Some(BosEnrichment {
            significance,
            is_high_conviction: significance >= w.high_conviction_threshold,
            key_levels_broken,
            cot_direction,
            cot_aligned,
            mtf_aligned,
            session,
            news_proximity,
        });
        enriched
    }
}
