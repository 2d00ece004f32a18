//! Market structure engine: one call turns candle series for a pair into
//! swings, breaks of structure, fair value gaps, premium/discount zones and
//! a multi-timeframe trend score.
//!
//! Every operation is a pure function of its inputs. Nothing is cached and
//! nothing is shared, so callers may run requests (or per-timeframe pieces
//! of one request) concurrently without coordination.

use analysis_core::{
    last_close, pair_currencies, pip_multiplier_or_default, validate_series, Candle, NewsEvent,
    PipSource, PipTable, StructureError, Timeframe,
};
use market_structure::{
    current_structure, derive_key_levels, detect_fvgs, labeled_swings, premium_discount,
    reclassify_bos, BosEvent, CurrentStructure, DealingRange, FvgEvent, KeyLevel,
    PremiumDiscountZones, StructureConfig, SwingPoint, ZoneTier,
};
use multi_timeframe::{MtfScore, MtfScorer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod enrichment;

pub use enrichment::{EnrichmentContext, EnrichmentWeights, PositioningBias};


/// Candle series supplied for one request. Only `primary` is required;
/// empty higher-timeframe series simply drop out of the MTF score and zones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandleSeries {
    pub primary: Vec<Candle>,
    pub daily: Vec<Candle>,
    pub weekly: Vec<Candle>,
    pub monthly: Vec<Candle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureOptions {
    pub enrich_bos: bool,
    /// Keep filled, reclaimed and inverted gaps in the response
    pub include_filled_fvgs: bool,
    /// Price to measure zones against; defaults to the last primary close
    pub current_price: Option<f64>,
    pub positioning: Option<PositioningBias>,
    pub news: Vec<NewsEvent>,
    /// Extra key-level prices known to the caller
    pub key_levels: Vec<f64>,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self {
            enrich_bos: true,
            include_filled_fvgs: true,
            current_price: None,
            positioning: None,
            news: Vec::new(),
            key_levels: Vec::new(),
        }
    }
}

/// Swings, breaks and verdict for a single timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeStructure {
    pub timeframe: Timeframe,
    pub swings: Vec<SwingPoint>,
    /// Statuses already re-derived against the series
    pub bos_events: Vec<BosEvent>,
    pub current: CurrentStructure,
    /// Whether the series was long enough to find any pivot
    pub sufficient: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureResponse {
    pub pair: String,
    pub timeframe: Timeframe,
    pub pip_multiplier: f64,
    pub current_structure: CurrentStructure,
    pub swings: Vec<SwingPoint>,
    pub bos_events: Vec<BosEvent>,
    pub fvgs: Vec<FvgEvent>,
    /// `None` when no finite price was available
    pub zones: Option<PremiumDiscountZones>,
    pub mtf: MtfScore,
    pub key_levels: Vec<KeyLevel>,
}

/// Stateless structure engine; holds only calibration.
pub struct StructureEngine {
    config: StructureConfig,
    scorer: MtfScorer,
    weights: EnrichmentWeights,
    pips: Box<dyn PipSource>,
}

impl Default for StructureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureEngine {
    pub fn new() -> Self {
        Self {
            config: StructureConfig::default(),
            scorer: MtfScorer::default(),
            weights: EnrichmentWeights::default(),
            pips: Box::new(PipTable),
        }
    }

    pub fn with_config(mut self, config: StructureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scorer(mut self, scorer: MtfScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_enrichment_weights(mut self, weights: EnrichmentWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Replace the built-in pip table with a caller-supplied lookup
    pub fn with_pip_source(mut self, pips: Box<dyn PipSource>) -> Self {
        self.pips = pips;
        self
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn pip_multiplier(&self, pair: &str) -> f64 {
        pip_multiplier_or_default(self.pips.as_ref(), pair)
    }

    /// Reject a series that is malformed or too short to confirm a single pivot
    /// on `timeframe`. Scans never require this; it is for callers that want
    /// to refuse bad input instead of getting a sparse response.
    pub fn check_series(&self, timeframe: Timeframe, candles: &[Candle]) -> Result<(), StructureError> {
        validate_series(candles)?;
        let required = self.config.lookback(timeframe).saturating_mul(2).saturating_add(1);
        if candles.len() < required {
            return Err(StructureError::InsufficientData {
                required,
                actual: candles.len(),
            });
        }
        Ok(())
    }

    /// Labeled swings for one timeframe, using the configured lookback and a
    /// tolerance of `equal_tolerance_pips` converted to price.
    pub fn detect_swings(&self, pair: &str, timeframe: Timeframe, candles: &[Candle]) -> Vec<SwingPoint> {
        let tolerance = self.config.equal_tolerance_pips / self.pip_multiplier(pair);
        labeled_swings(candles, self.config.lookback(timeframe), tolerance)
    }

    /// Breaks of the given swings with statuses re-derived from `candles`.
    pub fn detect_bos(&self, pair: &str, candles: &[Candle], swings: &[SwingPoint]) -> Vec<BosEvent> {
        let events = market_structure::detect_bos(candles, swings, self.pip_multiplier(pair), &self.config);
        reclassify_bos(&events, candles)
    }

    /// Full single-timeframe pass: swings, breaks and current structure.
    pub fn timeframe_structure(&self, pair: &str, timeframe: Timeframe, candles: &[Candle]) -> TimeframeStructure {
        let swings = self.detect_swings(pair, timeframe, candles);
        let bos_events = self.detect_bos(pair, candles, &swings);
        let current = current_structure(&swings, &bos_events, self.config.recent_labels);
        let sufficient = candles.len() > self.config.lookback(timeframe).saturating_mul(2);

        TimeframeStructure {
            timeframe,
            swings,
            bos_events,
            current,
            sufficient,
        }
    }

    /// Composite score over independently computed timeframe structures.
    /// Timeframes without enough data are left out.
    pub fn score_mtf(&self, structures: &[&TimeframeStructure]) -> MtfScore {
        let usable: Vec<(Timeframe, &CurrentStructure)> = structures
            .iter()
            .filter(|s| s.sufficient)
            .map(|s| (s.timeframe, &s.current))
            .collect();
        self.scorer.score_structures(&usable)
    }

    /// Compute the complete structure response for `pair` on `timeframe`.
    pub fn compute_structure(
        &self,
        pair: &str,
        timeframe: Timeframe,
        series: &CandleSeries,
        options: &StructureOptions,
    ) -> StructureResponse {
        let pip_multiplier = self.pip_multiplier(pair);
        let primary = self.timeframe_structure(pair, timeframe, &series.primary);

        // Higher timeframes, highest first; the primary series stands in for its own timeframe.
        let higher: Vec<TimeframeStructure> = [
            (Timeframe::MN1, &series.monthly),
            (Timeframe::W1, &series.weekly),
            (Timeframe::D1, &series.daily),
        ]
        .into_iter()
        .filter(|(tf, _)| *tf != timeframe)
        .map(|(tf, candles)| self.timeframe_structure(pair, tf, candles))
        .collect();

        let mut mtf_inputs: Vec<&TimeframeStructure> = higher.iter().collect();
        mtf_inputs.push(&primary);
        mtf_inputs.sort_by(|a, b| b.timeframe.cmp(&a.timeframe));
        let mtf = self.score_mtf(&mtf_inputs);

        let mut key_levels = derive_key_levels(
            &series.daily,
            &series.weekly,
            &series.monthly,
            self.config.yearly_window,
        );
        key_levels.extend(
            options
                .key_levels
                .iter()
                .filter(|p| p.is_finite())
                .map(|p| KeyLevel::external(*p)),
        );

        let zones = options
            .current_price
            .filter(|p| p.is_finite())
            .or_else(|| last_close(&series.primary))
            .map(|price| {
                // A daily or weekly request is already measured by the primary tier.
                let swings_of = |tf: Timeframe| {
                    higher
                        .iter()
                        .find(|s| s.timeframe == tf)
                        .and_then(|s| DealingRange::from_swings(&s.swings))
                };
                let ranges = [
                    (ZoneTier::Primary, DealingRange::from_swings(&primary.swings)),
                    (ZoneTier::Daily, swings_of(Timeframe::D1)),
                    (ZoneTier::Weekly, swings_of(Timeframe::W1)),
                    (ZoneTier::Yearly, DealingRange::from_candles(&series.monthly, self.config.yearly_window)),
                    (ZoneTier::Macro, DealingRange::from_candles(&series.monthly, self.config.macro_window)),
                ];
                premium_discount(price, &ranges, &self.config)
            });

        let mut fvgs = detect_fvgs(&series.primary, pip_multiplier, &self.config);
        if !options.include_filled_fvgs {
            fvgs.retain(FvgEvent::is_open);
        }

        let bos_events = if options.enrich_bos {
            let currencies = pair_currencies(pair);
            let ctx = EnrichmentContext {
                weights: &self.weights,
                key_levels: &key_levels,
                mtf: &mtf,
                positioning: options.positioning.as_ref(),
                news: &options.news,
                currencies: &currencies,
            };
            primary
                .bos_events
                .iter()
                .map(|e| ctx.enrich(e, &series.primary))
                .collect()
        } else {
            primary.bos_events.clone()
        };

        let mut current = primary.current.clone();
        if let Some(last) = current.last_bos.as_mut() {
            if let Some(enriched) = bos_events
                .iter()
                .find(|e| e.timestamp == last.timestamp && e.swing_timestamp == last.swing_timestamp)
            {
                *last = enriched.clone();
            }
        }

        debug!(
            swings = primary.swings.len(),
            bos = bos_events.len(),
            fvgs = fvgs.len(),
            "structure components computed"
        );
        info!(
            pair,
            timeframe = %timeframe,
            direction = %current.direction,
            composite = mtf.composite,
            "computed market structure"
        );

        StructureResponse {
            pair: pair.to_string(),
            timeframe,
            pip_multiplier,
            current_structure: current,
            swings: primary.swings,
            bos_events,
            fvgs,
            zones,
            mtf,
            key_levels,
        }
    }
}
