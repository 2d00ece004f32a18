use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Forex trading session at a point in time, by UTC hour.
///
/// Asian 21:00-06:00, London 07:00-16:00, New York 12:00-21:00. The
/// London/New York overlap takes precedence; 06:00-07:00 is off-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSession {
    Asian,
    London,
    NewYork,
    LondonNyOverlap,
    OffHours,
}

impl TradingSession {
    pub fn from_hour(utc_hour: u32) -> Self {
        let asian = utc_hour >= 21 || utc_hour < 6;
        let london = (7..16).contains(&utc_hour);
        let new_york = (12..21).contains(&utc_hour);

        match (asian, london, new_york) {
            (_, true, true) => TradingSession::LondonNyOverlap,
            (_, true, false) => TradingSession::London,
            (_, false, true) => TradingSession::NewYork,
            (true, false, false) => TradingSession::Asian,
            _ => TradingSession::OffHours,
        }
    }

    /// Session for a Unix-millisecond timestamp; off-hours if out of range.
    pub fn at(timestamp_ms: i64) -> Self {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .map(|dt| Self::from_hour(dt.hour()))
            .unwrap_or(TradingSession::OffHours)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TradingSession::Asian => "asian",
            TradingSession::London => "london",
            TradingSession::NewYork => "new_york",
            TradingSession::LondonNyOverlap => "london_ny_overlap",
            TradingSession::OffHours => "off_hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    NonEconomic,
    Low,
    Medium,
    High,
}

/// Scheduled economic calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub timestamp: i64,
    pub currency: String,
    pub impact: Impact,
    pub title: String,
}

/// Nearest relevant calendar event to some moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsProximity {
    pub title: String,
    pub currency: String,
    pub impact: Impact,
    /// Negative when the event preceded the moment
    pub minutes_from_event: i64,
}

/// Nearest event at or above `min_impact` for any of `currencies` within `window_minutes`.
///
/// Ties on distance resolve to the earlier event.
pub fn nearest_news(
    events: &[NewsEvent],
    currencies: &[String],
    timestamp_ms: i64,
    window_minutes: i64,
    min_impact: Impact,
) -> Option<NewsProximity> {
    events
        .iter()
        .filter(|e| e.impact >= min_impact)
        .filter(|e| currencies.iter().any(|c| c.eq_ignore_ascii_case(&e.currency)))
        .map(|e| (e, (timestamp_ms - e.timestamp) / 60_000))
        .filter(|(_, minutes)| minutes.abs() <= window_minutes)
        .min_by_key(|(e, minutes)| (minutes.abs(), e.timestamp))
        .map(|(e, minutes)| NewsProximity {
            title: e.title.clone(),
            currency: e.currency.clone(),
            impact: e.impact,
            minutes_from_event: minutes,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;

    #[test]
    fn test_session_boundaries() {
        assert_eq!(TradingSession::from_hour(2), TradingSession::Asian);
        assert_eq!(TradingSession::from_hour(6), TradingSession::OffHours);
        assert_eq!(TradingSession::from_hour(8), TradingSession::London);
        assert_eq!(TradingSession::from_hour(13), TradingSession::LondonNyOverlap);
        assert_eq!(TradingSession::from_hour(17), TradingSession::NewYork);
        assert_eq!(TradingSession::from_hour(22), TradingSession::Asian);
        assert_eq!(TradingSession::at(14 * HOUR_MS), TradingSession::LondonNyOverlap);
    }

    #[test]
    fn test_nearest_news_filters_currency_and_impact() {
        let events = vec![
            NewsEvent {
                timestamp: 10 * HOUR_MS,
                currency: "USD".into(),
                impact: Impact::High,
                title: "CPI m/m".into(),
            },
            NewsEvent {
                timestamp: 10 * HOUR_MS + 600_000,
                currency: "JPY".into(),
                impact: Impact::High,
                title: "BoJ Rate".into(),
            },
            NewsEvent {
                timestamp: 10 * HOUR_MS - 300_000,
                currency: "EUR".into(),
                impact: Impact::Low,
                title: "Sentix".into(),
            },
        ];
        let pair = vec!["EUR".to_string(), "USD".to_string()];
        let hit = nearest_news(&events, &pair, 10 * HOUR_MS + 1_200_000, 60, Impact::Medium).unwrap();
        assert_eq!(hit.title, "CPI m/m");
        assert_eq!(hit.minutes_from_event, 20);

        assert!(nearest_news(&events, &pair, 13 * HOUR_MS, 60, Impact::Medium).is_none());
    }
}
