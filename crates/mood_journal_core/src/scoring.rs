//! crates/mood_journal_core/src/scoring.rs
//!
//! The rule-based weather impact score and the pattern-adjusted prediction
//! built on top of it. Everything here is a pure function of its inputs.

use crate::domain::{Prediction, Recommendation, ScoreResult, WeatherMoodPattern, WeatherObservation};

/// Every observation starts from this score before any rule fires.
pub const NEUTRAL_SCORE: f64 = 5.0;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// How strongly a matching personal pattern pulls the prediction.
const PATTERN_WEIGHT: f64 = 0.3;

/// Scores how the given weather is likely to affect mood on a 0-10 scale.
///
/// Rules run in a fixed order (temperature, humidity, condition, wind,
/// pressure) and each one that fires appends a factor string naming the value
/// that triggered it.
pub fn score(obs: &WeatherObservation) -> ScoreResult {
    let mut score = NEUTRAL_SCORE;
    let mut factors = Vec::new();

    let rules: [fn(&WeatherObservation) -> Option<(f64, String)>; 5] = [
        temperature_rule,
        humidity_rule,
        condition_rule,
        wind_rule,
        pressure_rule,
    ];
    for rule in rules {
        if let Some((delta, factor)) = rule(obs) {
            score += delta;
            factors.push(factor);
        }
    }

    ScoreResult {
        mood_score: clamp_and_round(score),
        factors,
    }
}

/// Scores the observation, then nudges the result with the first personal
/// pattern whose condition matches.
///
/// Patterns are consulted in the order given; callers wanting a particular
/// priority (e.g. most samples first) must sort them beforehand.
pub fn predict(obs: &WeatherObservation, patterns: &[WeatherMoodPattern]) -> Prediction {
    let ScoreResult {
        mood_score,
        mut factors,
    } = score(obs);
    let mut adjusted = mood_score;

    if let Some(pattern) = patterns
        .iter()
        .find(|p| p.key.condition.eq_ignore_ascii_case(obs.condition.trim()))
    {
        adjusted += (pattern.running_average_impact - NEUTRAL_SCORE) * PATTERN_WEIGHT;
        factors.push(format!(
            "Personal pattern: {} (average impact {:.1} over {} days)",
            pattern.key.condition, pattern.running_average_impact, pattern.sample_count
        ));
    }

    let mood_score = clamp_and_round(adjusted);
    Prediction {
        mood_score,
        factors,
        recommendation: recommendation_for(mood_score),
    }
}

pub fn recommendation_for(score: f64) -> Recommendation {
    if score >= 7.0 {
        Recommendation::StrongPositive
    } else if score >= 5.5 {
        Recommendation::Positive
    } else if score >= 4.0 {
        Recommendation::MildCaution
    } else {
        Recommendation::Negative
    }
}

fn clamp_and_round(score: f64) -> f64 {
    let clamped = score.clamp(MIN_SCORE, MAX_SCORE);
    (clamped * 10.0).round() / 10.0
}

//=========================================================================================
// Individual Rules
//=========================================================================================

fn temperature_rule(obs: &WeatherObservation) -> Option<(f64, String)> {
    let t = obs.temperature;
    let (delta, label) = if (18.0..=25.0).contains(&t) {
        (1.5, "Comfortable")
    } else if (15.0..18.0).contains(&t) || (t > 25.0 && t <= 28.0) {
        (0.5, "Pleasant")
    } else if t < 5.0 || t > 35.0 {
        (-2.0, "Extreme")
    } else {
        // 5 <= t < 15 or 28 < t <= 35
        (-1.0, "Uncomfortable")
    };
    Some((delta, format!("{} temperature ({}°C)", label, t)))
}

fn humidity_rule(obs: &WeatherObservation) -> Option<(f64, String)> {
    let h = obs.humidity;
    if (40.0..=60.0).contains(&h) {
        Some((0.5, format!("Comfortable humidity ({}%)", h)))
    } else if h > 80.0 {
        Some((-1.5, format!("High humidity ({}%)", h)))
    } else if h < 30.0 {
        Some((-0.5, format!("Low humidity ({}%)", h)))
    } else {
        None
    }
}

fn condition_rule(obs: &WeatherObservation) -> Option<(f64, String)> {
    match obs.condition.trim().to_lowercase().as_str() {
        "clear" | "sunny" => Some((2.0, "Clear/sunny weather".to_string())),
        "clouds" => {
            let cover = obs.cloud_cover?;
            if cover < 30.0 {
                Some((1.0, format!("Partly cloudy ({}% cloud cover)", cover)))
            } else if cover > 80.0 {
                Some((-1.0, format!("Overcast ({}% cloud cover)", cover)))
            } else {
                None
            }
        }
        "rain" | "drizzle" => Some((-1.5, format!("Rainy weather ({} mm)", obs.precipitation))),
        "thunderstorm" => Some((-2.0, "Thunderstorm".to_string())),
        "snow" => Some((-1.0, "Snowy weather".to_string())),
        "mist" | "fog" => Some((-0.5, "Misty/foggy".to_string())),
        _ => None,
    }
}

fn wind_rule(obs: &WeatherObservation) -> Option<(f64, String)> {
    let speed = obs.wind_speed?;
    if speed > 10.0 {
        Some((-1.0, format!("Strong winds ({} m/s)", speed)))
    } else if (2.0..=5.0).contains(&speed) {
        Some((0.3, format!("Gentle breeze ({} m/s)", speed)))
    } else {
        None
    }
}

fn pressure_rule(obs: &WeatherObservation) -> Option<(f64, String)> {
    let pressure = obs.air_pressure?;
    if pressure < 1000.0 {
        Some((-0.8, format!("Low air pressure ({} hPa)", pressure)))
    } else if pressure > 1020.0 {
        Some((0.5, format!("High air pressure ({} hPa)", pressure)))
    } else {
        None
    }
}
