//! Speech formatting for glucose readings
//!
//! Pure functions: same reading, units and clock in, same sentence out.

use crate::reading::{GlucoseReading, TrendDirection};
use crate::settings::{SpeechConfig, UnitSystem};

/// mg/dL per mmol/L for glucose
const MGDL_PER_MMOL: f64 = 18.0;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Round half toward positive infinity
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Spoken value and unit label for a mg/dL concentration
pub fn convert_value(mgdl: f64, units: UnitSystem) -> (String, &'static str) {
    match units {
        UnitSystem::Mmol => {
            let tenths = round_half_up(mgdl / MGDL_PER_MMOL * 10.0);
            (format!("{:.1}", tenths / 10.0), "millimoles per litre")
        }
        UnitSystem::MgDl => (
            format!("{}", round_half_up(mgdl) as i64),
            "milligrams per decilitre",
        ),
    }
}

/// Phrase for a trend arrow; empty when nothing should be said
pub fn spoken_direction(direction: Option<&TrendDirection>) -> String {
    let Some(direction) = direction else {
        return String::new();
    };

    let phrase = match direction {
        TrendDirection::DoubleUp => "rising fast",
        TrendDirection::SingleUp => "rising",
        TrendDirection::FortyFiveUp => "rising slightly",
        TrendDirection::Flat => "steady",
        TrendDirection::FortyFiveDown => "falling slightly",
        TrendDirection::SingleDown => "falling",
        TrendDirection::DoubleDown => "falling fast",
        TrendDirection::NotComputable | TrendDirection::RateOutOfRange => "",
        TrendDirection::Other(tag) => return tag.to_lowercase(),
    };
    phrase.to_string()
}

/// Whole minutes between the reading and `now_millis`, if the reading has a time
pub fn minutes_ago(reading: &GlucoseReading, now_millis: i64) -> Option<i64> {
    let taken = reading.effective_timestamp()?;
    let elapsed = now_millis.checked_sub(taken)?;
    Some(round_half_up(elapsed as f64 / MILLIS_PER_MINUTE) as i64)
}

/// Compose the sentence Alexa reads out
pub fn build_speech(reading: &GlucoseReading, config: &SpeechConfig, now_millis: i64) -> String {
    let (value, unit) = convert_value(reading.value(), config.units);
    let direction = spoken_direction(reading.direction());

    let mut speech = format!("Your glucose is {} {}", value, unit);
    if !direction.is_empty() {
        speech.push_str(" and ");
        speech.push_str(&direction);
    }
    speech.push('.');

    if let Some(age) = minutes_ago(reading, now_millis) {
        if age > config.stale_after_minutes {
            speech.push_str(&format!(
                " But heads up, this reading is {} minutes old.",
                age
            ));
        }
    }

    speech
}
