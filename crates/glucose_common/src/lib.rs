//! Glucose Common - Shared pieces of the glucose voice skill
//!
//! Reading model, per-invocation settings, the Nightscout fetcher, the
//! speech formatter and the Alexa envelope types.

pub mod alexa;
pub mod nightscout;
pub mod pipeline;
pub mod reading;
pub mod settings;
pub mod speech;

pub use nightscout::{EntrySource, FakeEntrySource, FetchError, NightscoutClient};
pub use pipeline::{handle_glucose_query, now_millis, SpeechResult, FETCH_APOLOGY};
pub use reading::{GlucoseReading, TrendDirection};
pub use settings::{AuthMode, FetchConfig, Settings, SpeechConfig, UnitSystem};
