//! Error types for the fallible boundaries around the simulation.
//!
//! The simulation itself is total. Only configuration loading and the external
//! sound service can fail, and both degrade to defaults at the call site.

use thiserror::Error;

/// Tuning could not be parsed or holds a value the simulation cannot use.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tunable is outside its valid range.
    #[error("tunable '{name}' = {value} is outside valid range {expected}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },
}

/// Custom fire-sound request failed somewhere between upload and decode.
#[derive(Debug, Error)]
pub enum SoundServiceError {
    #[error("sound request is empty")]
    EmptyRequest,

    #[error("sound service responded with HTTP {status}")]
    Http { status: u16 },

    /// A browser API call threw.
    #[error("browser call failed: {0}")]
    Js(String),

    #[error("could not decode returned audio: {0}")]
    Decode(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for SoundServiceError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        SoundServiceError::Js(format!("{:?}", value))
    }
}
