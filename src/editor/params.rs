use std::str::FromStr;

use crate::foundation::{
    core::Direction,
    error::{KitError, KitResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Parameter record supplied by the panel.
///
/// Times and distances arrive as strings exactly as typed; JSON numbers are accepted too.
pub struct TransitionParams {
    /// Preset name chosen in the panel. Recorded in the log only.
    pub transition_type: String,
    #[serde(deserialize_with = "text_or_number")]
    pub fade_out_delay: String,
    #[serde(deserialize_with = "text_or_number")]
    pub fade_out_duration: String,
    #[serde(deserialize_with = "text_or_number")]
    pub fade_in_delay: String,
    #[serde(deserialize_with = "text_or_number")]
    pub fade_in_duration: String,
    /// Pixels at the reference composition width.
    #[serde(deserialize_with = "text_or_number")]
    pub slide_distance: String,
    pub direction: String,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            transition_type: "slideAndFade".to_string(),
            fade_out_delay: "0".to_string(),
            fade_out_duration: "250".to_string(),
            fade_in_delay: "250".to_string(),
            fade_in_duration: "250".to_string(),
            slide_distance: "100".to_string(),
            direction: "left".to_string(),
        }
    }
}

/// [`TransitionParams`] converted to engine units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeTiming {
    /// Seconds.
    pub fade_out_delay: f64,
    /// Seconds.
    pub fade_out_duration: f64,
    /// Seconds.
    pub fade_in_delay: f64,
    /// Seconds.
    pub fade_in_duration: f64,
    /// Unscaled pixels.
    pub slide_distance: f64,
    pub direction: Direction,
}

impl TransitionParams {
    pub fn from_json_str(s: &str) -> KitResult<Self> {
        serde_json::from_str(s).map_err(|e| KitError::validation(format!("params json: {e}")))
    }

    /// Parse every field; frame-suffixed times use `frame_rate`.
    ///
    /// Fade durations must be positive: a fade's two keys cannot share a time.
    pub fn resolve(&self, frame_rate: f64) -> KitResult<FadeTiming> {
        let time = |name: &str, text: &str| field(name, parse_time_value(text, frame_rate));
        let duration = |name: &str, text: &str| {
            let seconds = time(name, text)?;
            if seconds <= 0.0 {
                return Err(KitError::validation(format!("{name}: must be greater than 0")));
            }
            Ok(seconds)
        };
        Ok(FadeTiming {
            fade_out_delay: time("fadeOutDelay", &self.fade_out_delay)?,
            fade_out_duration: duration("fadeOutDuration", &self.fade_out_duration)?,
            fade_in_delay: time("fadeInDelay", &self.fade_in_delay)?,
            fade_in_duration: duration("fadeInDuration", &self.fade_in_duration)?,
            slide_distance: field("slideDistance", parse_number(&self.slide_distance))?,
            direction: Direction::from_str(&self.direction)?,
        })
    }
}

fn field(name: &str, value: KitResult<f64>) -> KitResult<f64> {
    value.map_err(|e| match e {
        KitError::Validation(msg) => KitError::validation(format!("{name}: {msg}")),
        other => other,
    })
}

/// Non-negative finite number.
pub fn parse_number(text: &str) -> KitResult<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| KitError::validation(format!("'{trimmed}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(KitError::validation(format!(
            "'{trimmed}' must be finite and >= 0"
        )));
    }
    Ok(value)
}

/// Time text to seconds.
///
/// Bare numbers are milliseconds. Suffixes: `ms`, `s` (seconds), `f` (frames at `frame_rate`).
pub fn parse_time_value(text: &str, frame_rate: f64) -> KitResult<f64> {
    let trimmed = text.trim();
    if let Some(ms) = trimmed.strip_suffix("ms") {
        return Ok(parse_number(ms)? / 1000.0);
    }
    if let Some(s) = trimmed.strip_suffix('s') {
        return parse_number(s);
    }
    if let Some(frames) = trimmed.strip_suffix('f') {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(KitError::validation("frame rate must be finite and > 0"));
        }
        return Ok(parse_number(frames)? / frame_rate);
    }
    Ok(parse_number(trimmed)? / 1000.0)
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/params.rs"]
mod tests;
