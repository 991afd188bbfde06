use crate::foundation::{
    core::{FadeKind, LabelColor},
    error::{KitError, KitResult},
};

/// Version reported to the panel.
pub const PLUGIN_VERSION: &str = "1.0.0";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Engine-wide constants.
///
/// Every field has a default matching the shipped panel; a JSON document may override any subset.
pub struct EngineSettings {
    /// Reserved display name identifying the controller layer.
    pub controller_name: String,
    /// Length of the controller's slide for new transitions, in seconds.
    pub slide_duration_s: f64,
    /// Composition width at which `slideDistance` is applied unscaled.
    pub reference_width_px: f64,
    /// Per-axis displacement below which two samples count as "not moving".
    pub movement_tolerance: f64,
    /// Pause in movement that splits two transitions, in seconds.
    pub gap_threshold_s: f64,
    /// Slack around a transition when testing the playhead against it, in seconds.
    pub playhead_tolerance_s: f64,
    /// Tag written on exit keyframes.
    pub exit_label: LabelColor,
    /// Tag written on enter keyframes.
    pub enter_label: LabelColor,
    /// Older exit tag, still read as exit.
    pub legacy_exit_label: LabelColor,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            controller_name: "Slide and fade - Controller".to_string(),
            slide_duration_s: 0.5,
            reference_width_px: 786.0,
            movement_tolerance: 0.0001,
            gap_threshold_s: 0.1,
            playhead_tolerance_s: 0.001,
            exit_label: LabelColor::BLUE,
            enter_label: LabelColor::PURPLE,
            legacy_exit_label: LabelColor::GREEN,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> KitResult<()> {
        if self.controller_name.trim().is_empty() {
            return Err(KitError::validation("controller_name must be non-empty"));
        }
        for (name, v) in [
            ("slide_duration_s", self.slide_duration_s),
            ("reference_width_px", self.reference_width_px),
            ("movement_tolerance", self.movement_tolerance),
            ("gap_threshold_s", self.gap_threshold_s),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(KitError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !(self.playhead_tolerance_s.is_finite() && self.playhead_tolerance_s >= 0.0) {
            return Err(KitError::validation(
                "playhead_tolerance_s must be finite and >= 0",
            ));
        }
        if self.exit_label.is_none() || self.enter_label.is_none() {
            return Err(KitError::validation("fade labels must not be 0 (none)"));
        }
        if self.exit_label == self.enter_label || self.legacy_exit_label == self.enter_label {
            return Err(KitError::validation(
                "enter label must differ from exit labels",
            ));
        }
        Ok(())
    }

    /// Tag written for a fade kind.
    pub fn label_for(&self, kind: FadeKind) -> LabelColor {
        match kind {
            FadeKind::Exit => self.exit_label,
            FadeKind::Enter => self.enter_label,
        }
    }

    /// Fade kind a tag stands for, if any.
    pub fn kind_for_label(&self, label: LabelColor) -> Option<FadeKind> {
        if label.is_none() {
            None
        } else if label == self.exit_label || label == self.legacy_exit_label {
            Some(FadeKind::Exit)
        } else if label == self.enter_label {
            Some(FadeKind::Enter)
        } else {
            None
        }
    }

    pub fn from_json_str(s: &str) -> KitResult<Self> {
        let settings: Self = serde_json::from_str(s)
            .map_err(|e| KitError::validation(format!("settings json: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/settings.rs"]
mod tests;
