use std::fmt;

use crate::{
    controller::manager::locate_controller,
    driver::resolver::detect_kind_by_label,
    editor::{
        markers::linked_layers,
        params::TransitionParams,
        transition::{EditSummary, Mode, TransitionEditor},
    },
    foundation::{
        core::{FadeKind, LayerId},
        diagnostics::{DiagnosticLog, FIELD_DELIMITER, sanitize},
        error::{KitError, KitResult},
        settings::{EngineSettings, PLUGIN_VERSION},
    },
    host::{
        api::{CompInfo, TimelineHost},
        cursor::UndoScope,
    },
    motion::segmenter::{Transition, segment_layer},
};

const NO_COMPOSITION: &str = "No composition selected";
const NO_LAYERS: &str = "No layers selected";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Result of one entry-point call.
///
/// Renders to the panel's delimited form with [`Outcome::to_result_string`]:
/// `success|line|line...` or `error|message|line|line...`.
pub struct Outcome {
    pub status: Status,
    /// Failure reason; `None` on success.
    pub message: Option<String>,
    /// Diagnostic lines in the order they were logged.
    pub lines: Vec<String>,
    /// What changed, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<EditSummary>,
}

impl Outcome {
    fn success(summary: EditSummary, lines: Vec<String>) -> Self {
        Self {
            status: Status::Success,
            message: None,
            lines,
            summary: Some(summary),
        }
    }

    fn failure(message: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(sanitize(message.into())),
            lines,
            summary: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn to_result_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status.as_str())?;
        for field in self.message.iter().chain(self.lines.iter()) {
            write!(f, "{FIELD_DELIMITER}{field}")?;
        }
        Ok(())
    }
}

/// Version string shown by the panel.
pub fn plugin_version() -> &'static str {
    PLUGIN_VERSION
}

/// Add a fade-out (and its slide, for a new transition) to the selected layers.
#[tracing::instrument(skip(host, params, settings))]
pub fn add_exit_transition<H: TimelineHost + ?Sized>(
    host: &mut H,
    params: &TransitionParams,
    settings: &EngineSettings,
) -> Outcome {
    add_transition(host, FadeKind::Exit, params, settings)
}

/// Add a fade-in (and its slide, for a new transition) to the selected layers.
#[tracing::instrument(skip(host, params, settings))]
pub fn add_enter_transition<H: TimelineHost + ?Sized>(
    host: &mut H,
    params: &TransitionParams,
    settings: &EngineSettings,
) -> Outcome {
    add_transition(host, FadeKind::Enter, params, settings)
}

fn undo_group_name(kind: FadeKind) -> &'static str {
    match kind {
        FadeKind::Exit => "Add Exit Transition",
        FadeKind::Enter => "Add Enter Transition",
    }
}

/// Shared body of both entry points; never returns an error, only a failed [`Outcome`].
fn add_transition<H: TimelineHost + ?Sized>(
    host: &mut H,
    kind: FadeKind,
    params: &TransitionParams,
    settings: &EngineSettings,
) -> Outcome {
    let mut log = DiagnosticLog::new();
    log.log(format!(
        "add {kind} transition: type={} direction={} slide={} fadeOut={}+{} fadeIn={}+{}",
        params.transition_type,
        params.direction,
        params.slide_distance,
        params.fade_out_delay,
        params.fade_out_duration,
        params.fade_in_delay,
        params.fade_in_duration
    ));

    let Some(comp) = host.active_composition() else {
        host.alert("Please select a composition first.");
        return Outcome::failure(NO_COMPOSITION, Vec::new());
    };
    let selected = match host.selected_layers() {
        Ok(selected) => selected,
        Err(e) => return fail(kind, e, log),
    };
    if selected.is_empty() {
        host.alert("Please select at least one layer.");
        return Outcome::failure(NO_LAYERS, Vec::new());
    }

    match run_edit(host, kind, params, settings, &comp, &selected, &mut log) {
        Ok(summary) => {
            log.info(format!(
                "{} transition {} {} on {} ({} layer(s))",
                kind.label(),
                summary.transition,
                match summary.mode {
                    Mode::Create => "created",
                    Mode::Update => "updated",
                },
                summary.driver,
                summary.linked.len() + summary.annotated.len()
            ));
            Outcome::success(summary, log.into_lines())
        }
        Err(e) => fail(kind, e, log),
    }
}

fn run_edit<H: TimelineHost + ?Sized>(
    host: &mut H,
    kind: FadeKind,
    params: &TransitionParams,
    settings: &EngineSettings,
    comp: &CompInfo,
    selected: &[LayerId],
    log: &mut DiagnosticLog,
) -> KitResult<EditSummary> {
    settings.validate()?;
    let timing = params.resolve(comp.frame_rate)?;

    let mut scope = UndoScope::open(host, undo_group_name(kind));
    let result =
        TransitionEditor::new(&mut *scope, settings, log).run(kind, &timing, comp, selected);
    result
}

fn fail(kind: FadeKind, err: KitError, mut log: DiagnosticLog) -> Outcome {
    log.error(&format!("add {kind} transition"), &err);
    Outcome::failure(err.to_string(), log.into_lines())
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Driver track as seen from outside.
pub struct DriverReport {
    pub name: String,
    pub keys: usize,
    pub kind: Option<FadeKind>,
    /// Layers whose opacity reads this driver.
    pub linked_layers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Read-only view of a composition's controller.
pub struct ControllerReport {
    pub controller: String,
    pub transitions: Vec<Transition>,
    pub drivers: Vec<DriverReport>,
}

/// Segmented transitions and drivers of the controller, or `None` without one.
pub fn inspect<H: TimelineHost + ?Sized>(
    host: &H,
    settings: &EngineSettings,
) -> KitResult<Option<ControllerReport>> {
    let comp = host
        .active_composition()
        .ok_or_else(|| KitError::precondition(NO_COMPOSITION))?;
    let Some(controller) = locate_controller(host, settings)? else {
        return Ok(None);
    };

    let transitions = if host.position_keys(controller)?.is_empty() {
        Vec::new()
    } else {
        segment_layer(host, controller, &comp, settings)?
    };

    let mut drivers = Vec::new();
    for name in host.drivers(controller)? {
        let keys = host.driver_keys(controller, &name)?;
        let mut linked = Vec::new();
        for layer in linked_layers(host, controller, &settings.controller_name, &name)? {
            linked.push(host.layer_name(layer)?);
        }
        drivers.push(DriverReport {
            kind: detect_kind_by_label(&keys, settings),
            keys: keys.len(),
            name,
            linked_layers: linked,
        });
    }

    Ok(Some(ControllerReport {
        controller: settings.controller_name.clone(),
        transitions,
        drivers,
    }))
}

#[cfg(test)]
#[path = "../tests/unit/api.rs"]
mod tests;
