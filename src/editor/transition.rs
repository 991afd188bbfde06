use crate::{
    controller::manager::{ControllerSlot, locate_or_create},
    driver::{
        naming::{link_formula, linked_drivers, next_transition_number},
        resolver::{DriverRequest, DriverSource, resolve_driver, write_fade_keys},
    },
    editor::{
        markers::{find_bare_fade_marker, find_same_kind_marker, linked_layers, place_marker},
        params::FadeTiming,
    },
    foundation::{
        core::{Direction, FadeKind, LayerId, TimeWindow, format_ms},
        diagnostics::DiagnosticLog,
        error::{KitError, KitResult},
        settings::EngineSettings,
    },
    host::{
        api::{CompInfo, TimelineHost},
        cursor::CursorGuard,
    },
    motion::{
        direction::{infer_direction, scaled_slide_distance, slide_target},
        locator::{find_by_index, first_overlap, locate},
        segmenter::{Transition, motion_bounds, segment_layer},
    },
};

/// Stage of one edit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorState {
    LocatingController,
    LocatingTransition,
    Validating,
    MutatingDriver,
    MutatingPosition,
    LinkingLayers,
    Done,
}

/// Whether a request adds a transition or edits the one under the playhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Create,
    Update,
}

/// Transition a request works on, fixed once per call.
#[derive(Clone, Debug, PartialEq)]
struct Target {
    mode: Mode,
    number: u32,
    window: TimeWindow,
    /// Transitions segmented from the controller before this call; empty without position keys.
    existing: Vec<Transition>,
}

/// What one successful request changed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EditSummary {
    pub kind: FadeKind,
    pub mode: Mode,
    pub transition: u32,
    pub window: TimeWindow,
    pub controller: LayerId,
    pub controller_created: bool,
    pub driver: String,
    pub driver_source: DriverSource,
    pub keys_written: bool,
    pub direction: Direction,
    /// Selected layers parented and marked.
    pub linked: Vec<LayerId>,
    /// Other layers already reading the driver that received a marker.
    pub annotated: Vec<LayerId>,
}

/// Runs one add-fade request against a host.
///
/// The caller owns the undo group; the editor owns the time cursor and restores it before
/// returning.
pub struct TransitionEditor<'a, H: TimelineHost + ?Sized> {
    host: &'a mut H,
    settings: &'a EngineSettings,
    log: &'a mut DiagnosticLog,
    state: EditorState,
}

impl<'a, H: TimelineHost + ?Sized> TransitionEditor<'a, H> {
    pub fn new(host: &'a mut H, settings: &'a EngineSettings, log: &'a mut DiagnosticLog) -> Self {
        Self {
            host,
            settings,
            log,
            state: EditorState::LocatingController,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    fn enter(&mut self, state: EditorState) {
        tracing::debug!(from = ?self.state, to = ?state, "editor state");
        self.state = state;
    }

    /// Add a fade of `kind` for `selected` layers at the current time.
    ///
    /// On error `state()` reports the stage that failed.
    #[tracing::instrument(
        level = "debug",
        skip(self, timing, comp, selected),
        fields(%kind, layers = selected.len())
    )]
    pub fn run(
        &mut self,
        kind: FadeKind,
        timing: &FadeTiming,
        comp: &CompInfo,
        selected: &[LayerId],
    ) -> KitResult<EditSummary> {
        self.enter(EditorState::LocatingController);
        let slot = locate_or_create(self.host, self.settings, self.log)?;

        self.enter(EditorState::LocatingTransition);
        let now = self.host.current_time()?;
        let target = self.locate_target(slot, comp, now)?;

        self.enter(EditorState::Validating);
        self.validate(kind, &target, selected)?;

        self.enter(EditorState::MutatingDriver);
        let base = match target.mode {
            Mode::Update => target.window.start,
            Mode::Create => now,
        };
        let (delay, duration) = match kind {
            FadeKind::Exit => (timing.fade_out_delay, timing.fade_out_duration),
            FadeKind::Enter => (timing.fade_in_delay, timing.fade_in_duration),
        };
        let fade = TimeWindow::new(base + delay, base + delay + duration)?;
        let request = DriverRequest {
            controller: slot.layer,
            controller_name: &self.settings.controller_name,
            transition: target.number,
            kind,
            update: target.mode == Mode::Update,
            window: target.window,
            fade,
            selected,
        };
        let resolution = resolve_driver(self.host, &request, self.settings, self.log)?;
        if resolution.write_keys {
            write_fade_keys(
                self.host,
                slot.layer,
                &resolution.driver,
                kind,
                fade,
                self.settings,
                self.log,
            )?;
        } else {
            self.log.log(format!(
                "{} already carries this {kind}, no keyframes added",
                resolution.driver
            ));
        }

        self.enter(EditorState::MutatingPosition);
        if target.mode == Mode::Create {
            self.write_slide(slot.layer, timing, comp, now)?;
        }

        self.enter(EditorState::LinkingLayers);
        let window = match target.mode {
            Mode::Create => target.window,
            Mode::Update => self.refresh_window(slot.layer, comp, &target)?,
        };
        let direction = match target.mode {
            Mode::Create => timing.direction,
            Mode::Update => {
                let inferred = infer_direction(&*self.host, slot.layer, window)?;
                if inferred != timing.direction {
                    self.log.log(format!(
                        "Using slide direction '{inferred}' from existing keyframes instead of '{}'",
                        timing.direction
                    ));
                }
                inferred
            }
        };
        let (parent_time, marker_time) = match kind {
            FadeKind::Exit => {
                let start = match target.mode {
                    Mode::Create => now,
                    Mode::Update => window.start,
                };
                (start, start + timing.fade_out_delay)
            }
            FadeKind::Enter => (window.end, window.start + timing.fade_in_delay),
        };
        let links = Links {
            controller: slot.layer,
            driver: &resolution.driver,
            kind,
            direction,
            parent_time,
            marker_time,
        };
        let (linked, annotated) = self.link_layers(&links, selected)?;

        self.enter(EditorState::Done);
        Ok(EditSummary {
            kind,
            mode: target.mode,
            transition: target.number,
            window,
            controller: slot.layer,
            controller_created: slot.created,
            driver: resolution.driver,
            driver_source: resolution.source,
            keys_written: resolution.write_keys,
            direction,
            linked,
            annotated,
        })
    }

    fn locate_target(
        &mut self,
        slot: ControllerSlot,
        comp: &CompInfo,
        now: f64,
    ) -> KitResult<Target> {
        let provisional = TimeWindow::new(now, now + self.settings.slide_duration_s)?;
        if slot.created {
            self.log.log("New controller, creating transition 1");
            return Ok(Target {
                mode: Mode::Create,
                number: 1,
                window: provisional,
                existing: Vec::new(),
            });
        }

        let existing = if self.host.position_keys(slot.layer)?.len() >= 2 {
            segment_layer(&*self.host, slot.layer, comp, self.settings)?
        } else {
            Vec::new()
        };
        for t in &existing {
            self.log.log(format!(
                "Transition {}: {} to {}",
                t.index,
                format_ms(t.start),
                format_ms(t.end)
            ));
        }

        if let Some(hit) = locate(&existing, now, self.settings.playhead_tolerance_s) {
            self.log.log(format!(
                "Playhead at {} is inside transition {}",
                format_ms(now),
                hit.index
            ));
            return Ok(Target {
                mode: Mode::Update,
                number: hit.index,
                window: hit.window(),
                existing,
            });
        }

        let number = next_transition_number(&*self.host, slot.layer)?;
        self.log.log(format!(
            "Playhead at {} is outside every transition, creating transition {number}",
            format_ms(now)
        ));
        Ok(Target {
            mode: Mode::Create,
            number,
            window: provisional,
            existing,
        })
    }

    fn validate(
        &mut self,
        kind: FadeKind,
        target: &Target,
        selected: &[LayerId],
    ) -> KitResult<()> {
        match target.mode {
            Mode::Update => {
                if let Some(hit) = find_bare_fade_marker(&*self.host, selected, target.window)? {
                    self.host.alert(
                        "Can't add overlapping transitions - selected layers already have fade markers in this transition",
                    );
                    return Err(KitError::conflict(format!(
                        "layer {} already has a '{}' marker at {} in transition {}",
                        self.host.layer_name(hit.layer)?,
                        hit.marker.comment,
                        format_ms(hit.marker.time),
                        target.number
                    )));
                }
                let same_kind = find_same_kind_marker(&*self.host, selected, kind, target.window)?;
                if let Some(hit) = same_kind {
                    let name = self.host.layer_name(hit.layer)?;
                    let kind_text = match kind {
                        FadeKind::Exit => "fade-out",
                        FadeKind::Enter => "fade-in",
                    };
                    self.host.alert(&format!(
                        "Layer '{name}' already has a {kind_text} transition at this timeline position. Cannot add duplicate transition types."
                    ));
                    return Err(KitError::conflict(format!(
                        "duplicate {kind} for layer {name} in transition {}",
                        target.number
                    )));
                }
            }
            Mode::Create => {
                if let Some(other) = first_overlap(&target.existing, target.window) {
                    self.host.alert("Can't add overlapping transitions");
                    return Err(KitError::conflict(format!(
                        "new transition {} to {} overlaps transition {} ({} to {})",
                        format_ms(target.window.start),
                        format_ms(target.window.end),
                        other.index,
                        format_ms(other.start),
                        format_ms(other.end)
                    )));
                }
            }
        }
        self.log.log("No conflicting fades found");
        Ok(())
    }

    fn write_slide(
        &mut self,
        controller: LayerId,
        timing: &FadeTiming,
        comp: &CompInfo,
        now: f64,
    ) -> KitResult<()> {
        let start = self.host.position_at(controller, now)?;
        let distance = scaled_slide_distance(
            timing.slide_distance,
            timing.direction,
            comp.width,
            self.settings.reference_width_px,
        );
        let end = slide_target(start, timing.direction, distance);
        let end_time = now + self.settings.slide_duration_s;
        self.host.set_position_at(controller, now, start)?;
        self.host.set_position_at(controller, end_time, end)?;
        self.log.log(format!(
            "Slide {} by {distance:.1}px from {} to {}",
            timing.direction,
            format_ms(now),
            format_ms(end_time)
        ));
        Ok(())
    }

    /// Re-derive an existing transition's window after mutation, since indices are not stable.
    fn refresh_window(
        &mut self,
        controller: LayerId,
        comp: &CompInfo,
        target: &Target,
    ) -> KitResult<TimeWindow> {
        let current = segment_layer(&*self.host, controller, comp, self.settings)?;
        if let Some(t) = find_by_index(&current, target.number) {
            return Ok(t.window());
        }
        let bounds = motion_bounds(&*self.host, controller, comp, self.settings)?;
        self.log.log(format!(
            "Transition {} not found after edit, using overall motion bounds",
            target.number
        ));
        Ok(bounds.unwrap_or(target.window))
    }

    fn link_layers(
        &mut self,
        links: &Links<'_>,
        selected: &[LayerId],
    ) -> KitResult<(Vec<LayerId>, Vec<LayerId>)> {
        let controller_name = self.settings.controller_name.as_str();
        let log = &mut *self.log;
        let mut host = CursorGuard::new(&mut *self.host)?;
        host.seek(links.parent_time)?;

        let mut linked = Vec::new();
        for &layer in selected {
            if layer == links.controller {
                log.log("Skipping the controller itself");
                continue;
            }
            let name = host.layer_name(layer)?;
            host.set_parent(layer, Some(links.controller))?;
            place_marker(&mut *host, layer, links.marker_time, links.kind, links.direction)?;

            let existing = host
                .opacity_formula(layer)?
                .map(|f| linked_drivers(&f, controller_name))
                .unwrap_or_default();
            if let Some(current) = existing.first() {
                log.log(format!("{name} already linked to {current}"));
            } else {
                host.set_opacity_formula(layer, &link_formula(controller_name, links.driver))?;
                log.log(format!("Linked {name} opacity to {}", links.driver));
            }
            log.log(format!(
                "Parented {name} at {}, marker at {}",
                format_ms(links.parent_time),
                format_ms(links.marker_time)
            ));
            linked.push(layer);
        }

        let mut annotated = Vec::new();
        for layer in linked_layers(&*host, links.controller, controller_name, links.driver)? {
            if selected.contains(&layer) {
                continue;
            }
            place_marker(&mut *host, layer, links.marker_time, links.kind, links.direction)?;
            log.log(format!(
                "Marked {} (already linked to {})",
                host.layer_name(layer)?,
                links.driver
            ));
            annotated.push(layer);
        }
        Ok((linked, annotated))
    }
}

/// Where and how layers get attached to the controller.
struct Links<'d> {
    controller: LayerId,
    driver: &'d str,
    kind: FadeKind,
    direction: Direction,
    parent_time: f64,
    marker_time: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/editor/transition.rs"]
mod tests;
