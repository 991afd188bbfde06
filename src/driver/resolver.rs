use crate::{
    driver::naming::{DriverName, driver_name, linked_drivers, next_opacity_number},
    foundation::{
        core::{FadeKind, LayerId, TimeWindow, format_ms},
        diagnostics::DiagnosticLog,
        error::{KitError, KitResult},
        settings::EngineSettings,
    },
    host::api::{ScalarKey, TimelineHost},
};

/// Number of leading keys inspected by [`detect_kind_by_label`].
const LABEL_PROBE_KEYS: usize = 4;

/// Values at or above this count as "fully visible" when classifying a fade by shape.
const SHAPE_HIGH: f64 = 90.0;
/// Values at or below this count as "hidden" when classifying a fade by shape.
const SHAPE_LOW: f64 = 10.0;

/// Which signal produced a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverSource {
    /// A selected layer's opacity formula already reads the driver.
    LayerLink,
    /// The driver carries keys tagged with the requested kind inside the transition.
    KeyTag,
    /// Nothing matched; a new driver was added.
    Created,
}

/// Outcome of driver resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub driver: String,
    pub source: DriverSource,
    /// False when the driver already carries this fade; writing keys again would duplicate it.
    pub write_keys: bool,
}

/// Everything resolution needs to know about the request.
#[derive(Clone, Debug)]
pub struct DriverRequest<'a> {
    pub controller: LayerId,
    pub controller_name: &'a str,
    pub transition: u32,
    pub kind: FadeKind,
    /// True when editing a transition that already exists.
    pub update: bool,
    /// Window of the target transition.
    pub window: TimeWindow,
    /// Where this request's two keys will go.
    pub fade: TimeWindow,
    pub selected: &'a [LayerId],
}

impl DriverRequest<'_> {
    /// Window that a fade of this transition may occupy, including delays past its end.
    fn reach(&self) -> TimeWindow {
        self.window.union(self.fade)
    }
}

/// Find, reuse or create the driver for one fade.
///
/// Signals are consulted in order: selected layers' opacity formulas, then tagged keys on the
/// controller's drivers (update mode only), then a newly added driver.
#[tracing::instrument(
    level = "debug",
    skip(host, request, settings, log),
    fields(transition = request.transition, kind = %request.kind, update = request.update)
)]
pub fn resolve_driver<H: TimelineHost + ?Sized>(
    host: &mut H,
    request: &DriverRequest<'_>,
    settings: &EngineSettings,
    log: &mut DiagnosticLog,
) -> KitResult<Resolution> {
    if let Some(driver) = driver_from_layer_links(host, request, settings)? {
        let write_keys =
            !has_kind_in_window(&host.driver_keys(request.controller, &driver)?, request, settings);
        log.log(format!(
            "Reusing driver linked from selected layer: {driver}{}",
            if write_keys { "" } else { " (fade already present)" }
        ));
        return Ok(Resolution {
            driver,
            source: DriverSource::LayerLink,
            write_keys,
        });
    }

    if request.update
        && let Some(driver) = driver_from_key_tags(host, request, settings)?
    {
        log.log(format!(
            "Found existing {} driver by keyframe tag: {driver}",
            request.kind
        ));
        return Ok(Resolution {
            driver,
            source: DriverSource::KeyTag,
            write_keys: false,
        });
    }

    let opacity = next_opacity_number(host, request.controller, request.transition)?;
    let driver = driver_name(request.transition, opacity);
    host.add_driver(request.controller, &driver)?;
    log.log(format!("Created driver: {driver}"));
    Ok(Resolution {
        driver,
        source: DriverSource::Created,
        write_keys: true,
    })
}

/// Layer-expression signal.
///
/// A layer carries a single opacity formula, so whatever driver it already reads keeps being used.
/// A link whose driver is tagged with the requested kind wins over other links.
///
/// Any `Transition N - Opacity M` link counts, and its kind comes from the driver's key tags rather
/// than from `M`. Older panel releases only recognised `Opacity 1` as exit and `Opacity 2` as enter,
/// so a layer linked to `Opacity 3` or higher is reused here where those releases ignored it.
///
/// A link to a driver the controller does not carry is a host error. Nothing has been mutated yet
/// when it is raised.
fn driver_from_layer_links<H: TimelineHost + ?Sized>(
    host: &H,
    request: &DriverRequest<'_>,
    settings: &EngineSettings,
) -> KitResult<Option<String>> {
    let mut fallback: Option<String> = None;
    for &layer in request.selected {
        let Some(formula) = host.opacity_formula(layer)? else {
            continue;
        };
        for driver in linked_drivers(&formula, request.controller_name) {
            if !host.driver_exists(request.controller, &driver)? {
                return Err(KitError::host(format!(
                    "driver effect not found: {driver} (linked from layer {})",
                    host.layer_name(layer)?
                )));
            }
            let keys = host.driver_keys(request.controller, &driver)?;
            if detect_kind_by_label(&keys, settings) == Some(request.kind) {
                return Ok(Some(driver));
            }
            if fallback.is_none() {
                fallback = Some(driver);
            }
        }
    }
    Ok(fallback)
}

/// Keyframe-tag signal: first named driver with a key of the requested kind in the transition.
fn driver_from_key_tags<H: TimelineHost + ?Sized>(
    host: &H,
    request: &DriverRequest<'_>,
    settings: &EngineSettings,
) -> KitResult<Option<String>> {
    for driver in host.drivers(request.controller)? {
        if DriverName::parse(&driver).is_none() {
            continue;
        }
        let keys = host.driver_keys(request.controller, &driver)?;
        if keys.len() < 2 {
            continue;
        }
        let in_window: Vec<ScalarKey> = keys
            .iter()
            .copied()
            .filter(|k| request.window.contains(k.time))
            .collect();
        if in_window.is_empty() {
            continue;
        }
        let tagged = in_window
            .iter()
            .any(|k| settings.kind_for_label(k.label) == Some(request.kind));
        let untagged = in_window.iter().all(|k| k.label.is_none());
        if tagged || (untagged && classify_fade_shape(&in_window) == Some(request.kind)) {
            return Ok(Some(driver));
        }
        tracing::trace!(driver = driver.as_str(), "driver has keys in window of another kind");
    }
    Ok(None)
}

fn has_kind_in_window(
    keys: &[ScalarKey],
    request: &DriverRequest<'_>,
    settings: &EngineSettings,
) -> bool {
    let reach = request.reach();
    keys.iter().any(|k| {
        reach.contains(k.time) && settings.kind_for_label(k.label) == Some(request.kind)
    })
}

/// Kind of a driver from the first tagged key among its leading keys.
pub fn detect_kind_by_label(keys: &[ScalarKey], settings: &EngineSettings) -> Option<FadeKind> {
    if keys.len() < 2 {
        return None;
    }
    keys.iter()
        .take(LABEL_PROBE_KEYS)
        .find_map(|k| settings.kind_for_label(k.label))
}

/// Kind of a fade from the shape of its values: high to low is an exit, low to high an enter.
///
/// `keys` must be time-sorted. Fewer than two keys, or any other shape, is `None`.
pub fn classify_fade_shape(keys: &[ScalarKey]) -> Option<FadeKind> {
    let (first, last) = match keys {
        [first, .., last] => (first.value, last.value),
        _ => return None,
    };
    if first >= SHAPE_HIGH && last <= SHAPE_LOW {
        Some(FadeKind::Exit)
    } else if first <= SHAPE_LOW && last >= SHAPE_HIGH {
        Some(FadeKind::Enter)
    } else {
        None
    }
}

/// Write the two tagged keys of one fade onto `driver`.
pub fn write_fade_keys<H: TimelineHost + ?Sized>(
    host: &mut H,
    controller: LayerId,
    driver: &str,
    kind: FadeKind,
    fade: TimeWindow,
    settings: &EngineSettings,
    log: &mut DiagnosticLog,
) -> KitResult<()> {
    let (from, to) = kind.values();
    let label = settings.label_for(kind);
    let first = host.set_driver_at(controller, driver, fade.start, from)?;
    host.set_driver_label(controller, driver, first, label)?;
    let second = host.set_driver_at(controller, driver, fade.end, to)?;
    host.set_driver_label(controller, driver, second, label)?;
    log.log(format!(
        "Added {kind} keyframes to {driver} from {} to {} (label {})",
        format_ms(fade.start),
        format_ms(fade.end),
        label.0
    ));
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/driver/resolver.rs"]
mod tests;
