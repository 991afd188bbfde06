use crate::{
    driver::naming::references_driver,
    foundation::{
        core::{Direction, FadeKind, LayerId, TimeWindow},
        error::KitResult,
    },
    host::api::{Marker, TimelineHost},
};

/// Marker text for a fade, e.g. `← Fade Out`.
pub fn marker_text(kind: FadeKind, direction: Direction) -> String {
    format!("{} {}", direction.glyph(), kind.label())
}

/// Fade kind named anywhere in a marker's text.
pub fn marker_kind(comment: &str) -> Option<FadeKind> {
    if comment.contains(FadeKind::Exit.label()) {
        Some(FadeKind::Exit)
    } else if comment.contains(FadeKind::Enter.label()) {
        Some(FadeKind::Enter)
    } else {
        None
    }
}

/// Fade kind of a marker written without a direction glyph (`Fade Out ...`).
pub fn bare_marker_kind(comment: &str) -> Option<FadeKind> {
    [FadeKind::Exit, FadeKind::Enter]
        .into_iter()
        .find(|k| comment.starts_with(k.label()))
}

/// Marker found on a layer by one of the scans below.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerHit {
    pub layer: LayerId,
    pub marker: Marker,
    pub kind: FadeKind,
}

fn scan<H, F>(
    host: &H,
    layers: &[LayerId],
    window: TimeWindow,
    classify: F,
) -> KitResult<Option<MarkerHit>>
where
    H: TimelineHost + ?Sized,
    F: Fn(&str) -> Option<FadeKind>,
{
    for &layer in layers {
        for marker in host.markers(layer)? {
            if !window.contains(marker.time) {
                continue;
            }
            if let Some(kind) = classify(&marker.comment) {
                return Ok(Some(MarkerHit {
                    layer,
                    marker,
                    kind,
                }));
            }
        }
    }
    Ok(None)
}

/// First marker of `kind` inside `window` on any of `layers`.
pub fn find_same_kind_marker<H: TimelineHost + ?Sized>(
    host: &H,
    layers: &[LayerId],
    kind: FadeKind,
    window: TimeWindow,
) -> KitResult<Option<MarkerHit>> {
    scan(host, layers, window, |c| marker_kind(c).filter(|k| *k == kind))
}

/// First glyph-less fade marker of either kind inside `window` on any of `layers`.
pub fn find_bare_fade_marker<H: TimelineHost + ?Sized>(
    host: &H,
    layers: &[LayerId],
    window: TimeWindow,
) -> KitResult<Option<MarkerHit>> {
    scan(host, layers, window, bare_marker_kind)
}

/// Layers (other than the controller) whose opacity formula reads `driver`.
pub fn linked_layers<H: TimelineHost + ?Sized>(
    host: &H,
    controller: LayerId,
    controller_name: &str,
    driver: &str,
) -> KitResult<Vec<LayerId>> {
    let mut out = Vec::new();
    for layer in host.layers()? {
        if layer == controller {
            continue;
        }
        if let Some(formula) = host.opacity_formula(layer)?
            && references_driver(&formula, controller_name, driver)
        {
            out.push(layer);
        }
    }
    Ok(out)
}

pub fn place_marker<H: TimelineHost + ?Sized>(
    host: &mut H,
    layer: LayerId,
    time: f64,
    kind: FadeKind,
    direction: Direction,
) -> KitResult<()> {
    host.set_marker(
        layer,
        Marker {
            time,
            comment: marker_text(kind, direction),
        },
    )
}

#[cfg(test)]
#[path = "../../tests/unit/editor/markers.rs"]
mod tests;
