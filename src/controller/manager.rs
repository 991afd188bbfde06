use crate::{
    foundation::{
        core::LayerId, diagnostics::DiagnosticLog, error::KitResult, settings::EngineSettings,
    },
    host::api::TimelineHost,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Controller found or made for the current request.
pub struct ControllerSlot {
    pub layer: LayerId,
    /// True when this request created the controller.
    pub created: bool,
}

/// First layer carrying the reserved controller name.
pub fn locate_controller<H: TimelineHost + ?Sized>(
    host: &H,
    settings: &EngineSettings,
) -> KitResult<Option<LayerId>> {
    for layer in host.layers()? {
        if host.layer_name(layer)? == settings.controller_name {
            return Ok(Some(layer));
        }
    }
    Ok(None)
}

/// Create the controller and slot it directly below the bottommost selected layer.
///
/// `selected_indices` are 1-based stack indices captured before creation. The new layer enters at
/// the top, so every captured index is one lower than the layer's index afterwards.
pub fn create_controller<H: TimelineHost + ?Sized>(
    host: &mut H,
    settings: &EngineSettings,
    selected_indices: &[usize],
    log: &mut DiagnosticLog,
) -> KitResult<LayerId> {
    let bottommost = selected_indices.iter().copied().max();
    let controller = host.create_layer(&settings.controller_name)?;

    let Some(bottommost) = bottommost else {
        log.log(format!(
            "Controller created at index {} (no selected layers to position against)",
            host.layer_index(controller)?
        ));
        return Ok(controller);
    };

    let layers = host.layers()?;
    let shifted = (bottommost + 1).min(layers.len());
    let anchor = layers[shifted - 1];
    if anchor != controller {
        host.move_after(controller, anchor)?;
    }
    log.log(format!(
        "Controller positioned at index {} (below original selected layer {bottommost})",
        host.layer_index(controller)?
    ));
    Ok(controller)
}

/// Existing controller, or a new one positioned against the current selection.
pub fn locate_or_create<H: TimelineHost + ?Sized>(
    host: &mut H,
    settings: &EngineSettings,
    log: &mut DiagnosticLog,
) -> KitResult<ControllerSlot> {
    if let Some(layer) = locate_controller(host, settings)? {
        log.log(format!("Found existing controller: {}", settings.controller_name));
        return Ok(ControllerSlot {
            layer,
            created: false,
        });
    }

    log.log("Creating new transition controller");
    let mut selected_indices = Vec::new();
    for layer in host.selected_layers()? {
        selected_indices.push(host.layer_index(layer)?);
    }
    let layer = create_controller(host, settings, &selected_indices, log)?;
    Ok(ControllerSlot {
        layer,
        created: true,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/controller/manager.rs"]
mod tests;
