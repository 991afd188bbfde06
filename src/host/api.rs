use crate::foundation::{
    core::{LabelColor, LayerId, Vec2},
    error::{KitError, KitResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Properties of the active composition the engine reads.
pub struct CompInfo {
    /// Display name.
    pub name: String,
    /// Frames per second.
    pub frame_rate: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One keyframe of a 2D position track.
pub struct PositionKey {
    pub time: f64,
    pub value: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One keyframe of a scalar driver track.
pub struct ScalarKey {
    pub time: f64,
    pub value: f64,
    #[serde(default)]
    pub label: LabelColor,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Text annotation on a layer.
pub struct Marker {
    pub time: f64,
    pub comment: String,
}

/// Operations the engine needs from the application that owns the composition.
///
/// Layer order is top to bottom. Key indices are 0-based positions in the time-sorted key list.
/// Writing a key at a time that already holds one replaces that key's value and keeps its tag;
/// writing a marker at an occupied time replaces the marker.
pub trait TimelineHost {
    /// The active composition, if any.
    fn active_composition(&self) -> Option<CompInfo>;

    /// All layers of the active composition, top to bottom.
    fn layers(&self) -> KitResult<Vec<LayerId>>;
    fn layer_name(&self, layer: LayerId) -> KitResult<String>;
    fn is_selected(&self, layer: LayerId) -> KitResult<bool>;
    /// Create a layer at the top of the stack.
    fn create_layer(&mut self, name: &str) -> KitResult<LayerId>;
    fn move_before(&mut self, layer: LayerId, target: LayerId) -> KitResult<()>;
    fn move_after(&mut self, layer: LayerId, target: LayerId) -> KitResult<()>;

    fn position_keys(&self, layer: LayerId) -> KitResult<Vec<PositionKey>>;
    fn position_at(&self, layer: LayerId, time: f64) -> KitResult<Vec2>;
    fn set_position_at(&mut self, layer: LayerId, time: f64, value: Vec2) -> KitResult<usize>;

    /// Names of scalar driver tracks on a layer, in creation order.
    fn drivers(&self, layer: LayerId) -> KitResult<Vec<String>>;
    fn add_driver(&mut self, layer: LayerId, name: &str) -> KitResult<()>;
    fn driver_keys(&self, layer: LayerId, driver: &str) -> KitResult<Vec<ScalarKey>>;
    fn set_driver_at(
        &mut self,
        layer: LayerId,
        driver: &str,
        time: f64,
        value: f64,
    ) -> KitResult<usize>;
    fn set_driver_label(
        &mut self,
        layer: LayerId,
        driver: &str,
        key_index: usize,
        label: LabelColor,
    ) -> KitResult<()>;

    fn markers(&self, layer: LayerId) -> KitResult<Vec<Marker>>;
    fn set_marker(&mut self, layer: LayerId, marker: Marker) -> KitResult<()>;

    fn opacity_formula(&self, layer: LayerId) -> KitResult<Option<String>>;
    fn set_opacity_formula(&mut self, layer: LayerId, formula: &str) -> KitResult<()>;
    /// Parent `layer` to `parent`, keeping its on-screen placement at the current time.
    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>) -> KitResult<()>;

    fn begin_undo_group(&mut self, name: &str);
    fn end_undo_group(&mut self);

    fn current_time(&self) -> KitResult<f64>;
    fn set_current_time(&mut self, time: f64) -> KitResult<()>;

    /// Blocking notice shown to the user.
    fn alert(&mut self, message: &str);

    /// 1-based stack index of a layer.
    fn layer_index(&self, layer: LayerId) -> KitResult<usize> {
        self.layers()?
            .iter()
            .position(|l| *l == layer)
            .map(|i| i + 1)
            .ok_or_else(|| KitError::host(format!("layer {layer} not found")))
    }

    /// Selected layers, top to bottom.
    fn selected_layers(&self) -> KitResult<Vec<LayerId>> {
        let mut out = Vec::new();
        for layer in self.layers()? {
            if self.is_selected(layer)? {
                out.push(layer);
            }
        }
        Ok(out)
    }

    fn driver_exists(&self, layer: LayerId, driver: &str) -> KitResult<bool> {
        Ok(self.drivers(layer)?.iter().any(|d| d == driver))
    }
}
