use crate::{
    foundation::{
        core::{LabelColor, LayerId, Vec2},
        error::{KitError, KitResult},
    },
    host::api::{CompInfo, Marker, PositionKey, ScalarKey, TimelineHost},
};

/// Two key or marker times closer than this address the same slot.
const SAME_TIME_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// In-process [`TimelineHost`] backed by a serde data model.
///
/// Used by the test-suite and the CLI. A whole scene round-trips through JSON, including the
/// alerts raised and undo groups recorded while editing.
pub struct MemoryHost {
    /// Active composition, `None` when nothing is open.
    pub composition: Option<MemoryComposition>,
    /// Blocking notices raised so far.
    #[serde(default)]
    pub alerts: Vec<String>,
    /// Names of closed undo groups, oldest first.
    #[serde(default)]
    pub undo_groups: Vec<String>,
    #[serde(skip)]
    open_undo: Vec<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Composition state held by [`MemoryHost`].
pub struct MemoryComposition {
    pub name: String,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
    /// Time cursor in seconds.
    #[serde(default)]
    pub time: f64,
    /// Layers top to bottom.
    #[serde(default)]
    pub layers: Vec<MemoryLayer>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One layer held by [`MemoryHost`].
pub struct MemoryLayer {
    pub id: LayerId,
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub parent: Option<LayerId>,
    #[serde(default)]
    pub position: PositionTrack,
    #[serde(default)]
    pub drivers: Vec<DriverTrack>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub opacity_formula: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Static value plus time-sorted keys; keys win when present.
pub struct PositionTrack {
    #[serde(default)]
    pub value: Vec2,
    #[serde(default)]
    pub keys: Vec<PositionKey>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Named scalar track (a slider effect on the controller).
pub struct DriverTrack {
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub keys: Vec<ScalarKey>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with an empty active composition.
    pub fn with_composition(name: &str, frame_rate: f64, width: u32, height: u32) -> Self {
        Self {
            composition: Some(MemoryComposition {
                name: name.to_string(),
                frame_rate,
                width,
                height,
                time: 0.0,
                layers: Vec::new(),
            }),
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> KitResult<Self> {
        let host: Self = serde_json::from_str(s)
            .map_err(|e| KitError::validation(format!("scene json: {e}")))?;
        if let Some(comp) = &host.composition
            && !(comp.frame_rate.is_finite() && comp.frame_rate > 0.0)
        {
            return Err(KitError::validation("frame_rate must be finite and > 0"));
        }
        Ok(host)
    }

    pub fn to_json_string(&self) -> KitResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| KitError::Other(e.into()))
    }

    /// Append a layer at the bottom of the stack.
    pub fn add_layer(&mut self, name: &str) -> KitResult<LayerId> {
        let comp = self.comp_mut()?;
        let id = next_id(&comp.layers);
        comp.layers.push(MemoryLayer::new(id, name));
        Ok(id)
    }

    pub fn select(&mut self, layer: LayerId, selected: bool) -> KitResult<()> {
        self.layer_mut(layer)?.selected = selected;
        Ok(())
    }

    pub fn deselect_all(&mut self) -> KitResult<()> {
        for l in &mut self.comp_mut()?.layers {
            l.selected = false;
        }
        Ok(())
    }

    pub fn layer(&self, layer: LayerId) -> KitResult<&MemoryLayer> {
        self.comp()?
            .layers
            .iter()
            .find(|l| l.id == layer)
            .ok_or_else(|| KitError::host(format!("layer {layer} not found")))
    }

    pub fn layer_mut(&mut self, layer: LayerId) -> KitResult<&mut MemoryLayer> {
        self.comp_mut()?
            .layers
            .iter_mut()
            .find(|l| l.id == layer)
            .ok_or_else(|| KitError::host(format!("layer {layer} not found")))
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&MemoryLayer> {
        self.composition
            .as_ref()?
            .layers
            .iter()
            .find(|l| l.name == name)
    }

    /// True while an undo group is open.
    pub fn undo_open(&self) -> bool {
        !self.open_undo.is_empty()
    }

    fn comp(&self) -> KitResult<&MemoryComposition> {
        self.composition
            .as_ref()
            .ok_or_else(|| KitError::host("no active composition"))
    }

    fn comp_mut(&mut self) -> KitResult<&mut MemoryComposition> {
        self.composition
            .as_mut()
            .ok_or_else(|| KitError::host("no active composition"))
    }

    fn driver_mut(&mut self, layer: LayerId, driver: &str) -> KitResult<&mut DriverTrack> {
        self.layer_mut(layer)?
            .drivers
            .iter_mut()
            .find(|d| d.name == driver)
            .ok_or_else(|| KitError::host(format!("driver effect not found: {driver}")))
    }

    fn take_layer(&mut self, layer: LayerId) -> KitResult<MemoryLayer> {
        let comp = self.comp_mut()?;
        let idx = comp
            .layers
            .iter()
            .position(|l| l.id == layer)
            .ok_or_else(|| KitError::host(format!("layer {layer} not found")))?;
        Ok(comp.layers.remove(idx))
    }

    fn stack_position(&self, layer: LayerId) -> KitResult<usize> {
        self.comp()?
            .layers
            .iter()
            .position(|l| l.id == layer)
            .ok_or_else(|| KitError::host(format!("layer {layer} not found")))
    }
}

impl MemoryLayer {
    pub fn new(id: LayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            selected: false,
            parent: None,
            position: PositionTrack::default(),
            drivers: Vec::new(),
            markers: Vec::new(),
            opacity_formula: None,
        }
    }

    pub fn driver(&self, name: &str) -> Option<&DriverTrack> {
        self.drivers.iter().find(|d| d.name == name)
    }
}

impl PositionTrack {
    /// Linear interpolation between keys, held flat outside the key range.
    pub fn sample(&self, time: f64) -> Vec2 {
        if self.keys.is_empty() {
            return self.value;
        }
        let idx = self.keys.partition_point(|k| k.time <= time);
        if idx == 0 {
            return self.keys[0].value;
        }
        if idx >= self.keys.len() {
            return self.keys[self.keys.len() - 1].value;
        }
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.time - a.time;
        if denom <= 0.0 {
            return a.value;
        }
        let t = (time - a.time) / denom;
        a.value + (b.value - a.value) * t
    }
}

fn next_id(layers: &[MemoryLayer]) -> LayerId {
    LayerId(layers.iter().map(|l| l.id.0).max().map_or(1, |m| m + 1))
}

fn upsert_position(keys: &mut Vec<PositionKey>, time: f64, value: Vec2) -> usize {
    if let Some(i) = keys
        .iter()
        .position(|k| (k.time - time).abs() < SAME_TIME_EPSILON)
    {
        keys[i].value = value;
        return i;
    }
    let i = keys.partition_point(|k| k.time < time);
    keys.insert(i, PositionKey { time, value });
    i
}

fn upsert_scalar(keys: &mut Vec<ScalarKey>, time: f64, value: f64) -> usize {
    if let Some(i) = keys
        .iter()
        .position(|k| (k.time - time).abs() < SAME_TIME_EPSILON)
    {
        keys[i].value = value;
        return i;
    }
    let i = keys.partition_point(|k| k.time < time);
    keys.insert(
        i,
        ScalarKey {
            time,
            value,
            label: LabelColor::NONE,
        },
    );
    i
}

impl TimelineHost for MemoryHost {
    fn active_composition(&self) -> Option<CompInfo> {
        self.composition.as_ref().map(|c| CompInfo {
            name: c.name.clone(),
            frame_rate: c.frame_rate,
            width: c.width,
            height: c.height,
        })
    }

    fn layers(&self) -> KitResult<Vec<LayerId>> {
        Ok(self.comp()?.layers.iter().map(|l| l.id).collect())
    }

    fn layer_name(&self, layer: LayerId) -> KitResult<String> {
        Ok(self.layer(layer)?.name.clone())
    }

    fn is_selected(&self, layer: LayerId) -> KitResult<bool> {
        Ok(self.layer(layer)?.selected)
    }

    fn create_layer(&mut self, name: &str) -> KitResult<LayerId> {
        let comp = self.comp_mut()?;
        let id = next_id(&comp.layers);
        comp.layers.insert(0, MemoryLayer::new(id, name));
        Ok(id)
    }

    fn move_before(&mut self, layer: LayerId, target: LayerId) -> KitResult<()> {
        if layer == target {
            return Ok(());
        }
        self.stack_position(target)?;
        let moving = self.take_layer(layer)?;
        let at = self.stack_position(target)?;
        self.comp_mut()?.layers.insert(at, moving);
        Ok(())
    }

    fn move_after(&mut self, layer: LayerId, target: LayerId) -> KitResult<()> {
        if layer == target {
            return Ok(());
        }
        self.stack_position(target)?;
        let moving = self.take_layer(layer)?;
        let at = self.stack_position(target)? + 1;
        self.comp_mut()?.layers.insert(at, moving);
        Ok(())
    }

    fn position_keys(&self, layer: LayerId) -> KitResult<Vec<PositionKey>> {
        Ok(self.layer(layer)?.position.keys.clone())
    }

    fn position_at(&self, layer: LayerId, time: f64) -> KitResult<Vec2> {
        Ok(self.layer(layer)?.position.sample(time))
    }

    fn set_position_at(&mut self, layer: LayerId, time: f64, value: Vec2) -> KitResult<usize> {
        Ok(upsert_position(
            &mut self.layer_mut(layer)?.position.keys,
            time,
            value,
        ))
    }

    fn drivers(&self, layer: LayerId) -> KitResult<Vec<String>> {
        Ok(self
            .layer(layer)?
            .drivers
            .iter()
            .map(|d| d.name.clone())
            .collect())
    }

    fn add_driver(&mut self, layer: LayerId, name: &str) -> KitResult<()> {
        self.layer_mut(layer)?.drivers.push(DriverTrack {
            name: name.to_string(),
            value: 0.0,
            keys: Vec::new(),
        });
        Ok(())
    }

    fn driver_keys(&self, layer: LayerId, driver: &str) -> KitResult<Vec<ScalarKey>> {
        self.layer(layer)?
            .driver(driver)
            .map(|d| d.keys.clone())
            .ok_or_else(|| KitError::host(format!("driver effect not found: {driver}")))
    }

    fn set_driver_at(
        &mut self,
        layer: LayerId,
        driver: &str,
        time: f64,
        value: f64,
    ) -> KitResult<usize> {
        Ok(upsert_scalar(
            &mut self.driver_mut(layer, driver)?.keys,
            time,
            value,
        ))
    }

    fn set_driver_label(
        &mut self,
        layer: LayerId,
        driver: &str,
        key_index: usize,
        label: LabelColor,
    ) -> KitResult<()> {
        let track = self.driver_mut(layer, driver)?;
        let key = track.keys.get_mut(key_index).ok_or_else(|| {
            KitError::host(format!("key {key_index} out of range on driver {driver}"))
        })?;
        key.label = label;
        Ok(())
    }

    fn markers(&self, layer: LayerId) -> KitResult<Vec<Marker>> {
        Ok(self.layer(layer)?.markers.clone())
    }

    fn set_marker(&mut self, layer: LayerId, marker: Marker) -> KitResult<()> {
        let markers = &mut self.layer_mut(layer)?.markers;
        if let Some(existing) = markers
            .iter_mut()
            .find(|m| (m.time - marker.time).abs() < SAME_TIME_EPSILON)
        {
            existing.comment = marker.comment;
            return Ok(());
        }
        let i = markers.partition_point(|m| m.time < marker.time);
        markers.insert(i, marker);
        Ok(())
    }

    fn opacity_formula(&self, layer: LayerId) -> KitResult<Option<String>> {
        Ok(self.layer(layer)?.opacity_formula.clone())
    }

    fn set_opacity_formula(&mut self, layer: LayerId, formula: &str) -> KitResult<()> {
        self.layer_mut(layer)?.opacity_formula = Some(formula.to_string());
        Ok(())
    }

    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>) -> KitResult<()> {
        if let Some(p) = parent {
            if p == layer {
                return Err(KitError::host(format!("layer {layer} cannot parent itself")));
            }
            self.layer(p)?;
        }
        self.layer_mut(layer)?.parent = parent;
        Ok(())
    }

    fn begin_undo_group(&mut self, name: &str) {
        self.open_undo.push(name.to_string());
    }

    fn end_undo_group(&mut self) {
        if let Some(name) = self.open_undo.pop() {
            self.undo_groups.push(name);
        }
    }

    fn current_time(&self) -> KitResult<f64> {
        Ok(self.comp()?.time)
    }

    fn set_current_time(&mut self, time: f64) -> KitResult<()> {
        self.comp_mut()?.time = time;
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        tracing::warn!(alert = message, "blocking notice");
        self.alerts.push(message.to_string());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
