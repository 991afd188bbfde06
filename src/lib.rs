//! Transition Kit is the inference and editing engine behind "slide + fade" transitions.
//!
//! One controller layer per composition carries the slide (position keys) and one scalar driver
//! track per fade. Layers hand their opacity to a driver through a formula and are parented to the
//! controller so they ride along with the slide.
//!
//! # Request flow
//!
//! 1. **Controller**: find the controller by its reserved name or create it below the selection.
//! 2. **Locate**: segment the controller's motion into transitions and test the playhead against
//!    them. Inside one means update mode, outside means a new transition.
//! 3. **Validate**: reject duplicate fades and overlapping slides before any mutation.
//! 4. **Mutate**: resolve the driver, write its two tagged keys, and write the slide for a new
//!    transition.
//! 5. **Link**: parent, mark and link the selected layers; mark every other layer on the driver.
//!
//! Transitions are never stored. Their indices are recomputed from the position track on every
//! read, so host-side undo needs no bookkeeping here.
//!
//! The engine talks to the application through [`TimelineHost`]. [`MemoryHost`] implements it
//! over a JSON scene and backs the tests and the `transition-kit` CLI.
#![forbid(unsafe_code)]

mod api;
mod controller;
mod driver;
mod editor;
mod foundation;
mod host;
mod motion;

pub use api::{
    ControllerReport, DriverReport, Outcome, Status, add_enter_transition, add_exit_transition,
    inspect, plugin_version,
};
pub use controller::manager::{
    ControllerSlot, create_controller, locate_controller, locate_or_create,
};
pub use driver::naming::{
    DriverName, driver_name, link_formula, linked_drivers, next_opacity_number,
    next_transition_number, references_driver,
};
pub use driver::resolver::{
    DriverRequest, DriverSource, Resolution, classify_fade_shape, detect_kind_by_label,
    resolve_driver, write_fade_keys,
};
pub use editor::markers::{
    MarkerHit, bare_marker_kind, find_bare_fade_marker, find_same_kind_marker, linked_layers,
    marker_kind, marker_text, place_marker,
};
pub use editor::params::{FadeTiming, TransitionParams, parse_number, parse_time_value};
pub use editor::transition::{EditSummary, EditorState, Mode, TransitionEditor};
pub use foundation::core::{Direction, FadeKind, LabelColor, LayerId, TimeWindow, Vec2, format_ms};
pub use foundation::diagnostics::{DiagnosticLog, FIELD_DELIMITER};
pub use foundation::error::{KitError, KitResult};
pub use foundation::settings::{EngineSettings, PLUGIN_VERSION};
pub use host::api::{CompInfo, Marker, PositionKey, ScalarKey, TimelineHost};
pub use host::cursor::{CursorGuard, UndoScope};
pub use host::memory::{DriverTrack, MemoryComposition, MemoryHost, MemoryLayer, PositionTrack};
pub use motion::direction::{
    calculate_slide_distance, infer_direction, scaled_slide_distance, slide_target,
};
pub use motion::locator::{find_by_index, first_overlap, locate};
pub use motion::segmenter::{MotionSegmenter, Transition, motion_bounds, segment_layer};
