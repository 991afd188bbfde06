use crate::{
    foundation::{
        core::{LayerId, TimeWindow, Vec2, format_ms},
        error::{KitError, KitResult},
        settings::EngineSettings,
    },
    host::api::{CompInfo, TimelineHost},
};

/// Slack when deciding whether the last frame boundary still lies inside the key range.
const FRAME_EDGE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// One slide gesture of the controller, derived from its position keys.
///
/// `index` is the 1-based rank at derivation time. It is recomputed on every read and is not a
/// stable identity.
pub struct Transition {
    pub index: u32,
    pub start: f64,
    pub end: f64,
}

impl Transition {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) * 0.5
    }
}

/// Frame-sampling movement detector.
#[derive(Clone, Copy, Debug)]
pub struct MotionSegmenter {
    frame_duration: f64,
    tolerance: f64,
    gap_threshold: f64,
}

impl MotionSegmenter {
    pub fn new(frame_rate: f64, settings: &EngineSettings) -> KitResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(KitError::validation("frame rate must be finite and > 0"));
        }
        Ok(Self {
            frame_duration: 1.0 / frame_rate,
            tolerance: settings.movement_tolerance,
            gap_threshold: settings.gap_threshold_s,
        })
    }

    fn moved(&self, a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() > self.tolerance || (a.y - b.y).abs() > self.tolerance
    }

    /// Frame boundaries from `first` through `last`, computed by index so the sequence is exact.
    fn frame_times(&self, first: f64, last: f64) -> impl Iterator<Item = f64> {
        let dt = self.frame_duration;
        (0u64..)
            .map(move |i| first + (i as f64) * dt)
            .take_while(move |t| *t <= last + FRAME_EDGE_EPSILON)
    }

    /// Partition a track into transitions.
    ///
    /// `key_times` are the track's key times in ascending order; `sample` evaluates the track.
    #[tracing::instrument(
        level = "debug",
        skip(self, key_times, sample),
        fields(keys = key_times.len())
    )]
    pub fn segment<F>(&self, key_times: &[f64], mut sample: F) -> KitResult<Vec<Transition>>
    where
        F: FnMut(f64) -> KitResult<Vec2>,
    {
        let (first, last) = match key_times {
            [] => return Ok(Vec::new()),
            [only] => {
                return Ok(vec![Transition {
                    index: 1,
                    start: *only,
                    end: *only,
                }]);
            }
            [first, .., last] => (*first, *last),
        };

        let mut transitions = Vec::new();
        let mut current_start: Option<f64> = None;
        let mut last_movement: Option<f64> = None;
        let mut previous: Option<Vec2> = None;

        for t in self.frame_times(first, last) {
            let pos = sample(t)?;
            if let Some(prev) = previous
                && self.moved(pos, prev)
            {
                let opened_at = (t - self.frame_duration).max(last_movement.unwrap_or(first));
                match (current_start, last_movement) {
                    (None, _) => {
                        current_start = Some(opened_at);
                        tracing::trace!(start = %format_ms(opened_at), "transition opens");
                    }
                    (Some(start), Some(last_move)) if t - last_move > self.gap_threshold => {
                        transitions.push(Transition {
                            index: transitions.len() as u32 + 1,
                            start,
                            end: last_move,
                        });
                        tracing::trace!(end = %format_ms(last_move), "transition closes at gap");
                        current_start = Some(opened_at);
                    }
                    _ => {}
                }
                last_movement = Some(t);
            }
            previous = Some(pos);
        }

        if let Some(start) = current_start {
            transitions.push(Transition {
                index: transitions.len() as u32 + 1,
                start,
                end: last_movement.unwrap_or(last),
            });
        }

        if transitions.is_empty() {
            tracing::debug!("no movement detected, using full key range");
            transitions.push(Transition {
                index: 1,
                start: first,
                end: last,
            });
        }

        tracing::debug!(count = transitions.len(), "segmented transitions");
        Ok(transitions)
    }

    /// First-to-last movement over the whole track, or the key range when nothing moves.
    pub fn bounds<F>(&self, key_times: &[f64], mut sample: F) -> KitResult<Option<TimeWindow>>
    where
        F: FnMut(f64) -> KitResult<Vec2>,
    {
        let (first, last) = match key_times {
            [] => return Ok(None),
            [only] => {
                return Ok(Some(TimeWindow {
                    start: *only,
                    end: *only,
                }));
            }
            [first, .., last] => (*first, *last),
        };

        let mut start: Option<f64> = None;
        let mut end: Option<f64> = None;
        let mut previous: Option<Vec2> = None;
        for t in self.frame_times(first, last) {
            let pos = sample(t)?;
            if let Some(prev) = previous
                && self.moved(pos, prev)
            {
                start.get_or_insert(t - self.frame_duration);
                end = Some(t);
            }
            previous = Some(pos);
        }

        Ok(Some(TimeWindow {
            start: start.unwrap_or(first),
            end: end.unwrap_or(last),
        }))
    }
}

/// Segment a layer's position track as it currently stands in the host.
pub fn segment_layer<H: TimelineHost + ?Sized>(
    host: &H,
    layer: LayerId,
    comp: &CompInfo,
    settings: &EngineSettings,
) -> KitResult<Vec<Transition>> {
    let key_times: Vec<f64> = host.position_keys(layer)?.iter().map(|k| k.time).collect();
    MotionSegmenter::new(comp.frame_rate, settings)?
        .segment(&key_times, |t| host.position_at(layer, t))
}

/// Overall motion bounds of a layer's position track.
pub fn motion_bounds<H: TimelineHost + ?Sized>(
    host: &H,
    layer: LayerId,
    comp: &CompInfo,
    settings: &EngineSettings,
) -> KitResult<Option<TimeWindow>> {
    let key_times: Vec<f64> = host.position_keys(layer)?.iter().map(|k| k.time).collect();
    MotionSegmenter::new(comp.frame_rate, settings)?
        .bounds(&key_times, |t| host.position_at(layer, t))
}

#[cfg(test)]
#[path = "../../tests/unit/motion/segmenter.rs"]
mod tests;
