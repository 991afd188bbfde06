use crate::{
    foundation::{
        core::{Direction, LayerId, TimeWindow, Vec2},
        error::KitResult,
    },
    host::api::TimelineHost,
};

/// Slide distance scaled to the composition width.
///
/// `base` is authored against `reference_width`; a zero width leaves it unscaled.
pub fn scaled_slide_distance(
    base: f64,
    _direction: Direction,
    comp_width: u32,
    reference_width: f64,
) -> f64 {
    if comp_width == 0 || reference_width <= 0.0 {
        return base;
    }
    base * (f64::from(comp_width) / reference_width)
}

/// [`scaled_slide_distance`] against the stock 786 px reference width.
pub fn calculate_slide_distance(base: f64, direction: Direction, comp_width: u32) -> f64 {
    scaled_slide_distance(base, direction, comp_width, 786.0)
}

/// End point of a slide of `distance` from `start`.
pub fn slide_target(start: Vec2, direction: Direction, distance: f64) -> Vec2 {
    start + direction.unit() * distance
}

/// Direction a layer actually moved across `window`, read from its position track.
///
/// Falls back to [`Direction::Left`] when the track has fewer than two keys.
pub fn infer_direction<H: TimelineHost + ?Sized>(
    host: &H,
    layer: LayerId,
    window: TimeWindow,
) -> KitResult<Direction> {
    if host.position_keys(layer)?.len() < 2 {
        tracing::debug!("not enough position keys to infer direction, defaulting to left");
        return Ok(Direction::Left);
    }
    let start = host.position_at(layer, window.start)?;
    let end = host.position_at(layer, window.end)?;
    let delta = end - start;
    let direction = Direction::from_delta(delta);
    tracing::debug!(dx = delta.x, dy = delta.y, %direction, "inferred slide direction");
    Ok(direction)
}

#[cfg(test)]
#[path = "../../tests/unit/motion/direction.rs"]
mod tests;
