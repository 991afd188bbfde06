use crate::{
    foundation::{core::LayerId, error::KitResult},
    host::api::TimelineHost,
};

const NAME_PREFIX: &str = "Transition ";
const NAME_INFIX: &str = " - Opacity ";

/// Parsed `Transition <N> - Opacity <M>` driver name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverName {
    /// Transition number at creation time.
    pub transition: u32,
    /// Disambiguator within that transition.
    pub opacity: u32,
}

impl DriverName {
    pub fn new(transition: u32, opacity: u32) -> Self {
        Self {
            transition,
            opacity,
        }
    }

    /// Parse a full driver name; anything else (including trailing text) is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(NAME_PREFIX)?;
        let (transition, opacity) = rest.split_once(NAME_INFIX)?;
        Some(Self {
            transition: parse_number(transition)?,
            opacity: parse_number(opacity)?,
        })
    }
}

impl std::fmt::Display for DriverName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{NAME_PREFIX}{}{NAME_INFIX}{}",
            self.transition, self.opacity
        )
    }
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

pub fn driver_name(transition: u32, opacity: u32) -> String {
    DriverName::new(transition, opacity).to_string()
}

fn parsed_drivers<H: TimelineHost + ?Sized>(
    host: &H,
    controller: LayerId,
) -> KitResult<Vec<DriverName>> {
    Ok(host
        .drivers(controller)?
        .iter()
        .filter_map(|d| DriverName::parse(d))
        .collect())
}

/// `1 + highest transition number` among the controller's driver names.
pub fn next_transition_number<H: TimelineHost + ?Sized>(
    host: &H,
    controller: LayerId,
) -> KitResult<u32> {
    let max = parsed_drivers(host, controller)?
        .iter()
        .map(|d| d.transition)
        .max()
        .unwrap_or(0);
    Ok(max + 1)
}

/// `1 + highest opacity number` among the drivers named for `transition`.
pub fn next_opacity_number<H: TimelineHost + ?Sized>(
    host: &H,
    controller: LayerId,
    transition: u32,
) -> KitResult<u32> {
    let max = parsed_drivers(host, controller)?
        .iter()
        .filter(|d| d.transition == transition)
        .map(|d| d.opacity)
        .max()
        .unwrap_or(0);
    Ok(max + 1)
}

/// Opacity formula that hands a layer's opacity to a controller driver.
pub fn link_formula(controller_name: &str, driver: &str) -> String {
    format!(r#"thisComp.layer("{controller_name}").effect("{driver}")("Slider")"#)
}

/// Driver names a formula reads from `controller_name`, in order of appearance.
pub fn linked_drivers(formula: &str, controller_name: &str) -> Vec<String> {
    if !formula.contains(&format!(r#""{controller_name}""#)) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut rest = formula;
    while let Some(at) = rest.find(r#"effect(""#) {
        rest = &rest[at + r#"effect(""#.len()..];
        let Some(close) = rest.find('"') else {
            break;
        };
        let name = &rest[..close];
        if DriverName::parse(name).is_some() {
            out.push(name.to_string());
        }
        rest = &rest[close..];
    }
    out
}

/// True when `formula` reads exactly `driver` from `controller_name`.
///
/// Names are matched with their quotes so `Opacity 1` never matches `Opacity 10`.
pub fn references_driver(formula: &str, controller_name: &str, driver: &str) -> bool {
    formula.contains(&format!(r#""{controller_name}""#))
        && formula.contains(&format!(r#""{driver}""#))
}

#[cfg(test)]
#[path = "../../tests/unit/driver/naming.rs"]
mod tests;
