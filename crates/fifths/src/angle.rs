use std::str::FromStr;
use strum::{Display as StrumDisplay, EnumIter};
use thiserror::Error;

/// Home range of the outer (key) ring.
pub const OUTER_RANGE: AngleRange = AngleRange::new(-180, 180);
/// Home range of the inner (mode) ring. Only the mapped mode sectors are reachable.
pub const INNER_RANGE: AngleRange = AngleRange::new(-30, 150);

pub const OUTER_FREE_STEP: i32 = 10;
pub const INNER_FREE_STEP: i32 = 30;
pub const LINKED_STEP: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Ring {
    Outer,
    Inner,
}

impl Ring {
    pub fn other(self) -> Self {
        match self {
            Self::Outer => Self::Inner,
            Self::Inner => Self::Outer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleRange {
    pub min: i32,
    pub max: i32,
}

impl AngleRange {
    pub const fn new(min: i32, max: i32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn span(&self) -> i32 {
        self.max - self.min
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// Rounds `value` to the nearest multiple of `step`, halves away from zero.
pub fn snap(value: f64, step: i32) -> i32 {
    if step <= 0 {
        return value.round() as i32;
    }
    (value / step as f64).round() as i32 * step
}

/// Wraps `value` cyclically into `range`, modulo the range's span rather than 360.
///
/// Values already inside the range (bounds included) are returned as is. A
/// zero-span range has nothing to wrap over, so the value is only clamped.
pub fn wrap_into(value: i32, range: AngleRange) -> i32 {
    let span = range.span();
    if span <= 0 {
        return range.clamp(value);
    }
    if value < range.min {
        range.min + (value - range.min).rem_euclid(span)
    } else if value > range.max {
        range.max - (range.max - value).rem_euclid(span)
    } else {
        value
    }
}

/// Both ring angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Angles {
    pub outer: i32,
    pub inner: i32,
}

impl Angles {
    pub fn new(outer: i32, inner: i32) -> Self {
        Self { outer, inner }
    }

    pub fn get(&self, ring: Ring) -> i32 {
        match ring {
            Ring::Outer => self.outer,
            Ring::Inner => self.inner,
        }
    }
}

impl std::fmt::Display for Angles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.outer, self.inner)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnglesParseError {
    #[error("expected two comma-separated angles, got {0:?}")]
    Shape(String),
    #[error("invalid angle {0:?}")]
    Number(String),
}

impl FromStr for Angles {
    type Err = AnglesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [outer, inner] = parts.as_slice() else {
            return Err(AnglesParseError::Shape(s.to_string()));
        };
        let parse = |p: &str| {
            p.parse::<i32>()
                .map_err(|_| AnglesParseError::Number(p.to_string()))
        };
        Ok(Self::new(parse(*outer)?, parse(*inner)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Dial {
    value: i32,
    home: AngleRange,
    active: AngleRange,
    free_step: i32,
}

impl Dial {
    fn new(home: AngleRange, free_step: i32) -> Self {
        Self {
            value: 0,
            home,
            active: home,
            free_step,
        }
    }

    fn step(&self, linked: bool) -> i32 {
        if linked { LINKED_STEP } else { self.free_step }
    }

    fn coerce(&self, raw: f64, step: i32) -> i32 {
        let clamped = raw.clamp(self.active.min as f64, self.active.max as f64);
        self.active.clamp(snap(clamped, step))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    /// `inner - outer` at the moment the rings were linked.
    offset: i32,
}

/// Rotation state of both rings.
///
/// Values only change through [`AngleModel::set_angle`] and
/// [`AngleModel::set_linked`]. While linked, the ring being set drives the
/// other one, which is written directly and never re-enters `set_angle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleModel {
    outer: Dial,
    inner: Dial,
    link: Option<Link>,
}

impl Default for AngleModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AngleModel {
    pub fn new() -> Self {
        Self {
            outer: Dial::new(OUTER_RANGE, OUTER_FREE_STEP),
            inner: Dial::new(INNER_RANGE, INNER_FREE_STEP),
            link: None,
        }
    }

    fn dial(&self, ring: Ring) -> &Dial {
        match ring {
            Ring::Outer => &self.outer,
            Ring::Inner => &self.inner,
        }
    }

    fn dial_mut(&mut self, ring: Ring) -> &mut Dial {
        match ring {
            Ring::Outer => &mut self.outer,
            Ring::Inner => &mut self.inner,
        }
    }

    pub fn angles(&self) -> Angles {
        Angles::new(self.outer.value, self.inner.value)
    }

    pub fn angle(&self, ring: Ring) -> i32 {
        self.dial(ring).value
    }

    pub fn angle_a(&self) -> i32 {
        self.outer.value
    }

    pub fn angle_b(&self) -> i32 {
        self.inner.value
    }

    /// Range currently accepted by `ring`. Widened while linked.
    pub fn range(&self, ring: Ring) -> AngleRange {
        self.dial(ring).active
    }

    pub fn step(&self, ring: Ring) -> i32 {
        self.dial(ring).step(self.is_linked())
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    pub fn offset(&self) -> Option<i32> {
        self.link.map(|l| l.offset)
    }

    /// Clamps and snaps `raw` into `ring`, then drags the other ring along if linked.
    pub fn set_angle(&mut self, ring: Ring, raw: f64) -> i32 {
        let linked = self.is_linked();
        let dial = self.dial_mut(ring);
        dial.value = dial.coerce(raw, dial.step(linked));
        let value = dial.value;

        if let Some(link) = self.link {
            self.propagate(ring, link);
        }
        value
    }

    /// Coerces angles that arrive without any model behind them, as from a
    /// request or the command line.
    ///
    /// The sender may have been linked, so each ring is clamped to the linked
    /// union of both home ranges and snapped to its finest step. Every pair the
    /// interactive rings can show passes through unchanged.
    pub fn coerce_detached(raw: Angles) -> Angles {
        let model = Self::new();
        let widest = model.outer.home.union(&model.inner.home);
        let coerce = |dial: &Dial, value: i32| {
            let dial = Dial {
                active: widest,
                ..dial.clone()
            };
            dial.coerce(value as f64, dial.free_step.min(LINKED_STEP))
        };
        Angles::new(
            coerce(&model.outer, raw.outer),
            coerce(&model.inner, raw.inner),
        )
    }

    pub fn set_angle_a(&mut self, raw: f64) -> i32 {
        self.set_angle(Ring::Outer, raw)
    }

    pub fn set_angle_b(&mut self, raw: f64) -> i32 {
        self.set_angle(Ring::Inner, raw)
    }

    pub fn set_linked(&mut self, linked: bool) {
        match (linked, self.link) {
            (true, None) => {
                let offset = self.inner.value - self.outer.value;
                let union = self.outer.home.union(&self.inner.home);
                self.outer.active = union;
                self.inner.active = union;
                self.link = Some(Link { offset });
                log::debug!("Rings linked with offset {}", offset);
            }
            (false, Some(_)) => {
                self.outer.active = self.outer.home;
                self.inner.active = self.inner.home;
                self.link = None;
                log::debug!("Rings unlinked at {}", self.angles());
            }
            _ => {}
        }
    }

    fn propagate(&mut self, driver: Ring, link: Link) {
        let driving = self.dial(driver).value;
        let target = match driver {
            Ring::Outer => driving + link.offset,
            Ring::Inner => driving - link.offset,
        };

        let follower = self.dial_mut(driver.other());
        let wrapped = wrap_into(target, follower.active);
        follower.value = follower
            .active
            .clamp(snap(wrapped as f64, follower.step(true)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_model_starts_unlinked_at_zero() {
        let model = AngleModel::new();
        assert_eq!(model.angles(), Angles::new(0, 0));
        assert!(!model.is_linked());
        assert_eq!(model.range(Ring::Outer), OUTER_RANGE);
        assert_eq!(model.range(Ring::Inner), INNER_RANGE);
    }

    #[test]
    fn test_set_angle_clamps_and_snaps() {
        let mut model = AngleModel::new();
        assert_eq!(model.set_angle_a(44.0), 40);
        assert_eq!(model.set_angle_a(45.0), 50);
        assert_eq!(model.set_angle_a(-1000.0), -180);
        assert_eq!(model.set_angle_a(999.0), 180);
        assert_eq!(model.set_angle_b(200.0), 150);
        assert_eq!(model.set_angle_b(-40.0), -30);
        assert_eq!(model.set_angle_b(44.0), 30);
        assert_eq!(model.set_angle_b(46.0), 60);
    }

    #[test]
    fn test_set_angle_result_is_in_range_and_on_step() {
        for raw in -720..=720 {
            let mut model = AngleModel::new();
            let a = model.set_angle_a(raw as f64);
            assert!(OUTER_RANGE.contains(a), "{raw} -> {a}");
            assert_eq!((a - OUTER_RANGE.min) % OUTER_FREE_STEP, 0);

            let b = model.set_angle_b(raw as f64);
            assert!(INNER_RANGE.contains(b), "{raw} -> {b}");
            assert_eq!((b - INNER_RANGE.min) % INNER_FREE_STEP, 0);
        }
    }

    #[test]
    fn test_set_angle_is_idempotent() {
        for raw in [-181.0, -95.0, -15.0, 0.4, 17.0, 149.0, 1e9] {
            let mut once = AngleModel::new();
            once.set_angle_a(raw);
            once.set_angle_b(raw);

            let mut twice = once.clone();
            twice.set_angle_a(raw);
            twice.set_angle_b(raw);

            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_non_finite_input_is_coerced() {
        let mut model = AngleModel::new();
        assert!(OUTER_RANGE.contains(model.set_angle_a(f64::NAN)));
        assert_eq!(model.set_angle_a(f64::INFINITY), 180);
        assert_eq!(model.set_angle_b(f64::NEG_INFINITY), -30);
    }

    #[test]
    fn test_linking_captures_offset_and_widens_ranges() {
        let mut model = AngleModel::new();
        model.set_angle_a(-60.0);
        model.set_angle_b(90.0);
        model.set_linked(true);

        assert_eq!(model.offset(), Some(150));
        assert_eq!(model.range(Ring::Outer), AngleRange::new(-180, 180));
        assert_eq!(model.range(Ring::Inner), AngleRange::new(-180, 180));
        assert_eq!(model.angles(), Angles::new(-60, 90));
    }

    #[test]
    fn test_relinking_keeps_frozen_offset() {
        let mut model = AngleModel::new();
        model.set_angle_b(60.0);
        model.set_linked(true);
        model.set_angle_a(90.0);
        model.set_linked(true);
        assert_eq!(model.offset(), Some(60));
    }

    #[test]
    fn test_outer_drives_inner_while_linked() {
        let mut model = AngleModel::new();
        model.set_angle_b(30.0);
        model.set_linked(true);

        model.set_angle_a(60.0);
        assert_eq!(model.angles(), Angles::new(60, 90));

        // 170 snaps to 180, and 180 + 30 wraps around the widened span to -150
        model.set_angle_a(170.0);
        assert_eq!(model.angle_a(), 180);
        assert_eq!(model.angle_b(), -150);
    }

    #[test]
    fn test_inner_drives_outer_while_linked() {
        let mut model = AngleModel::new();
        model.set_angle_b(60.0);
        model.set_linked(true);

        model.set_angle_b(-150.0);
        // -150 - 60 = -210 wraps to 150
        assert_eq!(model.angles(), Angles::new(150, -150));
    }

    #[test]
    fn test_unlink_keeps_propagated_values() {
        let mut model = AngleModel::new();
        model.set_angle_b(120.0);
        model.set_linked(true);
        model.set_angle_a(-120.0);
        let propagated = model.angle_b();
        assert_eq!(propagated, 0);

        model.set_angle_a(150.0);
        assert_eq!(model.angle_b(), -90);

        model.set_linked(false);
        assert_eq!(model.angle_b(), -90);
        assert_eq!(model.range(Ring::Inner), INNER_RANGE);
        assert!(model.offset().is_none());
    }

    #[test]
    fn test_out_of_range_value_persists_until_next_set() {
        let mut model = AngleModel::new();
        model.set_linked(true);
        model.set_angle_b(-120.0);
        model.set_linked(false);
        assert_eq!(model.angle_b(), -120);

        assert_eq!(model.set_angle_b(-120.0), -30);
    }

    #[test]
    fn test_half_steps_round_away_from_zero() {
        assert_eq!(snap(45.0, 10), 50);
        assert_eq!(snap(-45.0, 10), -50);
        assert_eq!(snap(15.0, 30), 30);
        assert_eq!(snap(-15.0, 30), -30);
        assert_eq!(snap(44.999, 10), 40);
    }

    #[test]
    fn test_detached_angles_keep_linked_positions() {
        let mut model = AngleModel::new();
        model.set_linked(true);
        model.set_angle_b(-120.0);
        assert_eq!(model.angles(), Angles::new(-120, -120));

        assert_eq!(
            AngleModel::coerce_detached(model.angles()),
            Angles::new(-120, -120)
        );
    }

    #[test]
    fn test_detached_angles_are_clamped_and_snapped() {
        assert_eq!(
            AngleModel::coerce_detached(Angles::new(34, 161)),
            Angles::new(30, 150)
        );
        assert_eq!(
            AngleModel::coerce_detached(Angles::new(400, -400)),
            Angles::new(180, -180)
        );
        assert_eq!(
            AngleModel::coerce_detached(Angles::new(-44, -44)),
            Angles::new(-40, -30)
        );
    }

    #[test]
    fn test_every_ring_position_survives_detached_coercion() {
        for outer in (-180..=180).step_by(10) {
            for inner in (-180..=180).step_by(30) {
                let angles = Angles::new(outer, inner);
                assert_eq!(AngleModel::coerce_detached(angles), angles);
            }
        }
    }

    #[test]
    fn test_wrap_into_stays_in_inner_range() {
        for offset in (-330..=330).step_by(30) {
            for outer in -180..=180 {
                let wrapped = wrap_into(outer + offset, INNER_RANGE);
                assert!(
                    INNER_RANGE.contains(wrapped),
                    "outer {outer} offset {offset} -> {wrapped}"
                );
            }
        }
    }

    #[test]
    fn test_wrap_into_matches_repeated_span_steps() {
        let range = AngleRange::new(-30, 150);
        assert_eq!(wrap_into(-30, range), -30);
        assert_eq!(wrap_into(150, range), 150);
        assert_eq!(wrap_into(-31, range), 149);
        assert_eq!(wrap_into(-210, range), -30);
        assert_eq!(wrap_into(151, range), -29);
        assert_eq!(wrap_into(330, range), 150);
        assert_eq!(wrap_into(510, range), 150);
    }

    #[test]
    fn test_wrap_into_zero_span_only_clamps() {
        let range = AngleRange::new(40, 40);
        assert_eq!(wrap_into(-500, range), 40);
        assert_eq!(wrap_into(40, range), 40);
        assert_eq!(wrap_into(1_000_000, range), 40);
    }

    #[test]
    fn test_angles_wire_format() {
        assert_eq!("30,-60".parse::<Angles>(), Ok(Angles::new(30, -60)));
        assert_eq!(" 0 , 90 ".parse::<Angles>(), Ok(Angles::new(0, 90)));
        assert!(matches!(
            "30".parse::<Angles>(),
            Err(AnglesParseError::Shape(_))
        ));
        assert!(matches!(
            "30,x".parse::<Angles>(),
            Err(AnglesParseError::Number(_))
        ));
        assert_eq!(Angles::new(-30, 120).to_string(), "-30,120");
    }
}
