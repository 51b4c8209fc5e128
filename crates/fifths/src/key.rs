use derive_more::{AsRef, Deref, Display, From, Into};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Angular width of one wheel sector.
pub const SECTOR_DEGREES: i32 = 30;
pub const SECTOR_COUNT: usize = 12;

/// Major keys in sector order: each sector counter-clockwise is a fifth lower.
pub const KEY_WHEEL: [&str; SECTOR_COUNT] = [
    "C", "F", "Bb", "Eb", "Ab", "C#", "F#", "B", "E", "A", "D", "G",
];

const MODE_WHEEL: [Option<Mode>; SECTOR_COUNT] = [
    Some(Mode::Major),
    Some(Mode::Mixolydian),
    Some(Mode::Dorian),
    Some(Mode::Minor),
    Some(Mode::Phrygian),
    Some(Mode::Locrian),
    None,
    None,
    None,
    None,
    None,
    Some(Mode::Lydian),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    Major,
    Mixolydian,
    Dorian,
    Minor,
    Phrygian,
    Locrian,
    Lydian,
}

impl Mode {
    /// Sectors the key wheel is rotated left by to find this mode's tonic.
    pub fn shift(self) -> i32 {
        match self {
            Self::Lydian => 1,
            Self::Major => 0,
            Self::Mixolydian => -1,
            Self::Dorian => -2,
            Self::Minor => -3,
            Self::Phrygian => -4,
            Self::Locrian => -5,
        }
    }

    /// Mode names long enough to need a smaller label font.
    pub fn has_long_name(self) -> bool {
        matches!(self, Self::Mixolydian | Self::Phrygian | Self::Locrian)
    }

    pub fn from_angle(angle: i32) -> Option<Self> {
        MODE_WHEEL[sector_index(angle)]
    }
}

/// Sector under the pointer for a ring rotated by `angle` degrees.
pub fn sector_index(angle: i32) -> usize {
    (angle.rem_euclid(360) / SECTOR_DEGREES) as usize % SECTOR_COUNT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub tonic: &'static str,
    pub mode: Mode,
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

pub fn resolve(outer: i32, inner: i32) -> Option<Key> {
    let mode = Mode::from_angle(inner)?;
    let shift = mode.shift().rem_euclid(SECTOR_COUNT as i32) as usize;
    let index = sector_index(outer);
    Some(Key {
        tonic: KEY_WHEEL[(index + shift) % SECTOR_COUNT],
        mode,
    })
}

/// Label for the key under the pointer, empty when the mode sector is unmapped.
pub fn resolve_key(outer: i32, inner: i32) -> KeyLabel {
    resolve(outer, inner)
        .map(|key| KeyLabel(key.to_string()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display, Deref, From, Into, AsRef)]
pub struct KeyLabel(String);

crate::impl_string_newtype!(KeyLabel);

impl KeyLabel {
    pub fn has_long_mode(&self) -> bool {
        Mode::iter()
            .filter(|m| m.has_long_name())
            .any(|m| self.0.contains(&m.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_key_golden_values() {
        assert_eq!(resolve_key(0, 0).as_str(), "C Major");
        assert_eq!(resolve_key(30, 30).as_str(), "C Mixolydian");
        assert_eq!(resolve_key(0, 30).as_str(), "G Mixolydian");
        assert_eq!(resolve_key(30, 0).as_str(), "F Major");
        assert_eq!(resolve_key(-30, 0).as_str(), "G Major");
        assert_eq!(resolve_key(180, 0).as_str(), "F# Major");
    }

    #[test]
    fn test_modes_of_c_major_signature() {
        let cases = [
            (-30, "F Lydian"),
            (0, "C Major"),
            (30, "G Mixolydian"),
            (60, "D Dorian"),
            (90, "A Minor"),
            (120, "E Phrygian"),
            (150, "B Locrian"),
        ];
        for (inner, expected) in cases {
            assert_eq!(resolve_key(0, inner).as_str(), expected, "inner {inner}");
        }
    }

    #[test]
    fn test_unmapped_mode_band_is_empty() {
        for outer in (-360..=360).step_by(10) {
            for inner in 180..330 {
                assert!(resolve_key(outer, inner).is_empty());
                assert!(resolve_key(outer, inner - 360).is_empty());
            }
        }
    }

    #[test]
    fn test_resolution_is_periodic() {
        for outer in (-720..=720).step_by(10) {
            for inner in (-30..=150).step_by(30) {
                assert_eq!(resolve_key(outer, inner), resolve_key(outer + 360, inner - 360));
            }
        }
    }

    #[test]
    fn test_sector_index_floors() {
        assert_eq!(sector_index(0), 0);
        assert_eq!(sector_index(29), 0);
        assert_eq!(sector_index(30), 1);
        assert_eq!(sector_index(-1), 11);
        assert_eq!(sector_index(-30), 11);
        assert_eq!(sector_index(-31), 10);
        assert_eq!(sector_index(720), 0);
    }

    #[test]
    fn test_long_mode_labels() {
        assert!(resolve_key(0, 30).has_long_mode());
        assert!(resolve_key(0, 120).has_long_mode());
        assert!(!resolve_key(0, 90).has_long_mode());
        assert!(!KeyLabel::default().has_long_mode());
    }

    #[test]
    fn test_mode_parses_case_insensitively() {
        assert_eq!("dorian".parse::<Mode>(), Ok(Mode::Dorian));
        assert_eq!("LYDIAN".parse::<Mode>(), Ok(Mode::Lydian));
    }
}
