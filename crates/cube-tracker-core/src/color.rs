//! Face colours, colour pairs and a fixed-size map keyed by colour pair.
//!
//! A [`ColorPair`] names one physical cube edge by the two face colours that
//! meet there. The set of colours is small and closed, so every colour-keyed
//! lookup uses dense indices instead of hashing.

use serde::{Deserialize, Serialize};

/// Number of distinct face colours.
pub const N_FACE_COLORS: usize = 6;

/// Number of unordered pairs of distinct face colours.
pub const N_COLOR_PAIRS: usize = N_FACE_COLORS * (N_FACE_COLORS - 1) / 2;

/// Label used in label images for pixels that belong to no face.
pub const BACKGROUND_LABEL: u8 = u8::MAX;

/// Colour of one cube face.
///
/// The declaration order defines [`FaceColor::index`] and the default
/// segmentation priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceColor {
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
}

impl FaceColor {
    pub const ALL: [FaceColor; N_FACE_COLORS] = [
        FaceColor::Red,
        FaceColor::Green,
        FaceColor::Blue,
        FaceColor::Cyan,
        FaceColor::Magenta,
        FaceColor::Yellow,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Label value used for this colour in a label image.
    #[inline]
    pub fn label(self) -> u8 {
        self as u8
    }

    /// Inverse of [`FaceColor::label`]; `None` for background or unknown labels.
    #[inline]
    pub fn from_label(label: u8) -> Option<Self> {
        Self::from_index(label as usize)
    }

    /// Nominal sRGB colour, used for rendering and visualisation.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            FaceColor::Red => [220, 30, 30],
            FaceColor::Green => [30, 200, 40],
            FaceColor::Blue => [35, 45, 220],
            FaceColor::Cyan => [30, 200, 210],
            FaceColor::Magenta => [210, 35, 200],
            FaceColor::Yellow => [225, 215, 30],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FaceColor::Red => "red",
            FaceColor::Green => "green",
            FaceColor::Blue => "blue",
            FaceColor::Cyan => "cyan",
            FaceColor::Magenta => "magenta",
            FaceColor::Yellow => "yellow",
        }
    }
}

impl std::fmt::Display for FaceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unordered pair of two distinct face colours.
///
/// Stored normalised so that `first() < second()`; `(a, b)` and `(b, a)`
/// compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "[FaceColor; 2]", into = "[FaceColor; 2]")]
pub struct ColorPair {
    first: FaceColor,
    second: FaceColor,
}

impl ColorPair {
    /// Build a pair; `None` if both colours are the same.
    pub fn new(a: FaceColor, b: FaceColor) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn first(self) -> FaceColor {
        self.first
    }

    #[inline]
    pub fn second(self) -> FaceColor {
        self.second
    }

    #[inline]
    pub fn contains(self, color: FaceColor) -> bool {
        self.first == color || self.second == color
    }

    /// Dense index in `0..N_COLOR_PAIRS` (row-major upper triangle).
    pub fn index(self) -> usize {
        let n = N_FACE_COLORS;
        let i = self.first.index();
        let j = self.second.index();
        i * (2 * n - i - 1) / 2 + (j - i - 1)
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<Self> {
        ALL_PAIRS.get(idx).copied()
    }

    /// All 15 pairs in index order.
    #[inline]
    pub fn all() -> &'static [ColorPair; N_COLOR_PAIRS] {
        &ALL_PAIRS
    }

    const fn of(first: FaceColor, second: FaceColor) -> Self {
        Self { first, second }
    }
}

const ALL_PAIRS: [ColorPair; N_COLOR_PAIRS] = {
    use FaceColor::*;
    [
        ColorPair::of(Red, Green),
        ColorPair::of(Red, Blue),
        ColorPair::of(Red, Cyan),
        ColorPair::of(Red, Magenta),
        ColorPair::of(Red, Yellow),
        ColorPair::of(Green, Blue),
        ColorPair::of(Green, Cyan),
        ColorPair::of(Green, Magenta),
        ColorPair::of(Green, Yellow),
        ColorPair::of(Blue, Cyan),
        ColorPair::of(Blue, Magenta),
        ColorPair::of(Blue, Yellow),
        ColorPair::of(Cyan, Magenta),
        ColorPair::of(Cyan, Yellow),
        ColorPair::of(Magenta, Yellow),
    ]
};

impl std::fmt::Display for ColorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

impl TryFrom<[FaceColor; 2]> for ColorPair {
    type Error = String;

    fn try_from(value: [FaceColor; 2]) -> Result<Self, Self::Error> {
        ColorPair::new(value[0], value[1])
            .ok_or_else(|| format!("color pair needs two distinct colors, got {}", value[0]))
    }
}

impl From<ColorPair> for [FaceColor; 2] {
    fn from(value: ColorPair) -> Self {
        [value.first, value.second]
    }
}

/// Fixed-size map keyed by [`ColorPair`].
///
/// Iteration follows [`ColorPair::index`] order, so everything built on top of
/// it is deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorPairMap<T> {
    slots: [Option<T>; N_COLOR_PAIRS],
}

impl<T> Default for ColorPairMap<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> ColorPairMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: ColorPair, value: T) -> Option<T> {
        self.slots[pair.index()].replace(value)
    }

    pub fn remove(&mut self, pair: ColorPair) -> Option<T> {
        self.slots[pair.index()].take()
    }

    #[inline]
    pub fn get(&self, pair: ColorPair) -> Option<&T> {
        self.slots[pair.index()].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, pair: ColorPair) -> Option<&mut T> {
        self.slots[pair.index()].as_mut()
    }

    /// Mutable access, inserting `T::default()` if the slot is empty.
    pub fn entry_or_default(&mut self, pair: ColorPair) -> &mut T
    where
        T: Default,
    {
        self.slots[pair.index()].get_or_insert_with(T::default)
    }

    #[inline]
    pub fn contains(&self, pair: ColorPair) -> bool {
        self.slots[pair.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColorPair, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let value = slot.as_ref()?;
            Some((ColorPair::from_index(i)?, value))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = ColorPair> + '_ {
        self.iter().map(|(pair, _)| pair)
    }

    pub fn map<U>(&self, mut f: impl FnMut(ColorPair, &T) -> U) -> ColorPairMap<U> {
        let mut out = ColorPairMap::new();
        for (pair, value) in self.iter() {
            out.insert(pair, f(pair, value));
        }
        out
    }
}

impl<T> FromIterator<(ColorPair, T)> for ColorPairMap<T> {
    fn from_iter<I: IntoIterator<Item = (ColorPair, T)>>(iter: I) -> Self {
        let mut out = ColorPairMap::new();
        for (pair, value) in iter {
            out.insert(pair, value);
        }
        out
    }
}

impl<T: Serialize> Serialize for ColorPairMap<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (pair, value) in self.iter() {
            seq.serialize_element(&(pair, value))?;
        }
        seq.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ColorPairMap<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(ColorPair, T)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
