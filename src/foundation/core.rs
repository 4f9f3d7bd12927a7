use crate::foundation::error::{DataJoinError, DataJoinResult};

pub use kurbo::{BezPath, Point, Rect, Vec2};

/// Stable identity of a charted entity (a country name in the OECD dataset).
///
/// This is the only valid join key between frames; positions in a frame are ranks, not ids.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Build an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Calendar year of a record.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Year(pub i32);

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive year range `[min, max]`.
///
/// Deserialization goes through [`YearDomain::new`], so inverted bounds never load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawYearDomain")]
pub struct YearDomain {
    pub min: Year,
    pub max: Year, // inclusive
}

#[derive(serde::Deserialize)]
struct RawYearDomain {
    min: Year,
    max: Year,
}

impl TryFrom<RawYearDomain> for YearDomain {
    type Error = DataJoinError;

    fn try_from(raw: RawYearDomain) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl YearDomain {
    pub fn new(min: Year, max: Year) -> DataJoinResult<Self> {
        if min.0 > max.0 {
            return Err(DataJoinError::validation("YearDomain min must be <= max"));
        }
        Ok(Self { min, max })
    }

    /// Number of distinct years in the domain.
    pub fn len_years(self) -> u32 {
        let span = (i64::from(self.max.0) - i64::from(self.min.0)).max(0);
        u32::try_from(span + 1).unwrap_or(u32::MAX)
    }

    pub fn contains(self, year: Year) -> bool {
        self.min.0 <= year.0 && year.0 <= self.max.0
    }

    /// Map any year into the domain by wrapping around its length.
    pub fn wrap(self, year: Year) -> Year {
        let len = i64::from(self.len_years());
        let off = (i64::from(year.0) - i64::from(self.min.0)).rem_euclid(len);
        Year(self.min.0 + off as i32)
    }

    /// Year following `year`, wrapping past `max` back to `min`.
    pub fn next(self, year: Year) -> Year {
        self.wrap(Year(year.0.saturating_add(1)))
    }

    pub fn iter(self) -> impl Iterator<Item = Year> {
        (self.min.0..=self.max.0).map(Year)
    }
}

/// Point on the virtual clock, in milliseconds.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Self = Self(0);

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn scaled(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Space reserved around the plot area for axes and labels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    /// Plot area left over inside `canvas`, in plot-local coordinates (origin at top-left).
    pub fn inner_size(&self, canvas: Canvas) -> (f64, f64) {
        let w = (f64::from(canvas.width) - self.left - self.right).max(0.0);
        let h = (f64::from(canvas.height) - self.top - self.bottom).max(0.0);
        (w, h)
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 60.0,
            right: 10.0,
            bottom: 10.0,
            left: 120.0,
        }
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TEAL: Self = Self::rgb(0, 128, 128);
    pub const SILVER: Self = Self::rgb(192, 192, 192);
    pub const SALMON: Self = Self::rgb(250, 128, 114);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb` form; alpha is carried separately by opacity attributes.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
