use std::str::FromStr;

use crate::foundation::error::DataJoinError;

/// Timing curve applied to transition progress, named after the d3 easing it reproduces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    /// `easePolyOut` at its default exponent.
    #[default]
    #[serde(alias = "poly_out")]
    CubicOut,
    CubicInOut,
}

#[derive(Clone, Copy)]
enum Mode {
    In,
    Out,
    InOut,
}

impl Ease {
    pub const ALL: [Ease; 7] = [
        Ease::Linear,
        Ease::QuadIn,
        Ease::QuadOut,
        Ease::QuadInOut,
        Ease::CubicIn,
        Ease::CubicOut,
        Ease::CubicInOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::QuadIn => "quad_in",
            Self::QuadOut => "quad_out",
            Self::QuadInOut => "quad_in_out",
            Self::CubicIn => "cubic_in",
            Self::CubicOut => "cubic_out",
            Self::CubicInOut => "cubic_in_out",
        }
    }

    fn shape(self) -> (i32, Mode) {
        match self {
            Self::Linear => (1, Mode::In),
            Self::QuadIn => (2, Mode::In),
            Self::QuadOut => (2, Mode::Out),
            Self::QuadInOut => (2, Mode::InOut),
            Self::CubicIn => (3, Mode::In),
            Self::CubicOut => (3, Mode::Out),
            Self::CubicInOut => (3, Mode::InOut),
        }
    }

    /// Eased progress for raw progress `t`, clamped to `[0, 1]` first.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let (e, mode) = self.shape();
        match mode {
            Mode::In => t.powi(e),
            Mode::Out => 1.0 - (1.0 - t).powi(e),
            Mode::InOut => {
                let t2 = 2.0 * t;
                if t2 <= 1.0 {
                    t2.powi(e) / 2.0
                } else {
                    1.0 - (2.0 - t2).powi(e) / 2.0
                }
            }
        }
    }
}

impl std::fmt::Display for Ease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the snake_case names plus kebab-case and `poly_out`.
impl FromStr for Ease {
    type Err = DataJoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        if key == "poly_out" {
            return Ok(Self::CubicOut);
        }
        Self::ALL
            .into_iter()
            .find(|e| e.name() == key)
            .ok_or_else(|| DataJoinError::validation(format!("unknown ease '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
