use std::path::Path;

use anyhow::Context as _;

use crate::animation::ease::Ease;
use crate::data::loader::LoadOptions;
use crate::foundation::core::{Canvas, Margin, Millis, YearDomain};
use crate::foundation::error::{DataJoinError, DataJoinResult};

/// Which chart the engine drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Ranked horizontal bars, top N per year.
    #[default]
    BarRace,
    /// One circle per entity at (metric, y_metric), with hover hit-testing.
    Scatter,
}

/// Transition timings shared by every element of a chart.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration: Millis,
    pub exit_duration: Millis,
    /// Extra delay per rank index for enter/update transitions.
    pub stagger: Millis,
    pub ease: Ease,
    /// Horizontal displacement of entering/exiting bars.
    pub enter_offset: f64,
    /// Resting opacity of bars.
    pub active_opacity: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: Millis(1000),
            exit_duration: Millis(950),
            stagger: Millis(75),
            ease: Ease::CubicOut,
            enter_offset: -50.0,
            active_opacity: 1.0,
        }
    }
}

/// Full chart configuration. Every field has a default, so `{}` is a valid bar race config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub kind: ChartKind,
    /// Ranking metric; also the x metric of the scatter variant.
    pub metric: String,
    /// Vertical metric of the scatter variant.
    pub y_metric: Option<String>,
    /// Frame size bound. `None` keeps every ranked record.
    pub top_n: Option<usize>,
    pub canvas: Canvas,
    pub margin: Margin,
    pub animation: AnimationConfig,
    /// Time between year steps.
    pub period: Millis,
    /// Restricts playback to a sub-range of the dataset's years.
    pub domain: Option<YearDomain>,
    pub load: LoadOptions,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            kind: ChartKind::BarRace,
            metric: "healthExpPerCapita".to_owned(),
            y_metric: None,
            top_n: Some(10),
            canvas: Canvas {
                width: 700,
                height: 500,
            },
            margin: Margin::default(),
            animation: AnimationConfig::default(),
            period: Millis(2000),
            domain: None,
            load: LoadOptions::default(),
        }
    }
}

impl ChartConfig {
    /// Health spending vs life expectancy scatterplot with short linear transitions.
    pub fn scatter() -> Self {
        Self {
            kind: ChartKind::Scatter,
            metric: "healthExpPerCapita".to_owned(),
            y_metric: Some("lifeExpectancy".to_owned()),
            top_n: None,
            canvas: Canvas {
                width: 700,
                height: 700,
            },
            margin: Margin {
                top: 30.0,
                right: 10.0,
                bottom: 10.0,
                left: 50.0,
            },
            animation: AnimationConfig {
                duration: Millis(200),
                exit_duration: Millis(100),
                stagger: Millis::ZERO,
                ease: Ease::Linear,
                ..AnimationConfig::default()
            },
            period: Millis(200),
            ..Self::default()
        }
    }

    pub fn from_path(path: &Path) -> DataJoinResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&s)
            .map_err(|e| DataJoinError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> DataJoinResult<()> {
        if self.metric.trim().is_empty() {
            return Err(DataJoinError::validation("metric must be non-empty"));
        }
        if self.kind == ChartKind::Scatter
            && self.y_metric.as_deref().is_none_or(|m| m.trim().is_empty())
        {
            return Err(DataJoinError::validation("scatter charts need a y_metric"));
        }
        if self.top_n == Some(0) {
            return Err(DataJoinError::validation("top_n must be > 0 when set"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(DataJoinError::validation("canvas must be non-empty"));
        }
        if let Some(d) = self.domain
            && d.min > d.max
        {
            return Err(DataJoinError::validation(format!(
                "domain min {} is after max {}",
                d.min, d.max
            )));
        }
        if self.kind == ChartKind::BarRace && self.top_n.is_none() {
            return Err(DataJoinError::validation("bar race charts need a top_n"));
        }
        if self.period.0 == 0 {
            return Err(DataJoinError::validation("period must be > 0"));
        }
        let a = &self.animation;
        if !(a.enter_offset.is_finite() && (0.0..=1.0).contains(&a.active_opacity)) {
            return Err(DataJoinError::validation(
                "enter_offset must be finite and active_opacity within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
