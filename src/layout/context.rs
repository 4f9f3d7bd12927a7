use crate::animation::ease::Ease;
use crate::animation::lerp::AttrValue;
use crate::config::{ChartConfig, ChartKind};
use crate::data::frame::Frame;
use crate::data::loader::{DataSet, Record};
use crate::foundation::core::{Canvas, Margin, Millis, Rgba8};
use crate::layout::scale::{BandScale, LinearScale};

/// Animatable attribute of a visual element.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AttrKey {
    X,
    Y,
    Width,
    Height,
    Radius,
    OffsetX,
    Opacity,
    Fill,
}

impl AttrKey {
    pub const ALL: [AttrKey; 8] = [
        AttrKey::X,
        AttrKey::Y,
        AttrKey::Width,
        AttrKey::Height,
        AttrKey::Radius,
        AttrKey::OffsetX,
        AttrKey::Opacity,
        AttrKey::Fill,
    ];
}

/// Resolved drawing attributes in plot-local coordinates.
///
/// Bars use `x/y/width/height`; circles use `x/y` as center plus `radius`. `offset_x` is a
/// horizontal translation applied on top of either.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Attributes {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub offset_x: f64,
    pub opacity: f64,
    pub fill: Rgba8,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            radius: 0.0,
            offset_x: 0.0,
            opacity: 1.0,
            fill: Rgba8::BLACK,
        }
    }
}

impl Attributes {
    pub fn get(&self, key: AttrKey) -> AttrValue {
        match key {
            AttrKey::X => AttrValue::Scalar(self.x),
            AttrKey::Y => AttrValue::Scalar(self.y),
            AttrKey::Width => AttrValue::Scalar(self.width),
            AttrKey::Height => AttrValue::Scalar(self.height),
            AttrKey::Radius => AttrValue::Scalar(self.radius),
            AttrKey::OffsetX => AttrValue::Scalar(self.offset_x),
            AttrKey::Opacity => AttrValue::Scalar(self.opacity),
            AttrKey::Fill => AttrValue::Color(self.fill),
        }
    }

    /// Values of the wrong kind for `key` are ignored.
    pub fn set(&mut self, key: AttrKey, value: AttrValue) {
        match (key, value) {
            (AttrKey::X, AttrValue::Scalar(v)) => self.x = v,
            (AttrKey::Y, AttrValue::Scalar(v)) => self.y = v,
            (AttrKey::Width, AttrValue::Scalar(v)) => self.width = v,
            (AttrKey::Height, AttrValue::Scalar(v)) => self.height = v,
            (AttrKey::Radius, AttrValue::Scalar(v)) => self.radius = v,
            (AttrKey::OffsetX, AttrValue::Scalar(v)) => self.offset_x = v,
            (AttrKey::Opacity, AttrValue::Scalar(v)) => self.opacity = v,
            (AttrKey::Fill, AttrValue::Color(c)) => self.fill = c,
            _ => {}
        }
    }

    /// Keys whose values differ between `self` and `other`.
    pub fn diff(&self, other: &Attributes) -> Vec<AttrKey> {
        AttrKey::ALL
            .into_iter()
            .filter(|&k| self.get(k) != other.get(k))
            .collect()
    }
}

/// Why a target is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Update,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarRaceLayout {
    pub x: LinearScale,
    pub y: BandScale,
    pub enter_offset: f64,
    pub active_opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterLayout {
    pub x: LinearScale,
    pub y: LinearScale,
    pub x_metric: String,
    pub y_metric: String,
    pub radius: f64,
    pub exit_radius: f64,
}

/// Maps ranked records onto attributes for one chart variant.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartLayout {
    BarRace(BarRaceLayout),
    Scatter(ScatterLayout),
}

const BAND_PADDING: f64 = 0.05;

impl ChartLayout {
    /// Frame-dependent domains. The scatter domain is fixed by the dataset, bars rescale to
    /// the frame maximum.
    pub fn prepare(&mut self, frame: &Frame) {
        if let Self::BarRace(l) = self {
            let max = frame.max_value().filter(|m| *m > 0.0).unwrap_or(1.0);
            l.x.domain = (0.0, max);
        }
    }

    pub fn resize(&mut self, inner_w: f64, inner_h: f64) {
        match self {
            Self::BarRace(l) => {
                l.x.range = (0.0, inner_w);
                l.y.range = (0.0, inner_h);
            }
            Self::Scatter(l) => {
                l.x.range = (0.0, inner_w);
                l.y.range = (inner_h, 0.0);
            }
        }
    }

    pub fn target(&self, rank: usize, rec: &Record, metric: &str, phase: Phase) -> Attributes {
        match self {
            Self::BarRace(l) => {
                let value = rec.metric(metric).unwrap_or(0.0);
                Attributes {
                    x: 0.0,
                    y: l.y.position(rank),
                    width: l.x.apply(value).max(0.0),
                    height: l.y.bandwidth(),
                    radius: 0.0,
                    offset_x: 0.0,
                    opacity: l.active_opacity,
                    fill: match phase {
                        Phase::Enter => Rgba8::TEAL,
                        Phase::Update => Rgba8::SILVER,
                    },
                }
            }
            Self::Scatter(l) => Attributes {
                x: l.x.apply(rec.metric(&l.x_metric).unwrap_or(0.0)),
                y: l.y.apply(rec.metric(&l.y_metric).unwrap_or(0.0)),
                radius: l.radius,
                fill: Rgba8::BLACK,
                ..Attributes::default()
            },
        }
    }

    /// Displaced, invisible starting point of an entering element.
    pub fn enter_from(&self, target: &Attributes) -> Attributes {
        match self {
            Self::BarRace(l) => Attributes {
                offset_x: l.enter_offset,
                opacity: 0.0,
                fill: Rgba8::TEAL,
                ..*target
            },
            Self::Scatter(_) => Attributes {
                radius: 0.0,
                ..*target
            },
        }
    }

    /// Final attributes of an exiting element, starting from where it currently is.
    pub fn exit_to(&self, current: &Attributes) -> Attributes {
        match self {
            Self::BarRace(l) => Attributes {
                offset_x: l.enter_offset,
                opacity: 0.0,
                fill: Rgba8::SALMON,
                ..*current
            },
            Self::Scatter(l) => Attributes {
                radius: l.exit_radius,
                ..*current
            },
        }
    }

    /// Attributes animated by an exit, scheduled even when already at their exit value.
    pub fn exit_keys(&self) -> &'static [AttrKey] {
        match self {
            Self::BarRace(_) => &[AttrKey::OffsetX, AttrKey::Opacity, AttrKey::Fill],
            Self::Scatter(_) => &[AttrKey::Radius],
        }
    }

    /// Attributes applied immediately on update instead of being animated.
    pub fn instant_keys(&self) -> &'static [AttrKey] {
        match self {
            Self::BarRace(_) => &[AttrKey::Fill],
            Self::Scatter(_) => &[],
        }
    }
}

/// Timing knobs read by the reconciliation engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub duration: Millis,
    pub exit_duration: Millis,
    pub stagger: Millis,
    pub ease: Ease,
}

impl Timing {
    pub fn delay_for_rank(&self, rank: usize) -> Millis {
        self.stagger.scaled(rank as u64)
    }
}

/// Explicit layout state passed into reconciliation; owned by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    pub canvas: Canvas,
    pub margin: Margin,
    pub metric: String,
    pub layout: ChartLayout,
    pub timing: Timing,
}

impl RenderContext {
    /// Build the context for `cfg`. The scatter domains come from the whole dataset.
    pub fn from_config(cfg: &ChartConfig, data: &DataSet) -> Self {
        let (w, h) = cfg.margin.inner_size(cfg.canvas);
        let layout = match cfg.kind {
            ChartKind::BarRace => ChartLayout::BarRace(BarRaceLayout {
                x: LinearScale::new((0.0, 1.0), (0.0, w)),
                y: BandScale::new(cfg.top_n.unwrap_or(10), (0.0, h), BAND_PADDING),
                enter_offset: cfg.animation.enter_offset,
                active_opacity: cfg.animation.active_opacity,
            }),
            ChartKind::Scatter => {
                let y_metric = cfg.y_metric.clone().unwrap_or_default();
                let x_max = data
                    .metric_extent(&cfg.metric)
                    .map_or(1.0, |(_, hi)| hi);
                let y_ext = data.metric_extent(&y_metric).unwrap_or((0.0, 1.0));
                ChartLayout::Scatter(ScatterLayout {
                    x: LinearScale::new((-0.5, x_max), (0.0, w)),
                    y: LinearScale::new(y_ext, (h, 0.0)),
                    x_metric: cfg.metric.clone(),
                    y_metric,
                    radius: 3.0,
                    exit_radius: 1.0,
                })
            }
        };

        Self {
            canvas: cfg.canvas,
            margin: cfg.margin,
            metric: cfg.metric.clone(),
            layout,
            timing: Timing {
                duration: cfg.animation.duration,
                exit_duration: cfg.animation.exit_duration,
                stagger: cfg.animation.stagger,
                ease: cfg.animation.ease,
            },
        }
    }

    /// Plot area size inside the margins.
    pub fn inner_size(&self) -> (f64, f64) {
        self.margin.inner_size(self.canvas)
    }

    /// Recompute ranges for a new canvas; domains and identities are untouched.
    pub fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
        let (w, h) = self.inner_size();
        self.layout.resize(w, h);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/context.rs"]
mod tests;
