//! Keyed data-join and animated reconciliation for year-by-year charts.
//!
//! A [`Chart`] steps a [`TimeStepDriver`] through the years of a [`DataSet`], ranks each
//! year into a [`Frame`], and lets the [`ReconciliationEngine`] diff it against the current
//! visual set by entity id. Entering, updating and exiting elements are animated by the
//! [`TransitionScheduler`] and pushed to a [`Renderer`] every tick:
//!
//! - bar race: top N bars sliding between ranks
//! - scatter: one dot per entity with Voronoi hover detection ([`SpatialIndex`])
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod config;
pub(crate) mod data;
pub(crate) mod engine;
pub(crate) mod layout;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod spatial;

pub use crate::foundation::core::{
    BezPath, Canvas, EntityId, Margin, Millis, Point, Rect, Rgba8, Vec2, Year, YearDomain,
};
pub use crate::foundation::error::{DataJoinError, DataJoinResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::lerp::{AttrValue, Lerp};
pub use crate::config::{AnimationConfig, ChartConfig, ChartKind};
pub use crate::data::frame::{Frame, FrameBuilder, FrameIssue};
pub use crate::data::loader::{DataSet, LoadOptions, LoadReport, MetricValue, Record, SkippedRow};
pub use crate::engine::driver::{DriverHandle, TimeStepDriver};
pub use crate::engine::element::{AnimationState, VisualElement};
pub use crate::engine::reconcile::{
    JoinPartition, JoinReport, ReconciliationEngine, TickReport, partition,
};
pub use crate::engine::scheduler::{Completion, OnComplete, Transition, TransitionScheduler};
pub use crate::layout::context::{
    AttrKey, Attributes, BarRaceLayout, ChartLayout, Phase, RenderContext, ScatterLayout, Timing,
};
pub use crate::layout::scale::{BandScale, LinearScale};
pub use crate::render::backend::{RecordingRenderer, RenderCall, Renderer};
pub use crate::render::raster::{RasterImage, rasterize_svg, write_png};
pub use crate::render::svg::{Mark, Overlay, SvgRenderer, Tick};
pub use crate::session::chart::{AdvanceReport, Chart};
pub use crate::spatial::voronoi::{SpatialIndex, SpatialPoint, VoronoiCell};
