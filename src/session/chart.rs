use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::config::{ChartConfig, ChartKind};
use crate::data::frame::{FrameBuilder, FrameIssue};
use crate::data::loader::DataSet;
use crate::engine::driver::TimeStepDriver;
use crate::engine::reconcile::{JoinReport, ReconciliationEngine, TickReport};
use crate::foundation::core::{BezPath, Canvas, EntityId, Millis, Point, Rect, Year, YearDomain};
use crate::foundation::error::{DataJoinError, DataJoinResult};
use crate::layout::context::{ChartLayout, RenderContext};
use crate::layout::scale::LinearScale;
use crate::render::backend::Renderer;
use crate::render::svg::{Overlay, SvgRenderer, Tick};
use crate::spatial::voronoi::{SpatialIndex, SpatialPoint};

/// What one [`Chart::advance`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Years shown by driver ticks during this call, in order.
    pub years: Vec<Year>,
    pub joins: Vec<JoinReport>,
    pub tick: TickReport,
}

/// One animated chart: dataset, layout state, engine and year driver.
///
/// All mutation happens in `&mut self` calls driven by a caller-supplied clock.
#[derive(Debug)]
pub struct Chart {
    config: ChartConfig,
    data: DataSet,
    domain: YearDomain,
    ctx: RenderContext,
    builder: FrameBuilder,
    engine: ReconciliationEngine,
    driver: TimeStepDriver,
    due: Rc<RefCell<VecDeque<Year>>>,
    year: Option<Year>,
    issues: Vec<FrameIssue>,
    spatial: SpatialIndex,
    highlighted: Option<EntityId>,
    trails: BTreeMap<EntityId, BezPath>,
}

impl Chart {
    /// Validate `config` against `data`. The year domain is the configured one, or the span
    /// of the dataset.
    pub fn new(config: ChartConfig, data: DataSet) -> DataJoinResult<Self> {
        config.validate()?;
        let domain = config
            .domain
            .or_else(|| data.domain())
            .ok_or_else(|| DataJoinError::data("dataset has no years to animate"))?;

        let mut builder = FrameBuilder::new(config.metric.clone(), config.top_n);
        if config.kind == ChartKind::Scatter
            && let Some(y) = &config.y_metric
        {
            builder = builder.requiring(y.clone());
        }

        let ctx = RenderContext::from_config(&config, &data);
        let mut chart = Self {
            config,
            data,
            domain,
            ctx,
            builder,
            engine: ReconciliationEngine::new(),
            driver: TimeStepDriver::new(),
            due: Rc::new(RefCell::new(VecDeque::new())),
            year: None,
            issues: Vec::new(),
            spatial: SpatialIndex::default(),
            highlighted: None,
            trails: BTreeMap::new(),
        };
        chart.rebuild_trails();
        Ok(chart)
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn data(&self) -> &DataSet {
        &self.data
    }

    pub fn domain(&self) -> YearDomain {
        self.domain
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Year of the frame currently on screen.
    pub fn year(&self) -> Option<Year> {
        self.year
    }

    /// Records excluded from the most recent frame.
    pub fn issues(&self) -> &[FrameIssue] {
        &self.issues
    }

    pub fn highlighted(&self) -> Option<&EntityId> {
        self.highlighted.as_ref()
    }

    pub fn trails(&self) -> &BTreeMap<EntityId, BezPath> {
        &self.trails
    }

    /// Start stepping through the years; the first year is shown on the next `advance`.
    ///
    /// Playback begins at the domain minimum (or the year after the last `show_year`); after a
    /// `pause` it resumes with the following year.
    pub fn play(&mut self, now: Millis) {
        if self.driver.resume(now, enqueue(&self.due)).is_none() {
            self.driver
                .start(self.domain, self.config.period, now, enqueue(&self.due));
        }
    }

    /// Play from the first year of the domain again.
    pub fn restart(&mut self, now: Millis) {
        self.due.borrow_mut().clear();
        self.driver.seek(self.domain.min);
        self.driver
            .restart(self.domain, self.config.period, now, enqueue(&self.due));
    }

    pub fn pause(&mut self) {
        self.driver.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.driver.is_running()
    }

    /// Fire due driver ticks, reconcile their frames and push interpolated attributes to
    /// `renderer`.
    pub fn advance(&mut self, now: Millis, renderer: &mut dyn Renderer) -> AdvanceReport {
        self.driver.advance(now);
        let years: Vec<Year> = self.due.borrow_mut().drain(..).collect();

        let mut report = AdvanceReport::default();
        for year in years {
            report.joins.push(self.apply_year(year, now));
            report.years.push(year);
        }
        report.tick = self.engine.tick(now, renderer);
        self.rebuild_spatial();
        report
    }

    /// Reconcile the frame for `year` now; out-of-domain years are wrapped. A running driver
    /// continues from the following year.
    pub fn show_year(&mut self, year: Year, now: Millis) -> JoinReport {
        if !self.domain.contains(year) {
            tracing::warn!(%year, "year outside domain; wrapping");
        }
        let year = self.domain.wrap(year);
        let report = self.apply_year(year, now);
        self.driver.seek(self.domain.next(year));
        report
    }

    fn apply_year(&mut self, year: Year, now: Millis) -> JoinReport {
        let (frame, issues) = self.builder.build(year, self.data.year(year));
        if !issues.is_empty() {
            tracing::debug!(%year, excluded = issues.len(), "records excluded from frame");
        }
        self.issues = issues;
        let report = self.engine.reconcile(&mut self.ctx, &frame, now);
        self.year = Some(year);
        self.rebuild_spatial();
        report
    }

    /// New canvas size: ranges are recomputed and every element is retargeted from where it is.
    pub fn resize(&mut self, canvas: Canvas, now: Millis) -> JoinReport {
        self.ctx.resize(canvas);
        let report = self.engine.retarget(&mut self.ctx, now);
        self.rebuild_spatial();
        self.rebuild_trails();
        report
    }

    /// Nearest entity to a canvas-space pointer position; it also becomes the highlight.
    pub fn hover(&mut self, at: Point) -> Option<EntityId> {
        let local = Point::new(at.x - self.ctx.margin.left, at.y - self.ctx.margin.top);
        self.highlighted = self.spatial.query(local).cloned();
        self.highlighted.clone()
    }

    pub fn clear_hover(&mut self) {
        self.highlighted = None;
    }

    /// Axes, year label, trails, hover cells and highlight for the current state.
    pub fn overlay(&self) -> Overlay {
        let (x_ticks, y_ticks): (Vec<Tick>, Vec<Tick>) = match &self.ctx.layout {
            ChartLayout::BarRace(l) => (
                l.x.ticks(10)
                    .into_iter()
                    .map(|v| Tick {
                        position: l.x.apply(v),
                        label: tick_label(v),
                    })
                    .collect(),
                Vec::new(),
            ),
            ChartLayout::Scatter(l) => {
                let mark = |s: &LinearScale| -> Vec<Tick> {
                    s.ticks(5)
                        .into_iter()
                        .map(|v| Tick {
                            position: s.apply(v),
                            label: tick_label(v),
                        })
                        .collect()
                };
                (mark(&l.x), mark(&l.y))
            }
        };

        Overlay {
            year: self.year,
            axis_title: Some(self.ctx.metric.clone()),
            x_ticks,
            y_ticks,
            trails: self
                .trails
                .iter()
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect(),
            cells: (0..self.spatial.len())
                .filter_map(|i| self.spatial.cell_path(i))
                .collect(),
            highlight: self.highlighted.clone(),
        }
    }

    /// Full SVG document of `renderer`'s retained elements plus this chart's overlay.
    pub fn render_svg(&self, renderer: &SvgRenderer) -> String {
        renderer.document(self.ctx.canvas, self.ctx.margin, &self.overlay())
    }

    /// Seeds are the live elements' drawn positions, so hover follows dots mid-transition.
    fn rebuild_spatial(&mut self) {
        if self.config.kind != ChartKind::Scatter {
            return;
        }
        let points: Vec<SpatialPoint> = self
            .engine
            .live()
            .into_iter()
            .map(|el| SpatialPoint {
                id: el.id.clone(),
                position: Point::new(el.current.x, el.current.y),
            })
            .collect();
        let (w, h) = self.ctx.inner_size();
        self.spatial = SpatialIndex::build(&points, Rect::new(0.0, 0.0, w, h));
    }

    /// Chronological path per entity; years missing either metric break the line.
    fn rebuild_trails(&mut self) {
        self.trails.clear();
        let ChartLayout::Scatter(l) = &self.ctx.layout else {
            return;
        };
        for (id, records) in self.data.entities() {
            let mut path = BezPath::new();
            let mut pen_down = false;
            for rec in records {
                match (rec.metric(&l.x_metric), rec.metric(&l.y_metric)) {
                    (Some(x), Some(y)) => {
                        let p = Point::new(l.x.apply(x), l.y.apply(y));
                        if pen_down {
                            path.line_to(p);
                        } else {
                            path.move_to(p);
                            pen_down = true;
                        }
                    }
                    _ => pen_down = false,
                }
            }
            if !path.elements().is_empty() {
                self.trails.insert(id.clone(), path);
            }
        }
    }
}

fn enqueue(due: &Rc<RefCell<VecDeque<Year>>>) -> impl FnMut(Year) + 'static {
    let due = Rc::clone(due);
    move |year| due.borrow_mut().push_back(year)
}

fn tick_label(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/chart.rs"]
mod tests;
