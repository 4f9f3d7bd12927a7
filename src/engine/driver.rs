use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::{Millis, Year, YearDomain};

/// External stop switch for a running [`TimeStepDriver`].
///
/// Shares a flag with the run that created it; stopping a stale handle after a restart has no
/// effect on the new run.
#[derive(Clone, Debug)]
pub struct DriverHandle {
    active: Rc<Cell<bool>>,
}

impl DriverHandle {
    pub fn stop(&self) {
        self.active.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

type OnTick = Box<dyn FnMut(Year)>;

/// Wrap-around year cursor firing on a fixed period of the virtual clock.
///
/// Each tick hands the cursor year to the callback and then steps the cursor. A fresh run
/// emits the domain minimum first, unless a year was sought since the last tick; [`resume`]
/// continues from the cursor instead.
///
/// [`resume`]: TimeStepDriver::resume
#[derive(Default)]
pub struct TimeStepDriver {
    domain: Option<YearDomain>,
    period: Millis,
    cursor: Option<Year>,
    sought: bool,
    next_due: Millis,
    active: Rc<Cell<bool>>,
    on_tick: Option<OnTick>,
}

impl std::fmt::Debug for TimeStepDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStepDriver")
            .field("domain", &self.domain)
            .field("period", &self.period)
            .field("cursor", &self.cursor)
            .field("next_due", &self.next_due)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl TimeStepDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin ticking every `period` from `now`; the first tick is due immediately and emits
    /// `domain.min`, or the year passed to [`TimeStepDriver::seek`] since the last tick.
    ///
    /// A run already in progress is stopped first. Periods below one millisecond are raised to
    /// one.
    pub fn start<F>(&mut self, domain: YearDomain, period: Millis, now: Millis, on_tick: F) -> DriverHandle
    where
        F: FnMut(Year) + 'static,
    {
        if self.is_running() {
            tracing::debug!("driver already running; stopping the previous run");
            self.stop();
        }
        self.domain = Some(domain);
        self.period = period.max(Millis(1));
        self.cursor = Some(match self.cursor {
            Some(y) if self.sought => domain.wrap(y),
            _ => domain.min,
        });
        self.sought = false;
        self.next_due = now;
        self.active = Rc::new(Cell::new(true));
        self.on_tick = Some(Box::new(on_tick));
        tracing::debug!(min = %domain.min, max = %domain.max, period = self.period.0, "driver started");
        DriverHandle {
            active: Rc::clone(&self.active),
        }
    }

    /// Halt future ticks. The cursor is kept for [`TimeStepDriver::resume`].
    pub fn stop(&mut self) {
        self.active.set(false);
        self.on_tick = None;
    }

    /// Start again with the previous domain and period, continuing from the cursor.
    ///
    /// `None` if the driver never ran.
    pub fn resume<F>(&mut self, now: Millis, on_tick: F) -> Option<DriverHandle>
    where
        F: FnMut(Year) + 'static,
    {
        let domain = self.domain?;
        self.sought = true;
        Some(self.start(domain, self.period, now, on_tick))
    }

    pub fn restart<F>(&mut self, domain: YearDomain, period: Millis, now: Millis, on_tick: F) -> DriverHandle
    where
        F: FnMut(Year) + 'static,
    {
        self.stop();
        self.start(domain, period, now, on_tick)
    }

    pub fn is_running(&self) -> bool {
        self.active.get() && self.on_tick.is_some()
    }

    pub fn domain(&self) -> Option<YearDomain> {
        self.domain
    }

    pub fn period(&self) -> Millis {
        self.period
    }

    /// Year the next tick will emit.
    pub fn cursor(&self) -> Option<Year> {
        self.cursor
    }

    /// Move the cursor; years outside the domain are wrapped into it. The next `start` begins
    /// here.
    pub fn seek(&mut self, year: Year) {
        self.sought = true;
        let Some(domain) = self.domain else {
            self.cursor = Some(year);
            return;
        };
        if !domain.contains(year) {
            tracing::warn!(%year, min = %domain.min, max = %domain.max, "year outside domain; wrapping");
        }
        self.cursor = Some(domain.wrap(year));
    }

    /// Emit the cursor to the callback and step it. `None` when not running.
    pub fn tick(&mut self) -> Option<Year> {
        if !self.is_running() {
            return None;
        }
        let domain = self.domain?;
        let year = self.cursor.unwrap_or(domain.min);
        if let Some(cb) = self.on_tick.as_mut() {
            cb(year);
        }
        self.cursor = Some(domain.next(year));
        self.sought = false;
        Some(year)
    }

    /// Fire every tick due at or before `now`. Returns how many fired.
    pub fn advance(&mut self, now: Millis) -> usize {
        let mut fired = 0usize;
        while self.is_running() && self.next_due <= now {
            if self.tick().is_none() {
                break;
            }
            self.next_due = self.next_due.saturating_add(self.period);
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/driver.rs"]
mod tests;
