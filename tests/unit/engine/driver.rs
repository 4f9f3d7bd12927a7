use std::cell::RefCell;

use super::*;

fn domain(min: i32, max: i32) -> YearDomain {
    YearDomain::new(Year(min), Year(max)).unwrap()
}

fn recorder() -> (Rc<RefCell<Vec<Year>>>, impl FnMut(Year) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |y| sink.borrow_mut().push(y))
}

#[test]
fn first_tick_is_due_at_start() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    d.start(domain(1970, 1972), Millis(100), Millis(500), cb);

    assert_eq!(d.advance(Millis(499)), 0);
    assert_eq!(d.advance(Millis(500)), 1);
    assert_eq!(d.advance(Millis(699)), 1);
    assert_eq!(*seen.borrow(), vec![Year(1970), Year(1971)]);
    assert_eq!(d.cursor(), Some(Year(1972)));
}

#[test]
fn cursor_wraps_after_the_last_year() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    d.start(domain(1970, 2015), Millis(2000), Millis(0), cb);

    d.advance(Millis(2000 * 46));
    let seen = seen.borrow();
    assert_eq!(seen.len(), 47);
    assert_eq!(seen[45], Year(2015));
    assert_eq!(seen[46], Year(1970));
    let first_pass: Vec<Year> = (1970..=2015).map(Year).collect();
    assert_eq!(&seen[..46], first_pass.as_slice());
}

#[test]
fn handle_stops_future_ticks() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    let handle = d.start(domain(2000, 2010), Millis(10), Millis(0), cb);
    d.advance(Millis(0));
    handle.stop();

    assert!(!d.is_running());
    assert_eq!(d.advance(Millis(1_000)), 0);
    assert_eq!(d.tick(), None);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn starting_again_replaces_the_running_callback() {
    let mut d = TimeStepDriver::new();
    let (first, cb1) = recorder();
    let (second, cb2) = recorder();
    let stale = d.start(domain(1970, 1980), Millis(10), Millis(0), cb1);
    d.advance(Millis(0));

    let fresh = d.start(domain(1970, 1980), Millis(10), Millis(100), cb2);
    assert!(!stale.is_active());
    assert!(fresh.is_active());
    stale.stop();
    assert!(d.is_running());

    d.advance(Millis(100));
    assert_eq!(*first.borrow(), vec![Year(1970)]);
    assert_eq!(*second.borrow(), vec![Year(1970)]);
}

#[test]
fn restart_plays_from_the_domain_minimum() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    d.start(domain(1970, 1980), Millis(10), Millis(0), cb);
    d.advance(Millis(40));
    assert_eq!(seen.borrow().len(), 5);

    let (again, cb) = recorder();
    d.restart(domain(1970, 1980), Millis(10), Millis(100), cb);
    d.advance(Millis(110));
    assert_eq!(*again.borrow(), vec![Year(1970), Year(1971)]);
}

#[test]
fn resume_continues_from_the_cursor() {
    let mut d = TimeStepDriver::new();
    assert!(d.resume(Millis(0), |_| {}).is_none());

    let (seen, cb) = recorder();
    d.start(domain(1970, 1980), Millis(10), Millis(0), cb);
    d.advance(Millis(20));
    d.stop();
    assert_eq!(d.cursor(), Some(Year(1973)));

    let (resumed, cb) = recorder();
    let handle = d.resume(Millis(500), cb).unwrap();
    assert!(handle.is_active());
    d.advance(Millis(500));
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(*resumed.borrow(), vec![Year(1973)]);
}

#[test]
fn a_seek_before_start_picks_the_first_year() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    d.seek(Year(1975));
    d.start(domain(1970, 1980), Millis(10), Millis(0), cb);
    d.advance(Millis(0));
    assert_eq!(*seen.borrow(), vec![Year(1975)]);
}

#[test]
fn seek_wraps_out_of_domain_years() {
    let mut d = TimeStepDriver::new();
    let (seen, cb) = recorder();
    d.start(domain(1970, 1979), Millis(10), Millis(0), cb);

    d.seek(Year(1985));
    assert_eq!(d.cursor(), Some(Year(1975)));
    d.seek(Year(1969));
    assert_eq!(d.cursor(), Some(Year(1979)));
    d.advance(Millis(10));
    assert_eq!(*seen.borrow(), vec![Year(1979), Year(1970)]);
}

#[test]
fn zero_period_is_raised_to_one_millisecond() {
    let mut d = TimeStepDriver::new();
    let (_seen, cb) = recorder();
    d.restart(domain(1970, 1971), Millis(0), Millis(0), cb);
    assert_eq!(d.period(), Millis(1));
    assert_eq!(d.advance(Millis(4)), 5);
}
