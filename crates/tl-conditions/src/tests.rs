//! Unit tests for tl-conditions.

use tl_cells::{CellStore, Discrete, Linear, Polynomial, ResourceExt};
use tl_core::{Duration, SimTime};

use crate::{
    Condition, ConditionExt, Confidence, Direction, Evaluator, SearchConfig, Strategy, Window,
    always, at_least, at_most, greater_than, less_than, never, when,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn secs(s: i64) -> Duration {
    Duration::from_secs(s)
}

fn window(a: i64, b: i64) -> Window {
    Window::new(secs(a), secs(b))
}

fn ev(store: &CellStore) -> Evaluator<'_> {
    Evaluator::new(store, SearchConfig::default())
}

// ── Comparisons ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod compare_tests {
    use super::*;

    #[test]
    fn linear_threshold_is_solved_analytically() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let c = at_least(x, 10.0);
        let crossing = c.earliest(&ev(&store), Direction::Rising, window(0, 20)).unwrap();
        assert_eq!(crossing.offset, Some(secs(10)));
        assert_eq!(crossing.strategy, Strategy::Analytic);
        assert_eq!(crossing.confidence, Confidence::Exact);
    }

    #[test]
    fn strict_comparison_lands_one_microsecond_later() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let crossing = greater_than(x, 10.0).earliest(&ev(&store), Direction::Rising, window(0, 20)).unwrap();
        assert_eq!(crossing.offset, Some(secs(10) + Duration::EPSILON));
    }

    #[test]
    fn already_satisfied_returns_window_start() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(50.0, -1.0));
        let crossing = at_least(x, 10.0).earliest(&ev(&store), Direction::Rising, window(3, 100)).unwrap();
        assert_eq!(crossing.offset, Some(secs(3)));
    }

    #[test]
    fn outside_window_is_none() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let crossing = at_least(x, 30.0).earliest(&ev(&store), Direction::Rising, window(0, 20)).unwrap();
        assert_eq!(crossing.offset, None);
        assert_eq!(crossing.strategy, Strategy::Analytic);
    }

    #[test]
    fn falling_finds_when_predicate_stops_holding() {
        let mut store = CellStore::new();
        let battery = store.allocate("battery", Linear::new(100.0, -2.0));
        let crossing = at_least(battery, 20.0).earliest(&ev(&store), Direction::Falling, window(0, 100)).unwrap();
        // 100 - 2t < 20  ⇔  t > 40
        assert_eq!(crossing.offset, Some(secs(40) + Duration::EPSILON));
    }

    #[test]
    fn latest_on_decreasing_resource() {
        let mut store = CellStore::new();
        let battery = store.allocate("battery", Linear::new(100.0, -2.0));
        let crossing = at_least(battery, 20.0).latest(&ev(&store), Direction::Rising, window(0, 100)).unwrap();
        assert_eq!(crossing.offset, Some(secs(40)));
    }

    #[test]
    fn quadratic_dip_is_solved_analytically() {
        // (t - 2)(t - 6) = t² - 8t + 12, negative on (2, 6).
        let mut store = CellStore::new();
        let p = store.allocate("p", Polynomial::new(vec![12.0, -8.0, 1.0]));
        let e = ev(&store);
        let first = less_than(p, 0.0).earliest(&e, Direction::Rising, window(0, 10)).unwrap();
        assert_eq!(first.offset, Some(secs(2) + Duration::EPSILON));
        assert_eq!(first.strategy, Strategy::Analytic);
        let last = less_than(p, 0.0).latest(&e, Direction::Rising, window(0, 10)).unwrap();
        assert_eq!(last.offset, Some(secs(6) - Duration::EPSILON));
    }

    #[test]
    fn cubic_falls_back_to_search() {
        // t³ crosses 8 at t = 2.
        let mut store = CellStore::new();
        let p = store.allocate("p", Polynomial::new(vec![0.0, 0.0, 0.0, 1.0]));
        let crossing = at_least(p, 8.0).earliest(&ev(&store), Direction::Rising, window(0, 10)).unwrap();
        assert_eq!(crossing.strategy, Strategy::Search);
        assert_eq!(crossing.confidence, Confidence::Exact);
        let offset = crossing.offset.unwrap();
        assert!((offset - secs(2)).micros().abs() <= 1, "got {offset}");
    }

    #[test]
    fn constant_resource_decided_in_one_read() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::constant(5.0));
        let e = ev(&store);
        assert_eq!(at_most(x, 5.0).earliest(&e, Direction::Rising, window(1, 9)).unwrap().offset, Some(secs(1)));
        assert_eq!(at_most(x, 4.0).earliest(&e, Direction::Rising, window(1, 9)).unwrap().offset, None);
    }

    #[test]
    fn evaluation_is_relative_to_store_clock() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        store.advance_to(SimTime::ZERO + secs(4)).unwrap();
        let crossing = at_least(x, 10.0).earliest(&ev(&store), Direction::Rising, Window::from_now()).unwrap();
        assert_eq!(crossing.offset, Some(secs(6)));
    }

    #[test]
    fn derived_resource_tracks_both_cells() {
        let mut store = CellStore::new();
        let a = store.allocate("a", Linear::new(0.0, 1.0));
        let b = store.allocate("b", Linear::new(0.0, 1.0));
        let sum = a.zip(b, |x, y| x + y);
        let e = ev(&store);
        let crossing = at_least(sum, 10.0).earliest(&e, Direction::Rising, window(0, 20)).unwrap();
        assert_eq!(crossing.offset, Some(secs(5)));
        assert_eq!(e.into_reads().into_iter().collect::<Vec<_>>(), vec![a.key(), b.key()]);
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod search_tests {
    use super::*;

    #[test]
    fn bisection_reaches_resolution() {
        let store = CellStore::new();
        let e = ev(&store);
        let target = Duration(7_654_321);
        let crossing = e.search_earliest(Direction::Rising, window(0, 10), |d| Ok(d >= target)).unwrap();
        assert_eq!(crossing.offset, Some(target));
        assert_eq!(crossing.strategy, Strategy::Search);
    }

    #[test]
    fn non_monotonic_predicate_is_low_confidence() {
        let store = CellStore::new();
        let e = ev(&store);
        // True on [2s, 4s) and [6s, 8s).
        let pred = |d: Duration| {
            let s = d.as_secs_f64();
            Ok((2.0..4.0).contains(&s) || (6.0..8.0).contains(&s))
        };
        let crossing = e.search_earliest(Direction::Rising, window(0, 10), pred).unwrap();
        assert_eq!(crossing.confidence, Confidence::Low);
        assert_eq!(crossing.offset, Some(secs(2)));
        // Same inputs, same answer.
        assert_eq!(e.search_earliest(Direction::Rising, window(0, 10), pred).unwrap(), crossing);
    }

    #[test]
    fn latest_search_bisects_last_bracket() {
        let store = CellStore::new();
        let e = ev(&store);
        let edge = Duration(3_210_000);
        let crossing = e.search_latest(Direction::Rising, window(0, 10), |d| Ok(d <= edge)).unwrap();
        assert_eq!(crossing.offset, Some(edge));
    }

    #[test]
    fn single_point_window() {
        let store = CellStore::new();
        let e = ev(&store);
        let crossing = e.search_earliest(Direction::Rising, Window::at(secs(3)), |_| Ok(true)).unwrap();
        assert_eq!(crossing.offset, Some(secs(3)));
    }

    #[test]
    fn short_stretch_in_unbounded_window_is_found() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let band = when(x, |v: &f64| (10.0..20.0).contains(v));
        let crossing = band.earliest(&ev(&store), Direction::Rising, Window::from_now()).unwrap();
        assert_eq!(crossing.offset, Some(secs(10)));
        // Rises and falls again: two changes.
        assert_eq!(crossing.confidence, Confidence::Low);
    }

    #[test]
    fn miss_on_coarse_grid_is_low_confidence() {
        let store = CellStore::new();
        let e = Evaluator::new(&store, SearchConfig { samples: 4, resolution: Duration::MILLISECOND });
        // True only on [3.0s, 3.1s), between every sample.
        let pred = |d: Duration| Ok((3.0..3.1).contains(&d.as_secs_f64()));
        let crossing = e.search_earliest(Direction::Rising, window(0, 10), pred).unwrap();
        assert_eq!(crossing.offset, None);
        assert_eq!(crossing.confidence, Confidence::Low);
    }

    #[test]
    fn miss_on_fine_grid_is_exact() {
        let store = CellStore::new();
        let e = ev(&store);
        let crossing = e
            .search_earliest(Direction::Rising, Window::new(Duration::ZERO, Duration(10)), |_| Ok(false))
            .unwrap();
        assert_eq!(crossing.offset, None);
        assert_eq!(crossing.confidence, Confidence::Exact);
    }

    #[test]
    fn coarse_resolution_stops_early() {
        let store = CellStore::new();
        let e = Evaluator::new(&store, SearchConfig { samples: 4, resolution: Duration::MILLISECOND });
        let target = Duration(1_234_567);
        let offset = e
            .search_earliest(Direction::Rising, window(0, 10), |d| Ok(d >= target))
            .unwrap()
            .offset
            .unwrap();
        assert!(offset >= target);
        assert!(offset - target <= Duration::MILLISECOND);
    }
}

// ── Algebra ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod algebra_tests {
    use super::*;

    #[test]
    fn always_and_never() {
        let store = CellStore::new();
        let e = ev(&store);
        assert_eq!(always().earliest(&e, Direction::Rising, window(2, 5)).unwrap().offset, Some(secs(2)));
        assert_eq!(always().latest(&e, Direction::Rising, window(2, 5)).unwrap().offset, Some(secs(5)));
        assert_eq!(never().earliest(&e, Direction::Rising, window(2, 5)).unwrap().offset, None);
        assert_eq!(never().earliest(&e, Direction::Falling, window(2, 5)).unwrap().offset, Some(secs(2)));
    }

    #[test]
    fn not_flips_direction() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let crossing = at_least(x, 10.0).not().earliest(&ev(&store), Direction::Falling, window(0, 20)).unwrap();
        assert_eq!(crossing.offset, Some(secs(10)));
    }

    #[test]
    fn and_converges_to_overlap() {
        // x ≥ 10 from t = 10; y ≤ 5 from t = 15.
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let y = store.allocate("y", Linear::new(20.0, -1.0));
        let both = at_least(x, 10.0).and(at_most(y, 5.0));
        let crossing = both.earliest(&ev(&store), Direction::Rising, window(0, 100)).unwrap();
        assert_eq!(crossing.offset, Some(secs(15)));
        assert_eq!(crossing.strategy, Strategy::Analytic);
    }

    #[test]
    fn and_without_overlap_is_none() {
        // x ≥ 10 from t = 10, but x ≤ 5 only before t = 5.
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let both = at_least(x, 10.0).and(at_most(x, 5.0));
        let crossing = both.earliest(&ev(&store), Direction::Rising, window(0, 100)).unwrap();
        assert_eq!(crossing.offset, None);
    }

    #[test]
    fn or_takes_earlier_operand() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let y = store.allocate("y", Linear::new(0.0, 2.0));
        let either = at_least(x, 10.0).or(at_least(y, 10.0));
        let crossing = either.earliest(&ev(&store), Direction::Rising, window(0, 100)).unwrap();
        assert_eq!(crossing.offset, Some(secs(5)));
    }

    #[test]
    fn when_on_discrete_cell() {
        let mut store = CellStore::new();
        let mode = store.allocate("mode", Discrete("idle"));
        let e = ev(&store);
        let busy = when(mode, |m: &&str| *m == "busy");
        assert_eq!(busy.earliest(&e, Direction::Rising, Window::from_now()).unwrap().offset, None);
        let idle = when(mode, |m: &&str| *m == "idle");
        let crossing = idle.earliest(&e, Direction::Rising, Window::from_now()).unwrap();
        assert_eq!(crossing.offset, Some(Duration::ZERO));
        assert_eq!(crossing.strategy, Strategy::Analytic);
    }

    #[test]
    fn when_on_continuous_resource_searches() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let crossing = when(x, |v: &f64| *v >= 3.0)
            .earliest(&ev(&store), Direction::Rising, window(0, 10))
            .unwrap();
        assert_eq!(crossing.strategy, Strategy::Search);
        assert_eq!(crossing.offset, Some(secs(3)));
    }

    #[test]
    fn holds_at_and_next_satisfied() {
        let mut store = CellStore::new();
        let x = store.allocate("x", Linear::new(0.0, 1.0));
        let c = at_least(x, 2.0).boxed();
        let e = ev(&store);
        assert!(!e.holds_at(&c, secs(1)).unwrap());
        assert!(e.holds_at(&c, secs(2)).unwrap());
        assert_eq!(e.next_satisfied(&c).unwrap().offset, Some(secs(2)));
    }
}
