//! Trailing-window extremes over a leg's own bars.
//!
//! Windows include the current bar and are allowed to be partial at the start
//! of the series, so element `i` covers bars `i+1-min(i+1, window) ..= i`.

use std::collections::VecDeque;

use crate::domain::PriceBar;

/// Monotonic-deque rolling extreme. `dominates(new, old)` is true when `old`
/// can no longer be the extreme of any window that contains `new`.
fn rolling_extreme(values: &[f64], window: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);

    for (i, &v) in values.iter().enumerate() {
        while let Some(&back) = deque.back() {
            if dominates(v, values[back]) {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back(i);
        while let Some(&front) = deque.front() {
            if front + window <= i {
                deque.pop_front();
            } else {
                break;
            }
        }
        if let Some(&front) = deque.front() {
            out.push(values[front]);
        }
    }
    out
}

/// Rolling maximum of `high`.
pub fn rolling_high(bars: &[PriceBar], window: usize) -> Vec<f64> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    rolling_extreme(&highs, window, |new, old| new >= old)
}

/// Rolling minimum of `low`.
pub fn rolling_low(bars: &[PriceBar], window: usize) -> Vec<f64> {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    rolling_extreme(&lows, window, |new, old| new <= old)
}
