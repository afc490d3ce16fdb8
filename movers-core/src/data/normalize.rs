//! Calendar reindexing for a single symbol's bars.
//!
//! Trading data has gaps (weekends, holidays, halts). Before a return is
//! measured the bars are laid onto every calendar day of the trailing window
//! and gaps take the most recent earlier bar. Bars dated before the window
//! seed the fill; bars after it are ignored.

use super::provider::PriceBar;
use crate::window::TrailingWindow;

/// One slot per calendar day of a window, ascending. `None` means no bar
/// exists on or before that day.
pub type NormalizedSeries = Vec<Option<PriceBar>>;

/// Reindex `bars` onto every day of `window`, forward-filling gaps.
pub fn reindex_forward_fill(bars: &[PriceBar], window: &TrailingWindow) -> NormalizedSeries {
    let mut sorted: Vec<&PriceBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.date);

    let mut next = 0;
    let mut last: Option<&PriceBar> = None;

    window
        .dates()
        .map(|day| {
            while next < sorted.len() && sorted[next].date <= day {
                last = Some(sorted[next]);
                next += 1;
            }
            last.map(|bar| bar.on(day))
        })
        .collect()
}

/// If the first day has no close, copy the second day's full record into it.
///
/// Best effort only: when the second day is empty too the series is left as
/// is and the row is rejected later.
pub fn repair_first_day(series: &mut NormalizedSeries, window: &TrailingWindow) {
    if series.len() < 2 || close_at(series, 0).is_some() {
        return;
    }
    series[0] = series[1].as_ref().map(|bar| bar.on(window.start()));
}

/// Reindex, forward-fill and repair the leading day.
pub fn normalize(bars: &[PriceBar], window: &TrailingWindow) -> NormalizedSeries {
    let mut series = reindex_forward_fill(bars, window);
    repair_first_day(&mut series, window);
    series
}

/// Closing price of slot `i`, if any.
pub fn close_at(series: &NormalizedSeries, i: usize) -> Option<f64> {
    series.get(i).and_then(|slot| slot.as_ref()).and_then(|b| b.close)
}

/// Closing prices for every slot.
pub fn closes(series: &NormalizedSeries) -> Vec<Option<f64>> {
    (0..series.len()).map(|i| close_at(series, i)).collect()
}
