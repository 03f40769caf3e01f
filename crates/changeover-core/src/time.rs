/// Times are whole seconds relative to the event's zero time.
pub type TimeSecs = i32;

/// "No time recorded". A zero start or finish means the value is absent.
pub const NO_TIME: TimeSecs = 0;

/// One week in seconds. Used as the rogaining point multiplier so that
/// point totals dominate running time in a single scalar score.
///
/// This implies a hard bound: running times must stay below one week,
/// or point-then-time ordering could invert. Real events are hours or
/// at most days, so the bound is documented rather than enforced.
pub const WEEK_SECS: TimeSecs = 7 * 24 * 3600;

/// Base constant for ranking scores. `RANK_BASE - time` maps "smaller
/// time wins" onto "higher score wins". Large enough that rogaining
/// scores (`WEEK_SECS * (points + 1) - time`) never exceed it for any
/// plausible point total.
pub const RANK_BASE: i64 = 1 << 42;

/// Format a time as `h:mm:ss` or `mm:ss` for display and logs.
pub fn format_time(t: TimeSecs) -> String {
    if t <= NO_TIME {
        return "-".to_string();
    }
    let h = t / 3600;
    let m = (t / 60) % 60;
    let s = t % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Elapsed span between a start and a finish, or `NO_TIME` when either
/// end is missing or the span would be negative.
pub fn elapsed(start: TimeSecs, finish: TimeSecs) -> TimeSecs {
    if finish <= NO_TIME || start < 0 || finish < start {
        NO_TIME
    } else {
        finish - start
    }
}
