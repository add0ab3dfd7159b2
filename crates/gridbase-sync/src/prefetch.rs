use std::time::{Duration, Instant};

/// Rows of headroom left before the next page fetch kicks off. Generous so
/// fast flings through a virtualized grid never hit unloaded rows.
pub const PREFETCH_THRESHOLD: u64 = 7_500;

/// Minimum spacing between scroll evaluations.
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(150);

/// What the scroll handler should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchDecision {
    /// Fetch the next page at this cursor.
    Fetch { cursor: u64 },
    Idle,
}

/// Decides when scrolling warrants fetching the next page.
///
/// Stateful on two axes: a throttle clamps how often scroll positions are
/// even considered, and the cursor of the last fetch it triggered is
/// remembered so one crossing of the threshold fires exactly one fetch.
/// Callers pass `now` explicitly, which keeps throttle behavior testable
/// without sleeping.
#[derive(Debug, Default)]
pub struct PrefetchController {
    last_evaluated: Option<Instant>,
    last_triggered_cursor: Option<u64>,
}

impl PrefetchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one scroll position.
    ///
    /// `last_visible_index` is the bottom-most rendered row index,
    /// `loaded_rows` how many rows the cache holds for the stream, and
    /// `next_cursor` the stream's follow-up cursor (`None` once exhausted).
    pub fn on_scroll(
        &mut self,
        last_visible_index: u64,
        loaded_rows: u64,
        next_cursor: Option<u64>,
        fetch_in_flight: bool,
        now: Instant,
    ) -> PrefetchDecision {
        if let Some(last) = self.last_evaluated {
            if now.duration_since(last) < SCROLL_THROTTLE {
                return PrefetchDecision::Idle;
            }
        }
        self.last_evaluated = Some(now);

        let Some(cursor) = next_cursor else {
            return PrefetchDecision::Idle;
        };
        if fetch_in_flight {
            return PrefetchDecision::Idle;
        }
        if loaded_rows.saturating_sub(last_visible_index) > PREFETCH_THRESHOLD {
            return PrefetchDecision::Idle;
        }
        if self.last_triggered_cursor == Some(cursor) {
            return PrefetchDecision::Idle;
        }

        self.last_triggered_cursor = Some(cursor);
        PrefetchDecision::Fetch { cursor }
    }

    /// Forget fetch history. Call when the query key changes (filters,
    /// sorting, or search edits) so the first page of the new stream can
    /// trigger again.
    pub fn reset(&mut self) {
        self.last_triggered_cursor = None;
    }
}

/// Row count the grid should render.
///
/// A filtering stream sizes itself by the filtered total its first page
/// reported, falling back to the loaded rows until that page arrives. An
/// unfiltered stream uses the table's cached row count, which may exceed
/// what is loaded and leaves scroll room for prefetching.
pub fn effective_row_count(
    filtering: bool,
    loaded_rows: u64,
    total_filtered: Option<u64>,
    table_total: Option<u64>,
) -> u64 {
    let total = if filtering { total_filtered } else { table_total };
    total.map_or(loaded_rows, |t| t.max(loaded_rows))
}
