//! Click-to-select line range state machine
//!
//! The first click selects one line, the second click closes the range
//! (in either direction), and a third click starts over. Every click
//! re-derives the clip [`TimeRange`] and hands it to the observer.

use crate::lyrics::{LyricsTimeline, TimeRange};
use crate::{Error, Result};

/// Selected lines within one timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected
    #[default]
    Empty,
    /// First click made, range still open
    Single(usize),
    /// Closed range, `first <= last`
    Range(usize, usize),
}

impl Selection {
    /// Next state after a click on `index`
    pub fn after_click(self, index: usize) -> Selection {
        match self {
            Selection::Empty => Selection::Single(index),
            Selection::Single(first) => Selection::Range(first.min(index), first.max(index)),
            Selection::Range(..) => Selection::Single(index),
        }
    }

    /// Inclusive `(first, last)` bounds, `None` when empty
    pub fn bounds(&self) -> Option<(usize, usize)> {
        match *self {
            Selection::Empty => None,
            Selection::Single(index) => Some((index, index)),
            Selection::Range(first, last) => Some((first, last)),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.bounds()
            .map_or(false, |(first, last)| first <= index && index <= last)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }
}

type RangeObserver = Box<dyn FnMut(&TimeRange) + Send>;

/// Selection over a lyrics timeline, emitting a derived time range per click
pub struct LineSelector {
    timeline: LyricsTimeline,
    selection: Selection,
    time_range: TimeRange,
    observer: Option<RangeObserver>,
}

impl LineSelector {
    pub fn new(timeline: LyricsTimeline) -> Self {
        Self {
            timeline,
            selection: Selection::Empty,
            time_range: TimeRange::default(),
            observer: None,
        }
    }

    /// Register the callback that receives each derived range.
    ///
    /// Called synchronously from [`LineSelector::select`], once per accepted click.
    pub fn on_range_change(&mut self, observer: impl FnMut(&TimeRange) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn timeline(&self) -> &LyricsTimeline {
        &self.timeline
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Last derived range, or the default range before any click
    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    /// Swap in a new timeline; the old selection does not carry over
    pub fn replace_timeline(&mut self, timeline: LyricsTimeline) {
        self.timeline = timeline;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.selection = Selection::Empty;
        self.time_range = TimeRange::default();
    }

    /// Apply a click on line `index` and return the new range.
    ///
    /// Indices outside the timeline are rejected without touching the
    /// selection or notifying the observer.
    pub fn select(&mut self, index: usize) -> Result<TimeRange> {
        if index >= self.timeline.len() {
            return Err(Error::InvalidInput(format!(
                "line {} outside timeline of {} lines",
                index,
                self.timeline.len()
            )));
        }

        let next = self.selection.after_click(index);
        let (first, last) = next
            .bounds()
            .ok_or_else(|| Error::InvalidInput("click produced an empty selection".to_string()))?;
        let range = self.timeline.range_for(first, last)?;

        self.selection = next;
        self.time_range = range.clone();
        if let Some(observer) = self.observer.as_mut() {
            observer(&range);
        }

        Ok(range)
    }

    /// True when `index` lies within the selected lines
    pub fn is_selected(&self, index: usize) -> bool {
        index < self.timeline.len() && self.selection.contains(index)
    }
}

impl std::fmt::Debug for LineSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSelector")
            .field("lines", &self.timeline.len())
            .field("selection", &self.selection)
            .field("time_range", &self.time_range)
            .finish()
    }
}
