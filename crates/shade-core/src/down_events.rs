#![forbid(unsafe_code)]

//! Bounded history of touch-down snapshots for diagnostics.
//!
//! The history never feeds back into control flow; it exists so a dump taken
//! after a misbehaving gesture shows what the engine believed at each down.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// What the engine knew when a pointer went down.
#[derive(Debug, Clone, PartialEq)]
pub struct DownEvent {
    pub time: Duration,
    pub x: f32,
    pub y: f32,
    pub dozing: bool,
    pub collapsed: bool,
    pub can_collapse: bool,
    pub listen_for_heads_up: bool,
    pub allow_expand_for_small_expansion: bool,
    pub touch_slop_exceeded_before_down: bool,
    pub last_event_synthesized: bool,
}

impl fmt::Display for DownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={}ms x={:.1} y={:.1} dozing={} collapsed={} can_collapse={} \
             listen_hun={} small_expand={} slop_before={} synthesized={}",
            self.time.as_millis(),
            self.x,
            self.y,
            self.dozing,
            self.collapsed,
            self.can_collapse,
            self.listen_for_heads_up,
            self.allow_expand_for_small_expansion,
            self.touch_slop_exceeded_before_down,
            self.last_event_synthesized,
        )
    }
}

/// Append-only ring of [`DownEvent`]s; the oldest entry is evicted when full.
#[derive(Debug, Clone)]
pub struct DownEventState {
    events: VecDeque<DownEvent>,
    capacity: usize,
}

impl DownEventState {
    /// Create an empty history holding at most `capacity` entries (min 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a down, evicting the oldest entry if full.
    pub fn push(&mut self, event: DownEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DownEvent> {
        self.events.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&DownEvent> {
        self.events.back()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Display for DownEventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "down events ({}/{}):", self.events.len(), self.capacity)?;
        for event in &self.events {
            writeln!(f, "  {event}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> DownEvent {
        DownEvent {
            time: Duration::from_millis(ms),
            x: 0.0,
            y: ms as f32,
            dozing: false,
            collapsed: true,
            can_collapse: false,
            listen_for_heads_up: false,
            allow_expand_for_small_expansion: false,
            touch_slop_exceeded_before_down: false,
            last_event_synthesized: false,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut s = DownEventState::new(3);
        for ms in 0..5 {
            s.push(at(ms));
        }
        assert_eq!(s.len(), 3);
        let times: Vec<u128> = s.iter().map(|e| e.time.as_millis()).collect();
        assert_eq!(times, vec![2, 3, 4]);
        assert_eq!(s.last().map(|e| e.y), Some(4.0));
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut s = DownEventState::new(0);
        s.push(at(1));
        s.push(at(2));
        assert_eq!(s.capacity(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn display_lists_every_entry() {
        let mut s = DownEventState::new(4);
        s.push(at(10));
        s.push(at(20));
        let text = s.to_string();
        assert!(text.starts_with("down events (2/4):"));
        assert!(text.contains("t=10ms"));
        assert!(text.contains("t=20ms"));
    }
}
