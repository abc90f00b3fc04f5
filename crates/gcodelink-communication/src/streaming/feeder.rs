//! Command feeder
//!
//! Holds queued lines per source until the sender has room for them. One
//! source is active at a time; it keeps the lane until its queue drains so
//! lines of a program or macro are never interleaved with another source.

use gcodelink_core::{CommandSource, QueuedCommand};
use std::collections::VecDeque;

/// Per-source queues of lines waiting for the sender
#[derive(Debug, Default)]
pub struct Feeder {
    lanes: [VecDeque<QueuedCommand>; CommandSource::ALL.len()],
    active: Option<CommandSource>,
    next_sequence: u64,
}

impl Feeder {
    /// Create an empty feeder
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one line and return its sequence id
    pub fn enqueue(&mut self, text: impl Into<String>, source: CommandSource) -> u64 {
        self.next_sequence += 1;
        let command = QueuedCommand::new(self.next_sequence, text, source);
        self.lanes[source.index()].push_back(command);
        self.next_sequence
    }

    /// Queue a batch of lines from one source
    pub fn enqueue_all<I, S>(&mut self, lines: I, source: CommandSource) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines
            .into_iter()
            .map(|line| self.enqueue(line, source))
            .count()
    }

    /// Allocate a sequence id for a line sent around the queue
    pub fn next_sequence_id(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Most recently issued sequence id, 0 before the first
    pub fn last_sequence_id(&self) -> u64 {
        self.next_sequence
    }

    /// Next line to send, without removing it
    pub fn peek(&mut self) -> Option<&QueuedCommand> {
        let source = self.select()?;
        self.lanes[source.index()].front()
    }

    /// Remove and return the next line to send
    pub fn pop(&mut self) -> Option<QueuedCommand> {
        let source = self.select()?;
        let lane = &mut self.lanes[source.index()];
        let command = lane.pop_front();
        if lane.is_empty() {
            self.active = None;
        }
        command
    }

    /// Drop every queued line; returns how many were dropped
    pub fn clear(&mut self) -> usize {
        self.active = None;
        self.lanes.iter_mut().map(|lane| lane.drain(..).count()).sum()
    }

    /// Total queued lines
    pub fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    /// Queued lines from one source
    pub fn len_of(&self, source: CommandSource) -> usize {
        self.lanes[source.index()].len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    /// Source currently holding the lane
    pub fn active_source(&self) -> Option<CommandSource> {
        self.active
    }

    fn select(&mut self) -> Option<CommandSource> {
        if let Some(source) = self.active {
            if !self.lanes[source.index()].is_empty() {
                return Some(source);
            }
        }
        self.active = CommandSource::ALL
            .into_iter()
            .find(|source| !self.lanes[source.index()].is_empty());
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_source_keeps_lane() {
        let mut feeder = Feeder::new();
        feeder.enqueue("G0 X1", CommandSource::Program);
        feeder.enqueue("G0 X2", CommandSource::Program);

        assert_eq!(feeder.pop().unwrap().text, "G0 X1");
        assert_eq!(feeder.active_source(), Some(CommandSource::Program));

        feeder.enqueue("$J=X1F100", CommandSource::Jog);
        assert_eq!(feeder.pop().unwrap().text, "G0 X2");
        assert_eq!(feeder.active_source(), None);
        assert_eq!(feeder.pop().unwrap().text, "$J=X1F100");
        assert!(feeder.pop().is_none());
    }

    #[test]
    fn test_sequence_ids_increase() {
        let mut feeder = Feeder::new();
        let a = feeder.enqueue("G0", CommandSource::Macro);
        let b = feeder.next_sequence_id();
        let c = feeder.enqueue("G1", CommandSource::System);
        assert!(a < b && b < c);
        assert_eq!(feeder.last_sequence_id(), c);
    }

    #[test]
    fn test_clear() {
        let mut feeder = Feeder::new();
        assert_eq!(
            feeder.enqueue_all(["G0", "G1", "G2"], CommandSource::Program),
            3
        );
        feeder.enqueue("$H", CommandSource::System);
        assert_eq!(feeder.peek().unwrap().text, "G0");
        assert_eq!(feeder.len(), 4);

        assert_eq!(feeder.clear(), 4);
        assert!(feeder.is_empty());
        assert_eq!(feeder.active_source(), None);
    }
}
