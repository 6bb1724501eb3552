//! Read-only ranked view of the queue.

use crate::domain::RankedEntry;

/// Ordered, finite sequence of ranked rows taken at one instant.
///
/// The rows are detached from the queue, so holding a snapshot never blocks
/// mutation. It can be consumed once.
#[derive(Debug)]
pub struct Snapshot {
    rows: std::vec::IntoIter<RankedEntry>,
}

impl Snapshot {
    pub(crate) fn new(rows: Vec<RankedEntry>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for Snapshot {
    type Item = RankedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Snapshot {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PlayerId;

    fn row(rank: usize) -> RankedEntry {
        RankedEntry {
            rank,
            player: PlayerId::from_u128(rank as u128),
            queue_points: 0,
            bonus: 0,
            total: 0,
        }
    }

    #[test]
    fn test_snapshot_yields_in_order_once() {
        let mut snapshot = Snapshot::new(vec![row(1), row(2)]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.next().map(|r| r.rank), Some(1));
        assert_eq!(snapshot.next().map(|r| r.rank), Some(2));
        assert!(snapshot.next().is_none());
        assert!(snapshot.next().is_none());
    }
}
