/*!
 * Batch planning.
 *
 * Units are packed left to right into batches bounded by a unit count and a
 * character total. The pass is greedy and deterministic, so the same
 * document always produces the same batches in the same order.
 */

use crate::document::TextUnit;

/// Lifecycle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchStatus {
    #[default]
    Pending,
    InFlight,
    Completed,
    Failed,
}

/// An ordered group of units translated with one collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Sequential batch id
    pub batch_id: usize,

    /// Member unit ids in document order
    pub unit_ids: Vec<usize>,

    /// Sum of the members' character counts
    pub total_characters: usize,

    /// Current status
    pub status: BatchStatus,

    /// Number of retries made after the first attempt
    pub retry_count: u32,
}

impl Batch {
    fn new(batch_id: usize) -> Self {
        Self {
            batch_id,
            unit_ids: Vec::new(),
            total_characters: 0,
            status: BatchStatus::Pending,
            retry_count: 0,
        }
    }

    /// Number of member units
    pub fn len(&self) -> usize {
        self.unit_ids.len()
    }

    /// Whether the batch has no members
    pub fn is_empty(&self) -> bool {
        self.unit_ids.is_empty()
    }
}

/// Partition units into batches.
///
/// A new batch starts when adding the next unit would exceed `batch_size`
/// units or `max_chars` characters. Limits are only checked against a
/// non-empty batch, so an oversized unit still gets a batch of its own.
pub fn plan_batches<'a, I>(units: I, batch_size: usize, max_chars: usize) -> Vec<Batch>
where
    I: IntoIterator<Item = &'a TextUnit>,
{
    let mut batches = Vec::new();
    let mut current = Batch::new(0);

    for unit in units {
        let chars = unit.char_count();
        let full = current.len() + 1 > batch_size || current.total_characters + chars > max_chars;
        if !current.is_empty() && full {
            let next = Batch::new(current.batch_id + 1);
            batches.push(std::mem::replace(&mut current, next));
        }
        current.unit_ids.push(unit.unit_id);
        current.total_characters += chars;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
