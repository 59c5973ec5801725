use serde::Serialize;
use serde_json::Value;

use super::physical_activity::PhysicalActivity;

/// A processed item that was stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSuccess<T> {
    pub code: u16,
    pub item: T,
}

/// A processed item that was rejected, either by validation, as a duplicate,
/// or by the storage layer. The status code tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusError<T> {
    pub code: u16,
    pub message: String,
    pub description: String,
    pub item: T,
}

/// Outcome of one item of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<S, E> {
    Success(StatusSuccess<S>),
    Error(StatusError<E>),
}

/// Per-item outcomes of a batch submission.
///
/// Each list is kept in the order its items were processed. There is no index back into
/// the submitted batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiStatus<S, E> {
    pub success: Vec<StatusSuccess<S>>,
    pub error: Vec<StatusError<E>>,
}

impl<S, E> Default for MultiStatus<S, E> {
    fn default() -> Self {
        Self {
            success: Vec::new(),
            error: Vec::new(),
        }
    }
}

impl<S, E> MultiStatus<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item's outcome to the matching list
    pub fn push(&mut self, outcome: ItemOutcome<S, E>) {
        match outcome {
            ItemOutcome::Success(success) => self.success.push(success),
            ItemOutcome::Error(error) => self.error.push(error),
        }
    }

    /// Total number of items reported
    pub fn len(&self) -> usize {
        self.success.len() + self.error.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S, E> FromIterator<ItemOutcome<S, E>> for MultiStatus<S, E> {
    fn from_iter<I: IntoIterator<Item = ItemOutcome<S, E>>>(iter: I) -> Self {
        let mut report = Self::new();
        for outcome in iter {
            report.push(outcome);
        }
        report
    }
}

/// Report for a batch of physical activities. Rejected items are echoed as submitted.
pub type ActivityMultiStatus = MultiStatus<PhysicalActivity, Value>;

/// Result of a submission: the stored record for a single candidate,
/// a per-item report for a batch
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Created(PhysicalActivity),
    MultiStatus(ActivityMultiStatus),
}
