//! Submission queues: a fresh/missed FIFO pair per task kind, bounded by
//! `max_tasks`.
//!
//! All mutation happens under the pool mutex; this type is plain data plus
//! admission policy. Enqueue appends at the back, dispatch consumes from the
//! front, so submission order is dispatch order within a queue. An item the
//! dispatcher could not place is appended to the missed queue of its kind;
//! since every missed item predates every fresh item of the same kind, and
//! the dispatcher always tries missed before fresh, end-to-end FIFO order is
//! preserved across the displacement.

use std::collections::VecDeque;

use crate::error::SubmitError;
use crate::task::{same_object, CallbackTask, ObjectHandle};

pub(crate) struct SubmissionQueues {
    max_tasks: usize,
    pub(crate) fresh_callbacks: VecDeque<CallbackTask>,
    pub(crate) missed_callbacks: VecDeque<CallbackTask>,
    pub(crate) fresh_objects: VecDeque<ObjectHandle>,
    pub(crate) missed_objects: VecDeque<ObjectHandle>,
}

impl SubmissionQueues {
    pub(crate) fn new(max_tasks: usize) -> Self {
        Self {
            max_tasks,
            fresh_callbacks: VecDeque::new(),
            missed_callbacks: VecDeque::new(),
            fresh_objects: VecDeque::new(),
            missed_objects: VecDeque::new(),
        }
    }

    /// Admits a callback task while its kind holds fewer than `max_tasks`
    /// entries. The fresh and missed queues count together: displacement
    /// moves work between them without changing how much is waiting.
    pub(crate) fn enqueue_callback(&mut self, task: CallbackTask) -> Result<(), SubmitError> {
        if self.fresh_callbacks.len() + self.missed_callbacks.len() >= self.max_tasks {
            return Err(SubmitError::QueueFull);
        }
        self.fresh_callbacks.push_back(task);
        Ok(())
    }

    /// Admits an object task while its kind has room and the handle is not
    /// already resident in either object queue.
    pub(crate) fn enqueue_object(&mut self, handle: ObjectHandle) -> Result<(), SubmitError> {
        if self.fresh_objects.len() + self.missed_objects.len() >= self.max_tasks {
            return Err(SubmitError::QueueFull);
        }
        if self.contains_object(&handle) {
            return Err(SubmitError::AlreadyQueued);
        }
        self.fresh_objects.push_back(handle);
        Ok(())
    }

    /// True if the handle is waiting in the fresh or missed object queue.
    pub(crate) fn contains_object(&self, handle: &ObjectHandle) -> bool {
        self.fresh_objects
            .iter()
            .chain(self.missed_objects.iter())
            .any(|queued| same_object(queued, handle))
    }

    pub(crate) fn fresh_object_count(&self) -> usize {
        self.fresh_objects.len()
    }

    pub(crate) fn missed_object_count(&self) -> usize {
        self.missed_objects.len()
    }

    /// True when all four queues are empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.fresh_callbacks.is_empty()
            && self.missed_callbacks.is_empty()
            && self.fresh_objects.is_empty()
            && self.missed_objects.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.fresh_callbacks.clear();
        self.missed_callbacks.clear();
        self.fresh_objects.clear();
        self.missed_objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskObject;
    use std::sync::Arc;

    struct Nop;

    impl TaskObject for Nop {
        fn execute(&self) {}
    }

    fn handle() -> ObjectHandle {
        Arc::new(Nop)
    }

    #[test]
    fn admits_up_to_max_tasks_and_no_more() {
        let mut queues = SubmissionQueues::new(2);
        assert!(queues.enqueue_callback(CallbackTask::new(|| {})).is_ok());
        assert!(queues.enqueue_callback(CallbackTask::new(|| {})).is_ok());
        assert!(matches!(
            queues.enqueue_callback(CallbackTask::new(|| {})),
            Err(SubmitError::QueueFull)
        ));
    }

    #[test]
    fn object_admission_is_bounded_independently() {
        let mut queues = SubmissionQueues::new(1);
        assert!(queues.enqueue_object(handle()).is_ok());
        assert!(matches!(
            queues.enqueue_object(handle()),
            Err(SubmitError::QueueFull)
        ));
        // The callback queues are bounded separately.
        assert!(queues.enqueue_callback(CallbackTask::new(|| {})).is_ok());
    }

    #[test]
    fn duplicate_handle_is_refused_while_resident() {
        let mut queues = SubmissionQueues::new(4);
        let first = handle();
        assert!(queues.enqueue_object(Arc::clone(&first)).is_ok());
        assert!(matches!(
            queues.enqueue_object(Arc::clone(&first)),
            Err(SubmitError::AlreadyQueued)
        ));

        // Still refused after displacement into the missed queue.
        let displaced = queues.fresh_objects.pop_front().unwrap();
        queues.missed_objects.push_back(displaced);
        assert!(matches!(
            queues.enqueue_object(Arc::clone(&first)),
            Err(SubmitError::AlreadyQueued)
        ));

        // Accepted again once fully dispatched.
        queues.missed_objects.clear();
        assert!(queues.enqueue_object(first).is_ok());
    }

    #[test]
    fn displaced_work_still_counts_against_capacity() {
        let mut queues = SubmissionQueues::new(2);
        queues.enqueue_object(handle()).unwrap();
        queues.enqueue_object(handle()).unwrap();
        // A sweep that finds no idle worker moves fresh work to missed.
        while let Some(displaced) = queues.fresh_objects.pop_front() {
            queues.missed_objects.push_back(displaced);
        }
        assert!(matches!(
            queues.enqueue_object(handle()),
            Err(SubmitError::QueueFull)
        ));
    }

    #[test]
    fn fifo_order_is_submission_order() {
        let mut queues = SubmissionQueues::new(8);
        let handles: Vec<ObjectHandle> = (0..4).map(|_| handle()).collect();
        for h in &handles {
            queues.enqueue_object(Arc::clone(h)).unwrap();
        }
        for expected in &handles {
            let got = queues.fresh_objects.pop_front().unwrap();
            assert!(same_object(&got, expected));
        }
    }

    #[test]
    fn empty_checks_all_four_queues() {
        let mut queues = SubmissionQueues::new(4);
        assert!(queues.is_empty());
        queues
            .missed_callbacks
            .push_back(CallbackTask::new(|| {}));
        assert!(!queues.is_empty());
        queues.clear();
        assert!(queues.is_empty());
    }
}
