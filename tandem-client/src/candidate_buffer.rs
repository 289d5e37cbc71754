use std::collections::VecDeque;
use tandem_core::IceCandidate;

/// What to do with a remote candidate handed to [`CandidateBuffer::enqueue`].
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<C> {
    /// The remote description is installed; apply the candidate now.
    Apply(C),
    /// Held until the next [`CandidateBuffer::flush`].
    Buffered,
}

/// Remote candidates that arrived before the remote description was installed.
///
/// Candidates are released exactly once and in arrival order. After `flush`
/// the buffer stays empty and every further candidate is handed straight back.
#[derive(Debug)]
pub struct CandidateBuffer<C = IceCandidate> {
    pending: VecDeque<C>,
    ready: bool,
}

impl<C> Default for CandidateBuffer<C> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            ready: false,
        }
    }
}

impl<C> CandidateBuffer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: C) -> Admission<C> {
        if self.ready {
            Admission::Apply(candidate)
        } else {
            self.pending.push_back(candidate);
            Admission::Buffered
        }
    }

    /// Marks the remote description as installed and drains everything held so far.
    pub fn flush(&mut self) -> Vec<C> {
        self.ready = true;
        self.pending.drain(..).collect()
    }

    /// Drops held candidates and waits for a new remote description.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
