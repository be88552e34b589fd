use std::collections::VecDeque;

use crate::dispatch::Reply;

/// Reply handler for one submitted command.
///
/// Invoked exactly once: with the decoded reply, or with the connection
/// error that tore the context down before the reply arrived.
pub type Callback<T> = Box<dyn FnOnce(Reply<'_>, T)>;

/// One in-flight command: its callback and the caller's data.
pub(crate) struct Pending<T> {
    callback: Callback<T>,
    data: T,
}

impl<T> Pending<T> {
    pub fn new(callback: Callback<T>, data: T) -> Self {
        Self { callback, data }
    }

    /// Consume the entry, handing `reply` and the user data to the callback.
    pub fn complete(self, reply: Reply<'_>) {
        (self.callback)(reply, self.data)
    }
}

/// FIFO of pending commands, one entry per command written to the output
/// buffer and not yet answered.
pub(crate) struct CommandQueue<T> {
    entries: VecDeque<Pending<T>>,
}

impl<T> CommandQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, entry: Pending<T>) {
        self.entries.push_back(entry);
    }

    pub fn pop_front(&mut self) -> Option<Pending<T>> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
