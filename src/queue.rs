use std::io;

use crate::op::{Completion, Operation};
use crate::{Error, Result, Token};

/// A completion-based asynchronous I/O facility.
///
/// Operations are first pushed into the submission side, which never blocks,
/// and handed to the kernel with [`submit`] or [`submit_and_wait`]. Results
/// come back on the completion side tagged with the operation's [`Token`].
/// A completion returned by [`peek`] or [`wait_one`] stays at the head of the
/// queue until it is acknowledged with [`consume`].
///
/// [`submit`]: Queue::submit
/// [`submit_and_wait`]: Queue::submit_and_wait
/// [`peek`]: Queue::peek
/// [`wait_one`]: Queue::wait_one
/// [`consume`]: Queue::consume
pub trait Queue {
    /// Push one operation, returns its token.
    ///
    /// Fails with [`Error::SubmissionFull`] if no submission slot can be
    /// obtained.
    fn push(&mut self, op: Operation) -> Result<Token>;

    /// Submit all pushed operations without waiting, returns the number
    /// submitted.
    fn submit(&mut self) -> Result<usize>;

    /// Submit all pushed operations and block until at least `want`
    /// completions are available. Returns the number submitted.
    fn submit_and_wait(&mut self, want: usize) -> Result<usize>;

    /// Block until a completion is available and return it.
    fn wait_one(&mut self) -> Result<Completion>;

    /// Return the completion at the head of the queue, if any.
    fn peek(&mut self) -> Option<Completion>;

    /// Acknowledge the completion at the head of the queue.
    fn consume(&mut self);

    /// Wait for the next completion and acknowledge it.
    fn reap(&mut self) -> Result<Completion> {
        let completion = self.wait_one()?;
        self.consume();
        Ok(completion)
    }
}

impl<Q: Queue + ?Sized> Queue for &mut Q {
    fn push(&mut self, op: Operation) -> Result<Token> {
        (**self).push(op)
    }

    fn submit(&mut self) -> Result<usize> {
        (**self).submit()
    }

    fn submit_and_wait(&mut self, want: usize) -> Result<usize> {
        (**self).submit_and_wait(want)
    }

    fn wait_one(&mut self) -> Result<Completion> {
        (**self).wait_one()
    }

    fn peek(&mut self) -> Option<Completion> {
        (**self).peek()
    }

    fn consume(&mut self) {
        (**self).consume()
    }
}

/// Submit the single pushed operation, wait for its completion and
/// acknowledge it.
pub(crate) fn submit_one<Q: Queue + ?Sized>(queue: &mut Q) -> Result<Completion> {
    let submitted = queue.submit_and_wait(1)?;
    if submitted != 1 {
        return Err(Error::ShortSubmit {
            submitted,
            wanted: 1,
        });
    }

    let completion = queue
        .peek()
        .ok_or_else(|| Error::Queue(io::Error::other("no completion returned")))?;
    queue.consume();
    Ok(completion)
}

#[cfg(test)]
pub(crate) use self::scripted::Scripted;

#[cfg(test)]
mod scripted {
    use std::collections::{HashMap, VecDeque};
    use std::io;

    use crate::op::{Completion, Operation};
    use crate::{Error, Queue, Result, Token};

    /// In-memory `Queue` answering operations from a script.
    ///
    /// Each submitted operation completes with the next result scripted for
    /// its token. Operations without a scripted result never complete.
    #[derive(Debug, Default)]
    pub(crate) struct Scripted {
        results: HashMap<Token, VecDeque<i32>>,
        pending: Vec<Operation>,
        submitted: Vec<Operation>,
        ready: VecDeque<Completion>,
        capacity: Option<usize>,
        reversed: bool,
        consumed: usize,
    }

    impl Scripted {
        pub(crate) fn new() -> Scripted {
            Scripted::default()
        }

        /// Complete the next operation tagged `token` with `result`.
        pub(crate) fn on(mut self, token: Token, result: i32) -> Scripted {
            self.results.entry(token).or_default().push_back(result);
            self
        }

        /// Only `capacity` operations may be pending at once.
        pub(crate) fn capacity(mut self, capacity: usize) -> Scripted {
            self.capacity = Some(capacity);
            self
        }

        /// Deliver the completions of one batch in reverse submission order.
        pub(crate) fn reversed(mut self) -> Scripted {
            self.reversed = true;
            self
        }

        /// Every operation submitted so far, in order.
        pub(crate) fn submitted(&self) -> &[Operation] {
            &self.submitted
        }

        pub(crate) fn consumed(&self) -> usize {
            self.consumed
        }

        /// Completions delivered but not yet consumed.
        pub(crate) fn outstanding(&self) -> usize {
            self.ready.len()
        }

        fn flush(&mut self) -> usize {
            let batch: Vec<Operation> = self.pending.drain(..).collect();
            let mut completions: Vec<Completion> = batch
                .iter()
                .filter_map(|op| {
                    let result = self.results.get_mut(&op.token())?.pop_front()?;
                    Some(Completion::new(op.token(), result))
                })
                .collect();
            if self.reversed {
                completions.reverse();
            }
            self.ready.extend(completions);
            let n = batch.len();
            self.submitted.extend(batch);
            n
        }
    }

    impl Queue for Scripted {
        fn push(&mut self, op: Operation) -> Result<Token> {
            if self.capacity.is_some_and(|cap| self.pending.len() >= cap) {
                return Err(Error::SubmissionFull);
            }
            self.pending.push(op);
            Ok(op.token())
        }

        fn submit(&mut self) -> Result<usize> {
            Ok(self.flush())
        }

        fn submit_and_wait(&mut self, want: usize) -> Result<usize> {
            let n = self.flush();
            if self.ready.len() < want {
                return Err(Error::Queue(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "scripted queue would block",
                )));
            }
            Ok(n)
        }

        fn wait_one(&mut self) -> Result<Completion> {
            self.peek().ok_or_else(|| {
                Error::Queue(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "scripted queue would block",
                ))
            })
        }

        fn peek(&mut self) -> Option<Completion> {
            self.ready.front().copied()
        }

        fn consume(&mut self) {
            if self.ready.pop_front().is_some() {
                self.consumed += 1;
            }
        }
    }
}
