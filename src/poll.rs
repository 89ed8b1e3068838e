use std::os::fd::RawFd;

use log::trace;

use crate::op::Operation;
use crate::queue::submit_one;
use crate::{Error, Interest, Queue, Readiness, Result, Token};

/// Block until `fd` reports any of `interest`.
///
/// Pushes a single readiness watch tagged [`Token::POLL`] and waits for its
/// completion. The calling thread is blocked for the whole time even though
/// the watch itself runs asynchronously in the kernel.
///
/// # Errors
///
/// [`Error::SubmissionFull`] if the watch could not be queued,
/// [`Error::PollFailed`] if it completed with an error and
/// [`Error::UnexpectedCompletion`] if some other operation completed first.
pub fn wait_for<Q>(queue: &mut Q, fd: RawFd, interest: Interest) -> Result<Readiness>
where
    Q: Queue + ?Sized,
{
    queue.push(Operation::poll(fd, interest, Token::POLL))?;
    let completion = submit_one(queue)?;

    if completion.token() != Token::POLL {
        return Err(Error::UnexpectedCompletion {
            token: completion.token(),
            result: completion.result(),
        });
    }
    if completion.is_error() {
        return Err(Error::PollFailed(completion.result()));
    }

    let readiness = Readiness::from_raw(completion.result() as u32);
    trace!("fd {} ready: {:?}", fd, readiness);
    Ok(readiness)
}
