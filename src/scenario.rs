//! The three connect scenarios and the runner driving them.
//!
//! Every scenario creates its own sockets and closes them when it returns,
//! whether it passed or not. The queue is shared by all of them and lives as
//! long as the [`Runner`].

use std::fmt;
use std::net::SocketAddrV4;

use log::{debug, info};

use crate::connect::{self, Outcome};
use crate::link::TimeoutLink;
use crate::sys::Socket;
use crate::{Config, Error, Queue, Result};

/// One independent check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Connect with nothing listening.
    NoPeer,
    /// Connect to a bound listener.
    SuccessfulConnect,
    /// Connect to a saturated listener behind a short linked timeout.
    TimeoutRace,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::NoPeer => "connect_with_no_peer",
            Scenario::SuccessfulConnect => "connect",
            Scenario::TimeoutRace => "connect_timeout",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of the no-peer scenario.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoPeer {
    /// The connect was refused, as it should be.
    Refused,
    /// The queue has no asynchronous connect; nothing else can be checked.
    Unsupported,
}

/// Summary of a complete run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Report {
    /// Every scenario passed.
    Passed,
    /// The remaining scenarios were skipped.
    Skipped { reason: &'static str },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Passed => f.write_str("all scenarios passed"),
            Report::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}

/// Runs the scenarios in order on one queue.
#[derive(Debug)]
pub struct Runner<Q> {
    queue: Q,
    config: Config,
}

impl<Q: Queue> Runner<Q> {
    pub fn new(queue: Q, config: Config) -> Runner<Q> {
        Runner { queue, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn into_queue(self) -> Q {
        self.queue
    }

    /// Run every scenario, stopping at the first failure.
    ///
    /// If the no-peer scenario finds that asynchronous connect is not
    /// supported the rest are skipped and no further connect is submitted.
    pub fn run(&mut self) -> Result<Report> {
        if self.no_peer()? == NoPeer::Unsupported {
            return Ok(Report::Skipped {
                reason: "no connect support",
            });
        }
        self.successful_connect()?;
        self.timeout_race()?;
        Ok(Report::Passed)
    }

    /// Connect to the configured address with nothing listening on it.
    pub fn no_peer(&mut self) -> Result<NoPeer> {
        let scenario = Scenario::NoPeer;
        info!("{}: start", scenario);

        let socket = Socket::stream_v4().map_err(Error::SocketCreate)?;
        let resolution = connect::connect(&mut self.queue, &socket, self.config.address)?;
        let verdict = match resolution.outcome() {
            Outcome::Refused => NoPeer::Refused,
            Outcome::Unsupported => {
                info!("{}: no connect support, skipping", scenario);
                NoPeer::Unsupported
            }
            Outcome::Connected | Outcome::Failed(_) => {
                return Err(Error::UnexpectedResolution {
                    scenario: scenario.name(),
                    code: resolution.code(),
                });
            }
        };
        info!("{}: {:?}", scenario, verdict);
        Ok(verdict)
    }

    /// Connect to a listener bound on the configured address.
    pub fn successful_connect(&mut self) -> Result<()> {
        let scenario = Scenario::SuccessfulConnect;
        info!("{}: start", scenario);

        let listener = Socket::stream_v4().map_err(Error::SocketCreate)?;
        let target = self.listen(&listener, self.config.listen_backlog)?;

        let socket = Socket::stream_v4().map_err(Error::SocketCreate)?;
        let resolution = connect::connect(&mut self.queue, &socket, target)?;
        if resolution.outcome() != Outcome::Connected {
            return Err(Error::UnexpectedResolution {
                scenario: scenario.name(),
                code: resolution.code(),
            });
        }
        info!("{}: connected ({:?})", scenario, resolution);
        Ok(())
    }

    /// Race a connect against a linked timeout it cannot beat.
    ///
    /// The listener's backlog is filled by a blocking connect first, so the
    /// kernel holds the racing connect until the timeout cancels it.
    pub fn timeout_race(&mut self) -> Result<()> {
        let scenario = Scenario::TimeoutRace;
        info!("{}: start", scenario);

        let socket = Socket::stream_v4().map_err(Error::SocketCreate)?;
        connect::configure(&socket)?;

        let listener = Socket::stream_v4().map_err(Error::SocketCreate)?;
        let target = self.listen(&listener, self.config.race_backlog)?;

        let filler = Socket::stream_v4().map_err(Error::SocketCreate)?;
        filler
            .connect(target)
            .map_err(Error::setup("connect(backlog filler)"))?;
        debug!("{}: backlog of {} filled", scenario, target);

        let timeout = self.config.link_timeout;
        let link = TimeoutLink::submit(&mut self.queue, &socket, target, timeout)?;
        link.verify(&mut self.queue)?;
        info!("{}: connect cancelled by timeout", scenario);
        Ok(())
    }

    /// Bind `listener` to the configured address and listen on it, returns
    /// the bound address.
    fn listen(&self, listener: &Socket, backlog: i32) -> Result<SocketAddrV4> {
        listener
            .set_reuse_addr(true)
            .map_err(Error::setup("setsockopt(SO_REUSEADDR)"))?;
        listener
            .bind(self.config.address)
            .map_err(Error::setup("bind"))?;
        listener.listen(backlog).map_err(Error::setup("listen"))?;
        listener.local_addr().map_err(Error::setup("getsockname"))
    }
}
