use std::env;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use crate::{Error, Result};

/// Port every scenario connects to.
pub const DEFAULT_PORT: u16 = 0x1234;

/// Environment variable overriding [`Config::address`]'s port.
pub const PORT_ENV: &str = "URING_CONNECT_PORT";
/// Environment variable overriding [`Config::link_timeout`], in nanoseconds.
pub const TIMEOUT_ENV: &str = "URING_CONNECT_TIMEOUT_NS";

/// Settings of a scenario run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Address the connect scenarios target.
    pub address: SocketAddrV4,
    /// Submission queue entries of the ring.
    pub queue_entries: u32,
    /// Listen backlog of the successful connect scenario.
    pub listen_backlog: i32,
    /// Listen backlog of the timeout race, small enough for a single filler
    /// connection to saturate it.
    pub race_backlog: i32,
    /// Timeout linked to the racing connect.
    pub link_timeout: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            address: SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT),
            queue_entries: 8,
            listen_backlog: 128,
            race_backlog: 0,
            link_timeout: Duration::from_nanos(100_000),
        }
    }
}

impl Config {
    /// The default configuration with overrides read from the environment.
    pub fn from_env() -> Result<Config> {
        Config::default().with_lookup(|key| env::var(key).ok())
    }

    fn with_lookup<F>(mut self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            let port: u16 = port
                .parse()
                .map_err(|err| Error::Config(format!("{}={:?}: {}", PORT_ENV, port, err)))?;
            self = self.port(port);
        }
        if let Some(nanos) = lookup(TIMEOUT_ENV) {
            let nanos: u64 = nanos
                .parse()
                .map_err(|err| Error::Config(format!("{}={:?}: {}", TIMEOUT_ENV, nanos, err)))?;
            if nanos == 0 {
                return Err(Error::Config(format!("{} must not be zero", TIMEOUT_ENV)));
            }
            self = self.link_timeout(Duration::from_nanos(nanos));
        }
        Ok(self)
    }

    pub fn port(mut self, port: u16) -> Config {
        self.address.set_port(port);
        self
    }

    pub fn queue_entries(mut self, entries: u32) -> Config {
        self.queue_entries = entries;
        self
    }

    pub fn listen_backlog(mut self, backlog: i32) -> Config {
        self.listen_backlog = backlog;
        self
    }

    pub fn race_backlog(mut self, backlog: i32) -> Config {
        self.race_backlog = backlog;
        self
    }

    pub fn link_timeout(mut self, timeout: Duration) -> Config {
        self.link_timeout = timeout;
        self
    }
}
