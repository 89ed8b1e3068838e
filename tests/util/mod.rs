// Not all functions are used by all tests.
#![allow(dead_code)]

use std::fs;
use std::net::{SocketAddrV4, TcpListener};
use std::sync::Once;

use log::warn;
use uring_connect::{Config, Error, NoPeer, Ring, Runner};

pub fn init() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        env_logger::try_init().expect("unable to initialise logger");
    })
}

/// Create a ring, or `None` if the kernel refuses to give us one (no
/// io_uring support, or it is disabled by policy).
pub fn init_with_ring() -> Option<Ring> {
    init();

    match Ring::new(Config::default().queue_entries) {
        Ok(ring) => Some(ring),
        Err(Error::QueueInit(err)) => {
            warn!("io_uring unavailable, skipping: {}", err);
            None
        }
        Err(err) => panic!("unexpected error creating ring: {}", err),
    }
}

/// A runner on a real ring targeting a port nothing listens on. `None` if
/// either io_uring or its asynchronous connect is unavailable.
pub fn supported_runner() -> Option<Runner<Ring>> {
    let ring = init_with_ring()?;
    let mut runner = Runner::new(ring, test_config());
    match runner.no_peer().expect("no peer scenario failed") {
        NoPeer::Refused => Some(runner),
        NoPeer::Unsupported => {
            warn!("no async connect support, skipping");
            None
        }
    }
}

pub fn test_config() -> Config {
    Config::default().port(free_port())
}

/// Find an available port by binding to :0.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn local_address(port: u16) -> SocketAddrV4 {
    SocketAddrV4::new([127, 0, 0, 1].into(), port)
}

/// Number of descriptors open in this process.
pub fn open_fds() -> usize {
    fs::read_dir("/proc/self/fd")
        .expect("unable to read /proc/self/fd")
        .count()
}
