#![cfg(target_os = "linux")]

// Kept as the only test in this binary so no other test opens descriptors
// while they are being counted.

use uring_connect::{Error, Runner};

mod util;
use util::{init_with_ring, open_fds, test_config};

#[test]
fn scenarios_close_their_descriptors() {
    let Some(ring) = init_with_ring() else {
        return;
    };
    let mut runner = Runner::new(ring, test_config());

    let before = open_fds();
    let supported = runner.no_peer().unwrap() == uring_connect::NoPeer::Refused;
    assert_eq!(open_fds(), before, "no peer scenario leaked a descriptor");
    if !supported {
        return;
    }

    runner.successful_connect().unwrap();
    assert_eq!(open_fds(), before, "connect scenario leaked a descriptor");

    runner.timeout_race().unwrap();
    assert_eq!(open_fds(), before, "timeout scenario leaked a descriptor");

    // Failure path: the port is taken by a listener that is not ours, so the
    // successful connect scenario fails while binding.
    let taken = std::net::TcpListener::bind(runner.config().address).unwrap();
    let before = open_fds();
    match runner.successful_connect() {
        Err(Error::Setup { op: "bind", .. }) => {}
        res => panic!("unexpected result: {:?}", res),
    }
    assert_eq!(open_fds(), before, "failed scenario leaked a descriptor");
    drop(taken);
}
