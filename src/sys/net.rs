use std::net::{Ipv4Addr, SocketAddrV4};

/// Converts a Rust `SocketAddrV4` into the system representation.
pub(crate) fn socket_addr(addr: &SocketAddrV4) -> (libc::sockaddr_in, libc::socklen_t) {
    // `s_addr` is stored as BE on all machine and the array is in BE order.
    // So the native endian conversion method is used so that it's never swapped.
    let sin_addr = libc::in_addr {
        s_addr: u32::from_ne_bytes(addr.ip().octets()),
    };

    let sockaddr_in = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: addr.port().to_be(),
        sin_addr,
        sin_zero: [0; 8],
    };

    let socklen = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
    (sockaddr_in, socklen)
}

/// Converts the system representation back into a `SocketAddrV4`.
pub(crate) fn to_socket_addr(storage: &libc::sockaddr_in) -> SocketAddrV4 {
    let ip = Ipv4Addr::from(storage.sin_addr.s_addr.to_ne_bytes());
    SocketAddrV4::new(ip, u16::from_be(storage.sin_port))
}
