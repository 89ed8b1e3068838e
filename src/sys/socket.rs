use std::io;
use std::mem::{self, MaybeUninit};
use std::net::SocketAddrV4;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use crate::sys::net::{socket_addr, to_socket_addr};

/// A blocking IPv4 TCP socket.
///
/// The descriptor is closed when the value is dropped, on every path out of
/// the scope that owns it.
#[derive(Debug)]
pub struct Socket {
    fd: OwnedFd,
}

impl Socket {
    /// Create a new `AF_INET` stream socket.
    pub fn stream_v4() -> io::Result<Socket> {
        let fd = syscall!(socket(
            libc::AF_INET,
            libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
            libc::IPPROTO_TCP,
        ))?;
        // SAFETY: `socket(2)` ensures the fd is valid.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Socket { fd })
    }

    pub fn set_reuse_addr(&self, reuse: bool) -> io::Result<()> {
        self.set_flag(libc::SO_REUSEADDR, reuse)
    }

    pub fn set_reuse_port(&self, reuse: bool) -> io::Result<()> {
        self.set_flag(libc::SO_REUSEPORT, reuse)
    }

    fn set_flag(&self, opt: libc::c_int, val: bool) -> io::Result<()> {
        let val = libc::c_int::from(val);
        syscall!(setsockopt(
            self.fd.as_raw_fd(),
            libc::SOL_SOCKET,
            opt,
            &val as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        ))
        .map(|_| ())
    }

    pub fn bind(&self, addr: SocketAddrV4) -> io::Result<()> {
        let (raw_addr, raw_addr_length) = socket_addr(&addr);
        syscall!(bind(
            self.fd.as_raw_fd(),
            &raw_addr as *const libc::sockaddr_in as *const libc::sockaddr,
            raw_addr_length,
        ))
        .map(|_| ())
    }

    pub fn listen(&self, backlog: i32) -> io::Result<()> {
        syscall!(listen(self.fd.as_raw_fd(), backlog)).map(|_| ())
    }

    /// Blocking `connect(2)`, outside of any queue.
    pub fn connect(&self, addr: SocketAddrV4) -> io::Result<()> {
        let (raw_addr, raw_addr_length) = socket_addr(&addr);
        syscall!(connect(
            self.fd.as_raw_fd(),
            &raw_addr as *const libc::sockaddr_in as *const libc::sockaddr,
            raw_addr_length,
        ))
        .map(|_| ())
    }

    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        let mut storage = MaybeUninit::<libc::sockaddr_in>::zeroed();
        let mut length = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        syscall!(getsockname(
            self.fd.as_raw_fd(),
            storage.as_mut_ptr() as *mut libc::sockaddr,
            &mut length,
        ))?;
        // SAFETY: zeroed above and filled in by `getsockname(2)`.
        Ok(to_socket_addr(unsafe { &storage.assume_init() }))
    }

    /// Read and clear the pending socket error (`SO_ERROR`).
    ///
    /// Returns the raw positive errno, zero if there is none.
    pub fn take_error(&self) -> io::Result<i32> {
        let mut code: libc::c_int = 0;
        let mut length = mem::size_of::<libc::c_int>() as libc::socklen_t;
        syscall!(getsockopt(
            self.fd.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut code as *mut libc::c_int as *mut libc::c_void,
            &mut length,
        ))?;
        Ok(code)
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, TcpListener};

    use super::*;

    #[test]
    fn bind_listen_and_connect() {
        let listener = Socket::stream_v4().unwrap();
        listener.set_reuse_addr(true).unwrap();
        listener
            .bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
            .unwrap();
        listener.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(*addr.ip(), Ipv4Addr::LOCALHOST);
        assert_ne!(addr.port(), 0);

        let client = Socket::stream_v4().unwrap();
        client.connect(addr).unwrap();
        assert_eq!(client.take_error().unwrap(), 0);
    }

    #[test]
    fn connect_refused() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let client = Socket::stream_v4().unwrap();
        let err = client
            .connect(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
            .unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ECONNREFUSED));
    }
}
