//! Linux specific parts: the io_uring backed queue and plain sockets.

mod net;
mod ring;
mod socket;

pub use self::ring::Ring;
pub use self::socket::Socket;
