use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream as StdTcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;

use mio::net::TcpStream;
use tracing::debug;

/// A connected, non-blocking byte stream with a pollable fd.
///
/// Reads and writes must return `WouldBlock` instead of blocking.
pub trait Transport: Read + Write + AsRawFd {}

impl<T: Read + Write + AsRawFd> Transport for T {}

/// Connect to `addr` and prepare the socket for a [`Context`](crate::Context):
/// `TCP_NODELAY` on, non-blocking.
pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<TcpStream> {
    let stream = StdTcpStream::connect(addr)?;
    into_nonblocking(stream)
}

/// Like [`connect`], bounding the connect attempt by `timeout`.
///
/// Each resolved address is tried in turn; the last error is returned if
/// none accepts.
pub fn connect_timeout<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in addr.to_socket_addrs()? {
        match StdTcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return into_nonblocking(stream),
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "no addresses to connect to")
    }))
}

fn into_nonblocking(stream: StdTcpStream) -> io::Result<TcpStream> {
    stream.set_nodelay(true)?;
    stream.set_nonblocking(true)?;
    let peer: Option<SocketAddr> = stream.peer_addr().ok();
    debug!(?peer, "connected");
    Ok(TcpStream::from_std(stream))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn connect_yields_nonblocking_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut stream = connect(addr).unwrap();
        let (_peer, _) = listener.accept().unwrap();
        assert!(stream.nodelay().unwrap());

        let mut buf = [0u8; 8];
        let err = stream.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn connect_timeout_reports_refusal() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        assert!(connect_timeout(addr, Duration::from_millis(200)).is_err());
    }
}
