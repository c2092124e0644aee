//! Raw Ethernet socket.
//!
//! [`RawLink`] is a thin wrapper around a Linux `AF_PACKET` / `SOCK_RAW`
//! socket registered with tokio through [`AsyncFd`].  The socket is bound to
//! one interface and filtered by ether type in the kernel, so only test
//! frames are delivered.  All protocol logic lives elsewhere; this module
//! owns only byte I/O.
//!
//! Opening the socket needs `CAP_NET_RAW`.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tokio::io::unix::AsyncFd;

use crate::frame::MAX_FRAME_LEN;
use crate::link::{Link, LinkError};

/// A raw link-layer socket bound to a single interface.
///
/// The descriptor is closed when the value is dropped.
#[derive(Debug)]
pub struct RawLink {
    /// Interface this socket is bound to.
    pub ifname: String,
    inner: AsyncFd<OwnedFd>,
}

impl RawLink {
    /// Open a raw socket on `ifname` receiving only frames of `ether_type`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(ifname: &str, ether_type: u16) -> Result<Self, LinkError> {
        let open_err = |source: io::Error| LinkError::Open {
            ifname: ifname.to_string(),
            source,
        };

        let c_name =
            CString::new(ifname).map_err(|_| LinkError::UnknownInterface(ifname.to_string()))?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
        let ifindex = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if ifindex == 0 {
            return Err(LinkError::UnknownInterface(ifname.to_string()));
        }

        let protocol = ether_type.to_be();

        // SAFETY: plain socket(2) call; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                libc::c_int::from(protocol),
            )
        };
        if raw < 0 {
            return Err(open_err(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: sockaddr_ll is plain old data; all-zero is a valid value.
        let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::c_ushort;
        addr.sll_protocol = protocol;
        addr.sll_ifindex = ifindex as libc::c_int;

        // SAFETY: `addr` outlives the call and the length matches its type.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_ll).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(open_err(io::Error::last_os_error()));
        }

        let inner = AsyncFd::new(fd).map_err(open_err)?;
        log::debug!("raw socket bound to {ifname} (ifindex {ifindex}, type {ether_type:#06x})");
        Ok(Self {
            ifname: ifname.to_string(),
            inner,
        })
    }
}

impl Link for RawLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        loop {
            let mut guard = self.inner.writable().await?;
            let result = guard.try_io(|fd| {
                // SAFETY: `frame` is a valid readable buffer of `frame.len()` bytes.
                let n = unsafe {
                    libc::send(fd.as_raw_fd(), frame.as_ptr().cast(), frame.len(), 0)
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });

            match result {
                Ok(Ok(written)) if written == frame.len() => return Ok(()),
                Ok(Ok(written)) => {
                    return Err(LinkError::ShortWrite {
                        written,
                        expected: frame.len(),
                    })
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0u8; MAX_FRAME_LEN];
        loop {
            let mut guard = self.inner.readable().await?;
            let result = guard.try_io(|fd| {
                // SAFETY: `buf` is a valid writable buffer of `buf.len()` bytes.
                let n = unsafe {
                    libc::recv(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len(), 0)
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });

            match result {
                Ok(Ok(n)) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }
}
