use std::num::NonZeroU8;
use std::{fmt, ops};

/// Interest passed to a readiness watch.
///
/// Indicates which readiness the kernel should report for a descriptor. The
/// size of `Option<Interest>` is identical to `Interest` itself.
///
/// ```
/// use std::mem::size_of;
/// use uring_connect::Interest;
///
/// assert_eq!(size_of::<Option<Interest>>(), size_of::<Interest>());
/// ```
#[derive(Copy, PartialEq, Eq, Clone, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Interest(NonZeroU8);

// These must be unique.
const READABLE: u8 = 0b0_001;
const WRITABLE: u8 = 0b0_010;
const HUP: u8 = 0b0_100;
const ERROR: u8 = 0b1_000;

impl Interest {
    /// Returns a `Interest` set representing readable interest.
    pub const READABLE: Interest = Interest(unsafe { NonZeroU8::new_unchecked(READABLE) });

    /// Returns a `Interest` set representing writable interest.
    pub const WRITABLE: Interest = Interest(unsafe { NonZeroU8::new_unchecked(WRITABLE) });

    /// Returns a `Interest` set representing hangup interest.
    pub const HUP: Interest = Interest(unsafe { NonZeroU8::new_unchecked(HUP) });

    /// Returns a `Interest` set representing error interest.
    pub const ERROR: Interest = Interest(unsafe { NonZeroU8::new_unchecked(ERROR) });

    /// Add together two `Interest`.
    ///
    /// This does the same thing as the `BitOr` implementation, but is a
    /// constant function.
    ///
    /// ```
    /// use uring_connect::Interest;
    ///
    /// const CONNECTED: Interest = Interest::WRITABLE.add(Interest::HUP);
    /// assert!(CONNECTED.is_writable());
    /// assert!(!CONNECTED.is_error());
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub const fn add(self, other: Interest) -> Interest {
        Interest(unsafe { NonZeroU8::new_unchecked(self.0.get() | other.0.get()) })
    }

    /// Returns true if the value includes readable interest.
    pub const fn is_readable(self) -> bool {
        (self.0.get() & READABLE) != 0
    }

    /// Returns true if the value includes writable interest.
    pub const fn is_writable(self) -> bool {
        (self.0.get() & WRITABLE) != 0
    }

    /// Returns true if the value includes hangup interest.
    pub const fn is_hup(self) -> bool {
        (self.0.get() & HUP) != 0
    }

    /// Returns true if the value includes error interest.
    pub const fn is_error(self) -> bool {
        (self.0.get() & ERROR) != 0
    }

    /// The `poll(2)` event mask for this interest.
    pub const fn to_poll_mask(self) -> u32 {
        let mut mask = 0;
        if self.is_readable() {
            mask |= libc::POLLIN as u32;
        }
        if self.is_writable() {
            mask |= libc::POLLOUT as u32;
        }
        if self.is_hup() {
            mask |= libc::POLLHUP as u32;
        }
        if self.is_error() {
            mask |= libc::POLLERR as u32;
        }
        mask
    }
}

impl ops::BitOr for Interest {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        self.add(other)
    }
}

impl ops::BitOrAssign for Interest {
    #[inline]
    fn bitor_assign(&mut self, other: Self) {
        self.0 = (*self | other).0;
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut one = false;
        for (is, name) in [
            (self.is_readable(), "READABLE"),
            (self.is_writable(), "WRITABLE"),
            (self.is_hup(), "HUP"),
            (self.is_error(), "ERROR"),
        ] {
            if is {
                if one {
                    write!(fmt, " | ")?
                }
                write!(fmt, "{}", name)?;
                one = true
            }
        }
        Ok(())
    }
}

/// Readiness mask delivered by a completed readiness watch.
///
/// Wraps the raw `poll(2)` revents the kernel reports in the completion.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Readiness(u32);

impl Readiness {
    /// Wrap a raw revents mask.
    pub const fn from_raw(mask: u32) -> Readiness {
        Readiness(mask)
    }

    /// The raw revents mask.
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    pub const fn is_readable(self) -> bool {
        self.0 & libc::POLLIN as u32 != 0
    }

    pub const fn is_writable(self) -> bool {
        self.0 & libc::POLLOUT as u32 != 0
    }

    pub const fn is_hup(self) -> bool {
        self.0 & libc::POLLHUP as u32 != 0
    }

    pub const fn is_error(self) -> bool {
        self.0 & libc::POLLERR as u32 != 0
    }

    /// Returns true if any readiness in `interest` was reported.
    pub const fn intersects(self, interest: Interest) -> bool {
        self.0 & interest.to_poll_mask() != 0
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Readiness({:#x})", self.0)
    }
}
