use nix::sys::signal::Signal;
use std::fmt;

/// The two termination requests the coordinator reacts to
///
/// Both kinds are handled identically; the kind is kept for logging and
/// for `ShutdownCoordinator::last_signal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    /// SIGINT (Ctrl+C in a terminal)
    Interrupt,
    /// SIGTERM (default `kill`, systemd and container runtimes)
    Terminate,
}

impl TerminationSignal {
    /// Raw signal numbers to subscribe to
    pub const RAW: [i32; 2] = [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM];

    /// Maps a raw signal number, `None` for anything but SIGINT/SIGTERM
    pub fn from_raw(raw: i32) -> Option<Self> {
        match Signal::try_from(raw).ok()? {
            Signal::SIGINT => Some(TerminationSignal::Interrupt),
            Signal::SIGTERM => Some(TerminationSignal::Terminate),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        Signal::from(self) as i32
    }
}

impl From<TerminationSignal> for Signal {
    fn from(signal: TerminationSignal) -> Self {
        match signal {
            TerminationSignal::Interrupt => Signal::SIGINT,
            TerminationSignal::Terminate => Signal::SIGTERM,
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Signal::from(*self).as_str())
    }
}
