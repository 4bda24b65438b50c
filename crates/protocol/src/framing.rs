//! Syslog priority framing
//!
//! Carves `<PRI>`-delimited syslog messages out of raw bytes. The framer is
//! an explicit state machine fed arbitrary chunks, so the same logic serves
//! the buffered TCP path (many small feeds, frames spanning chunk
//! boundaries) and the UDP path (one feed per datagram). Framing is
//! chunk-boundary invariant: splitting an input at any point yields the same
//! message sequence as feeding it whole.
//!
//! # Framing rules
//!
//! - A message starts at `<`, the priority field runs to the matching `>`,
//!   and the message body runs until the `<` that opens the next frame.
//! - Input before the first `<` is discarded.
//! - At end of input, a partially received message body is emitted as a
//!   final message (partial frame at EOF is valid, not an error).
//! - With priority validation enabled (UDP), a `<...>` whose interior is not
//!   a run of ASCII digits is not a frame boundary: the machine resets and
//!   keeps scanning, so a stray `<x>` inside free-form payload cannot
//!   corrupt framing.
//! - With priority stripping enabled, emitted messages exclude the `<NNN>`
//!   prefix.
//!
//! Emitted messages are raw - trimming and empty-drop happen in the
//! listeners, which treat every frame the same way (see
//! [`trim_frame`](crate::trim_frame)).

/// Scanner state for syslog priority framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Looking for the `<` that opens a frame
    Empty,
    /// Inside the `<NNN>` priority field, looking for `>`
    InPriority,
    /// Inside the message body, looking for the next frame's `<`
    InMessage,
}

/// Incremental syslog frame decoder
///
/// Feed it byte chunks with [`feed`](Self::feed), collect completed messages,
/// and call [`finish`](Self::finish) at end of input for the trailing
/// partial frame.
///
/// # Example
///
/// ```
/// use relay_protocol::SyslogFramer;
///
/// let mut framer = SyslogFramer::new(true, false);
/// let msgs = framer.feed(b"<34>host app: hello<35>host app: world");
/// assert_eq!(msgs, vec![b"host app: hello".to_vec()]);
/// assert_eq!(framer.finish(), Some(b"host app: world".to_vec()));
/// ```
#[derive(Debug)]
pub struct SyslogFramer {
    /// Unconsumed bytes; always begins at (or before) the current frame
    buf: Vec<u8>,
    /// Next unscanned index into `buf`
    pos: usize,
    state: FramerState,
    /// Index in `buf` where the pending message body begins
    msg_start: usize,
    /// Index of the `<` that opened the pending frame
    prio_start: usize,
    strip_priority: bool,
    validate_priority: bool,
}

impl SyslogFramer {
    /// Create a framer
    ///
    /// `strip_priority` drops the `<NNN>` prefix from emitted messages.
    /// `validate_priority` requires the priority interior to be ASCII digits
    /// before treating `<...>` as a frame boundary (the UDP decoders enable
    /// this; the TCP decoders do not).
    pub fn new(strip_priority: bool, validate_priority: bool) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            state: FramerState::Empty,
            msg_start: 0,
            prio_start: 0,
            strip_priority,
            validate_priority,
        }
    }

    /// Current scanner state
    #[inline]
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Feed a chunk of input, returning every message completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);

        let mut completed = Vec::new();
        let mut i = self.pos;

        while i < self.buf.len() {
            match self.state {
                FramerState::Empty => {
                    if self.buf[i] == b'<' {
                        self.msg_start = i;
                        self.prio_start = i;
                        self.state = FramerState::InPriority;
                    }
                }
                FramerState::InPriority => {
                    if self.buf[i] == b'>' {
                        if self.validate_priority
                            && !is_valid_priority(&self.buf[self.prio_start + 1..i])
                        {
                            // Not a real frame boundary; resume scanning for
                            // the next `<` from here.
                            self.state = FramerState::Empty;
                        } else {
                            self.state = FramerState::InMessage;
                            if self.strip_priority {
                                self.msg_start = i + 1;
                            }
                        }
                    }
                }
                FramerState::InMessage => {
                    if self.buf[i] == b'<' {
                        completed.push(self.buf[self.msg_start..i].to_vec());
                        self.msg_start = i;
                        self.prio_start = i;
                        self.state = FramerState::InPriority;
                    }
                }
            }
            i += 1;
        }

        self.compact();
        completed
    }

    /// End of input: emit the trailing partial message, if any
    ///
    /// Only a frame whose body has started is emitted; a dangling `<NN`
    /// priority or scanned-over garbage yields `None`. The framer resets to
    /// its initial state, so the UDP decoders reuse one framer across
    /// datagrams (feed, finish, repeat).
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let last = if self.state == FramerState::InMessage && self.msg_start < self.buf.len() {
            Some(self.buf[self.msg_start..].to_vec())
        } else {
            None
        };

        self.buf.clear();
        self.pos = 0;
        self.msg_start = 0;
        self.prio_start = 0;
        self.state = FramerState::Empty;
        last
    }

    /// Drop scanned bytes that can no longer be part of an emitted message
    fn compact(&mut self) {
        let keep_from = match self.state {
            // Everything scanned so far was inter-frame garbage.
            FramerState::Empty => self.buf.len(),
            // The priority field must stay buffered for validation.
            FramerState::InPriority => self.prio_start,
            FramerState::InMessage => self.msg_start,
        };

        if keep_from > 0 {
            self.buf.drain(..keep_from);
            self.msg_start = self.msg_start.saturating_sub(keep_from);
            self.prio_start = self.prio_start.saturating_sub(keep_from);
        }
        self.pos = self.buf.len();
    }
}

/// A priority field is a non-empty run of ASCII digits (a non-negative
/// integer)
#[inline]
fn is_valid_priority(interior: &[u8]) -> bool {
    !interior.is_empty() && interior.iter().all(|b| b.is_ascii_digit())
}

/// Split a datagram into trimmed, non-empty candidate lines
///
/// Raw-line UDP semantics: split on `\n`, trim each piece of surrounding
/// whitespace/control bytes, and drop pieces that trim to nothing.
pub fn split_lines(datagram: &[u8]) -> Vec<&[u8]> {
    datagram
        .split(|&b| b == b'\n')
        .map(crate::trim_frame)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "framing_test.rs"]
mod framing_test;
