//! System clipboard for the `copy` affordance.
//!
//! Backends, in order:
//! 1. Native clipboard (`arboard`), which needs a display server
//! 2. OSC 52 escape written to the terminal, which also works over SSH
//!
//! Terminals that don't support OSC 52 silently ignore the sequence, so a
//! successful fallback write is not a guarantee.

use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};

use crate::core::dispatch::{Clipboard, ClipboardError};

pub struct SystemClipboard<W: Write> {
    /// `None` when no display server was reachable at startup.
    native: Option<arboard::Clipboard>,
    osc52: W,
}

impl Default for SystemClipboard<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClipboard<io::Stdout> {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                info!("Native clipboard unavailable, using OSC 52: {}", e);
                None
            }
        };
        Self {
            native,
            osc52: io::stdout(),
        }
    }
}

impl<W: Write> SystemClipboard<W> {
    /// A clipboard that only ever writes OSC 52 to `out`.
    pub fn osc52_only(out: W) -> Self {
        Self { native: None, osc52: out }
    }

    fn write_osc52(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.osc52
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|()| self.osc52.flush())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

impl<W: Write> Clipboard for SystemClipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if let Some(native) = self.native.as_mut() {
            match native.set_text(text) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Native clipboard write failed, falling back to OSC 52: {}", e),
            }
        }
        self.write_osc52(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sequence_encodes_payload() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn test_without_native_clipboard_falls_back_to_osc52() {
        let mut clipboard = SystemClipboard::osc52_only(Vec::new());
        clipboard.write_text("SKU 1234").unwrap();
        assert_eq!(clipboard.osc52, osc52_sequence("SKU 1234").into_bytes());
    }

    #[test]
    fn test_fallback_failure_is_reported() {
        let mut clipboard = SystemClipboard::osc52_only(BrokenPipe);
        let err = clipboard.write_text("x").unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
