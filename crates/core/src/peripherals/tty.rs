use crate::EmuResult;
use std::any::Any;
use std::io::{self, Write};

/// Write-only console port.
///
/// Every byte stored anywhere in the port's window is appended to an
/// in-memory transcript, in write order. The transcript is the observable
/// output of a firmware run. Reads always return 0; the port has no receive
/// side.
#[derive(Debug, Default)]
pub struct Tty {
    transcript: Vec<u8>,
    echo: bool,
}

impl Tty {
    pub fn new() -> Self {
        Self::default()
    }

    /// A TTY that also mirrors each byte to the host's stdout.
    pub fn echoing() -> Self {
        Self {
            transcript: Vec::new(),
            echo: true,
        }
    }

    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.transcript)
    }
}

impl crate::Peripheral for Tty {
    fn read(&self, _offset: u64) -> EmuResult<u8> {
        Ok(0)
    }

    fn write(&mut self, _offset: u64, value: u8) -> EmuResult<()> {
        self.transcript.push(value);
        if self.echo {
            print!("{}", value as char);
            let _ = io::stdout().flush();
        }
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}
