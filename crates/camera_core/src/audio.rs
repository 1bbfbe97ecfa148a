use std::io::Write;

use anyhow::Result;

/// Best-effort shutter sound. Callers ignore failures.
pub trait AudioCue: Send + Sync {
    fn play_shutter(&self) -> Result<()>;
}

pub struct SilentAudioCue;

impl AudioCue for SilentAudioCue {
    fn play_shutter(&self) -> Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play_shutter(&self) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
