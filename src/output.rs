//! Line-oriented output sink.
//!
//! Readings are printed from notification callbacks as well as from the
//! main task, so the writer sits behind a shared lock.

use std::fmt::Display;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Cloneable handle to the writer results are printed to.
#[derive(Clone)]
pub struct Output {
    writer: Arc<Mutex<dyn Write + Send>>,
}

impl Output {
    /// Wrap any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Print to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Write one line and flush it.
    pub fn line(&self, line: impl Display) -> Result<()> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    /// Write an empty line.
    pub fn blank(&self) -> Result<()> {
        self.line("")
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// In-memory writer whose contents can be read back after the fact.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Capture {
    pub(crate) fn output(&self) -> Output {
        Output::new(self.clone())
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
