use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Source of raw wire lines. Decouples the pipeline from the transport:
/// replayed vectors in tests, files in the binary, sockets one day.
pub trait Gateway: Send {
    /// The next raw line, undecoded. None once the source is exhausted.
    fn next_line(&mut self) -> Option<String>;
}

/// Replays a fixed set of lines. Backs tests and the built-in demo session.
pub struct ReplayGateway {
    lines: std::vec::IntoIter<String>,
}

impl ReplayGateway {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter(),
        }
    }

    pub fn from_static(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| l.to_string()).collect())
    }
}

impl Gateway for ReplayGateway {
    fn next_line(&mut self) -> Option<String> {
        self.lines.next()
    }
}

/// Streams a wire capture from disk, one message per line. Unreadable lines
/// are logged and skipped rather than ending the session.
pub struct FileGateway {
    lines: Lines<BufReader<File>>,
}

impl FileGateway {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

impl Gateway for FileGateway {
    fn next_line(&mut self) -> Option<String> {
        loop {
            match self.lines.next()? {
                Ok(line) => return Some(line),
                Err(e) => warn!("unreadable input line skipped: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replay_returns_lines_in_order() {
        let mut gateway = ReplayGateway::from_static(&["a", "b"]);
        assert_eq!(gateway.next_line().as_deref(), Some("a"));
        assert_eq!(gateway.next_line().as_deref(), Some("b"));
        assert_eq!(gateway.next_line(), None);
    }

    #[test]
    fn file_gateway_streams_a_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.fix");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "35=D|55=AAPL").unwrap();
        writeln!(file, "35=F|37=1").unwrap();

        let mut gateway = FileGateway::open(&path).unwrap();
        assert_eq!(gateway.next_line().as_deref(), Some("35=D|55=AAPL"));
        assert_eq!(gateway.next_line().as_deref(), Some("35=F|37=1"));
        assert_eq!(gateway.next_line(), None);
    }
}
