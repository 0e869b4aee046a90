// File appender with log trimming support
use crate::error::{DashboardError, Result};
use crate::utils::fs::ensure_dir;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as _};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "sirc.log";

/// Appends lines to `<log_dir>/sirc.log`, dropping the oldest lines once the
/// file would grow past `max_file_size`
pub struct FileAppender {
    log_dir: PathBuf,
    current_file: Option<File>,
    current_size: u64,
    max_file_size: u64,
}

fn write_line(file: &mut File, message: &str) -> Result<()> {
    file.write_all(message.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .and_then(|_| file.flush())
        .map_err(|e| DashboardError::Log(format!("Failed to write to log file: {}", e)))
}

impl FileAppender {
    pub fn new(log_dir: PathBuf, max_file_size: u64) -> Result<Self> {
        ensure_dir(&log_dir)?;
        let mut appender = Self {
            log_dir,
            current_file: None,
            current_size: 0,
            max_file_size,
        };
        appender.open_current_file()?;
        Ok(appender)
    }

    fn current_log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    fn open_current_file(&mut self) -> Result<()> {
        let log_path = self.current_log_path();
        self.current_size = std::fs::metadata(&log_path).map(|m| m.len()).unwrap_or(0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                DashboardError::Log(format!(
                    "Failed to open log file {}: {}",
                    log_path.display(),
                    e
                ))
            })?;
        self.current_file = Some(file);
        Ok(())
    }

    pub fn write_log(&mut self, message: &str) -> Result<()> {
        let message_len = message.len() as u64 + 1; // +1 for newline

        if self.current_size + message_len <= self.max_file_size {
            if let Some(file) = &mut self.current_file {
                write_line(file, message)?;
                self.current_size += message_len;
            }
            return Ok(());
        }

        self.current_file = None;
        let path = self.current_log_path();

        let reader = File::open(&path)
            .map(BufReader::new)
            .map_err(|e| {
                DashboardError::Log(format!("Failed to open log file for reading: {}", e))
            })?;
        let mut lines = VecDeque::new();
        for line in reader.lines() {
            let line = line.map_err(|e| {
                DashboardError::Log(format!("Failed to read line from log file: {}", e))
            })?;
            lines.push_back(line);
        }

        // Drop oldest lines until the new message fits
        let mut kept: u64 = lines.iter().map(|l| l.len() as u64 + 1).sum();
        while kept + message_len > self.max_file_size {
            match lines.pop_front() {
                Some(oldest) => kept -= oldest.len() as u64 + 1,
                None => break,
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| {
                DashboardError::Log(format!("Failed to open log file for truncation: {}", e))
            })?;
        for line in &lines {
            write_line(&mut file, line)?;
        }
        write_line(&mut file, message)?;

        self.current_size = kept + message_len;
        self.current_file = Some(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_oldest_lines_when_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut appender = FileAppender::new(dir.path().to_path_buf(), 20).unwrap();

        appender.write_log("first-line").unwrap(); // 11 bytes
        appender.write_log("second").unwrap(); // 7 bytes, 18 total
        appender.write_log("third").unwrap(); // would be 24, drops "first-line"

        let content = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(content, "second\nthird\n");
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOG_FILE_NAME), "old\n").unwrap();

        let mut appender = FileAppender::new(dir.path().to_path_buf(), 1024).unwrap();
        appender.write_log("new").unwrap();

        let content = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(content, "old\nnew\n");
    }
}
