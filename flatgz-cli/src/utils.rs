//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Suffix added on compression and removed on decompression.
pub const GZ_SUFFIX: &str = "gz";

/// Result type for command handlers.
pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Create a byte progress bar, or a spinner when the total is unknown.
pub fn create_progress_bar(len: Option<u64>, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            let style = ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )
            .map(|style| style.progress_chars("█▓▒░ "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {bytes} read {msg}") {
                pb.set_style(style);
            }
            pb
        }
    }
}

/// Open `path` for buffered reading, or stdin when `None`.
pub fn open_input(path: Option<&Path>) -> CmdResult<Box<dyn Read>> {
    match path {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(BufReader::new(io::stdin().lock()))),
    }
}

/// Create `path` for buffered writing, or stdout when `None`.
pub fn open_output(path: Option<&Path>) -> CmdResult<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// `notes.txt` -> `notes.txt.gz`.
pub fn compressed_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(GZ_SUFFIX);
    PathBuf::from(name)
}

/// `notes.txt.gz` -> `notes.txt`; `None` without a `.gz` suffix.
pub fn decompressed_name(input: &Path) -> Option<PathBuf> {
    match input.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(GZ_SUFFIX) => {
            let stem = input.file_stem()?;
            Some(input.with_file_name(stem))
        }
        _ => None,
    }
}

/// Human-readable operating system name for the header OS byte.
pub fn os_name(os: u8) -> &'static str {
    match os {
        0 => "FAT",
        1 => "Amiga",
        2 => "VMS",
        3 => "Unix",
        4 => "VM/CMS",
        5 => "Atari TOS",
        6 => "HPFS",
        7 => "Macintosh",
        8 => "Z-System",
        9 => "CP/M",
        10 => "TOPS-20",
        11 => "NTFS",
        12 => "QDOS",
        13 => "Acorn RISCOS",
        255 => "unknown",
        _ => "undefined",
    }
}

/// Space saved, in percent of the uncompressed size.
pub fn savings_percent(uncompressed: u64, compressed: u64) -> f64 {
    if uncompressed == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / uncompressed as f64) * 100.0
}

/// Reader that counts the bytes pulled through it.
pub struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Writer that counts the bytes pushed through it.
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(
            compressed_name(Path::new("dir/notes.txt")),
            PathBuf::from("dir/notes.txt.gz")
        );
        assert_eq!(
            decompressed_name(Path::new("dir/notes.txt.gz")),
            Some(PathBuf::from("dir/notes.txt"))
        );
        assert_eq!(
            decompressed_name(Path::new("ARCHIVE.GZ")),
            Some(PathBuf::from("ARCHIVE"))
        );
        assert_eq!(decompressed_name(Path::new("notes.txt")), None);
        assert_eq!(decompressed_name(Path::new(".gz")), None);
    }

    #[test]
    fn test_counters() {
        let mut reader = CountingReader::new(&b"twelve bytes"[..]);
        let mut writer = CountingWriter::new(Vec::new());
        io::copy(&mut reader, &mut writer).unwrap();
        assert_eq!(reader.count(), 12);
        assert_eq!(writer.count(), 12);
    }

    #[test]
    fn test_savings() {
        assert_eq!(savings_percent(0, 20), 0.0);
        assert_eq!(savings_percent(200, 50), 75.0);
        assert_eq!(os_name(3), "Unix");
    }
}
