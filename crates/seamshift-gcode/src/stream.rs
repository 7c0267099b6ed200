//! Line streams and in-place file replacement
//!
//! Lines are read as raw bytes with their terminators so untouched lines can
//! be written back byte for byte, including `\r\n` endings, a missing final
//! newline and comments that are not valid UTF-8.

use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use seamshift_core::{Error, Result};
use tempfile::NamedTempFile;

/// Buffer size for reading and writing G-code files (256 KB)
const IO_BUFFER_SIZE: usize = 256 * 1024;

/// Iterator over the raw lines of a reader, terminators included
///
/// Lines are yielded as bytes. G-code words are ASCII, but slicers copy
/// user text (printer names, filament notes) into comments in whatever
/// encoding it was entered.
pub struct LineReader<R> {
    reader: R,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Replace the file at `path` with whatever `write` produces
///
/// Output goes to a temporary file in the same directory, which is renamed
/// over `path` only after `write` succeeded and everything was flushed. If
/// `write` fails the temporary file is removed and `path` is left untouched.
/// The original file's permissions are carried over.
///
/// # Errors
/// Returns the error from `write`, or an I/O error from creating, flushing
/// or renaming the temporary file.
pub fn write_atomically<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path)?.permissions();

    let temp = NamedTempFile::new_in(dir)?;
    tracing::debug!(temp = %temp.path().display(), "writing output to temporary file");

    let value = {
        let mut writer = BufWriter::with_capacity(IO_BUFFER_SIZE, temp.as_file());
        let value = write(&mut writer)?;
        writer.flush()?;
        value
    };
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!(path = %path.display(), "replaced original file");
    Ok(value)
}

/// Open `path` for buffered line reading
pub fn open_lines(path: &Path) -> Result<LineReader<io::BufReader<fs::File>>> {
    let file = fs::File::open(path)?;
    Ok(LineReader::new(io::BufReader::with_capacity(
        IO_BUFFER_SIZE,
        file,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_line_reader_keeps_terminators() {
        let reader = LineReader::new(Cursor::new("G1 X1\r\nG1 X2\nM84"));
        let lines: Vec<Vec<u8>> = reader.map(|l| l.unwrap()).collect();
        assert_eq!(
            lines,
            vec![b"G1 X1\r\n".to_vec(), b"G1 X2\n".to_vec(), b"M84".to_vec()]
        );
    }

    #[test]
    fn test_line_reader_accepts_non_utf8() {
        let input: &[u8] = b"; printer: caf\xE9\nG1 X1\n";
        let lines: Vec<Vec<u8>> = LineReader::new(input).map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], b"; printer: caf\xE9\n");
    }

    #[test]
    fn test_write_atomically_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        fs::write(&path, "old\n").unwrap();

        let written = write_atomically(&path, |out| {
            out.write_all(b"new\n")?;
            Ok(4usize)
        })
        .unwrap();

        assert_eq!(written, 4);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomically_keeps_original_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        fs::write(&path, "old\n").unwrap();

        let result: Result<()> = write_atomically(&path, |out| {
            out.write_all(b"partial")?;
            Err(Error::other("boom"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomically_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.gcode");
        let result = write_atomically(&path, |_| Ok(()));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
