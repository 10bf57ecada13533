use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

/// Opens `input` for line-oriented reading. `stdin` reads the standard input,
/// and files ending in `.gz` are decompressed on the fly.
///
/// ```
/// use std::io::BufRead;
/// let reader = orfpick::reader("tests/orfpick/sample.scores").unwrap();
/// let lines: Vec<_> = reader.lines().collect();
/// assert_eq!(lines.len(), 7);
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Opens `output` for writing. `stdout` writes to the standard output.
pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

/// True when `path` is a regular file with at least one byte in it.
pub fn is_nonempty_file<P: AsRef<Path>>(path: P) -> bool {
    std::fs::metadata(path.as_ref())
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_reader_plain_and_gz() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("list.txt");
        std::fs::write(&plain, "a\nb\n").unwrap();
        let lines: Vec<String> = reader(plain.to_str().unwrap())
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["a", "b"]);

        let gz = dir.path().join("list.txt.gz");
        {
            let file = File::create(&gz).unwrap();
            let mut encoder = GzEncoder::new(file, flate2::Compression::default());
            writeln!(encoder, "c").unwrap();
            encoder.finish().unwrap();
        }
        let lines: Vec<String> = reader(gz.to_str().unwrap())
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["c"]);
    }

    #[test]
    fn test_reader_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(reader(missing.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_is_nonempty_file() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty");
        File::create(&empty).unwrap();
        assert!(!is_nonempty_file(&empty));
        assert!(!is_nonempty_file(dir.path()));

        let full = dir.path().join("full");
        std::fs::write(&full, "x").unwrap();
        assert!(is_nonempty_file(&full));
    }
}
