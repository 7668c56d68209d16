//! Reading ADVPL source files.
//!
//! Protheus sources are usually saved as Windows-1252, so content that is not
//! valid UTF-8 is decoded as Windows-1252 instead of being rejected. Every
//! byte has a mapping, so decoding itself never fails.

use encoding_rs::WINDOWS_1252;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Decode raw bytes as UTF-8, falling back to Windows-1252.
#[must_use]
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let bytes = e.into_bytes();
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
            text.into_owned()
        }
    }
}

/// Read a whole source file.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be read.
pub fn read_source(path: &Path) -> io::Result<String> {
    std::fs::read(path).map(decode)
}

/// Read at most `max_lines` lines from the start of a source file.
///
/// Line terminators are normalized to `\n`.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn read_head(path: &Path, max_lines: usize) -> io::Result<String> {
    let reader = BufReader::new(File::open(path)?);
    let mut head = String::new();
    for line in reader.split(b'\n').take(max_lines) {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        head.push_str(&decode(line));
        head.push('\n');
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_keeps_utf8() {
        assert_eq!(decode("Função".as_bytes().to_vec()), "Função");
    }

    #[test]
    fn decode_falls_back_to_windows_1252() {
        // "Função" in Windows-1252
        let bytes = vec![b'F', b'u', b'n', 0xE7, 0xE3, b'o'];
        assert_eq!(decode(bytes), "Função");
    }

    #[test]
    fn decode_maps_windows_1252_punctuation() {
        // 0x80 euro sign, 0x93/0x94 curly quotes, 0x96 en dash
        let bytes = vec![0x93, b'R', 0x80, b'1', 0x94, b' ', 0x96];
        assert_eq!(decode(bytes), "\u{201C}R\u{20AC}1\u{201D} \u{2013}");
    }

    #[test]
    fn read_head_stops_at_line_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.prw");
        std::fs::write(&path, "one\r\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(read_head(&path, 2).unwrap(), "one\ntwo\n");
        assert_eq!(read_head(&path, 200).unwrap(), "one\ntwo\nthree\nfour\n");
    }

    #[test]
    fn read_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(&dir.path().join("missing.prw")).is_err());
    }
}
