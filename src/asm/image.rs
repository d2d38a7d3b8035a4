//! Program image file format.
//!
//! An image is plain text:
//! - One 16-bit word per line, in hex (an optional `0x` prefix is allowed)
//! - Anything after `;` is a comment
//! - Blank lines are ignored

use crate::alu::Word;
use crate::asm::disasm::disassemble_word;
use std::path::Path;
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFile {
    /// The program words, loaded from address 0.
    pub words: Vec<Word>,
}

impl ImageFile {
    /// Create an image from program words.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse image text.
    pub fn parse(text: &str) -> Result<Self, ImageError> {
        let mut words = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            let data = line.split(';').next().unwrap_or("").trim();
            if data.is_empty() {
                continue;
            }

            let digits = data
                .strip_prefix("0x")
                .or_else(|| data.strip_prefix("0X"))
                .unwrap_or(data);
            let word = Word::from_str_radix(digits, 16).map_err(|e| ImageError::ParseError {
                line: line_num + 1,
                message: format!("'{}': {}", data, e),
            })?;
            words.push(word);
        }

        Ok(Self { words })
    }

    /// Render as image text, annotating each word with its disassembly.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("; gate16 program image\n");
        out.push_str(&format!("; {} words\n\n", self.len()));
        for (addr, word) in self.words.iter().enumerate() {
            out.push_str(&format!("{:04X} ; {:03}: {}\n", word, addr, disassemble_word(*word)));
        }
        out
    }
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageFile, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    ImageFile::parse(&text)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &ImageFile) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), image.render())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur during image file operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image() {
        let text = "; header\n\n1005 ; MOV r0, 5\n0xC000\n  2003\n";
        let image = ImageFile::parse(text).unwrap();
        assert_eq!(image.words, vec![0x1005, 0xC000, 0x2003]);
    }

    #[test]
    fn test_parse_error_line() {
        let err = ImageFile::parse("1005\nXYZ\n").unwrap_err();
        assert!(matches!(err, ImageError::ParseError { line: 2, .. }));

        let err = ImageFile::parse("10000\n").unwrap_err();
        assert!(matches!(err, ImageError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_render_parses_back() {
        let image = ImageFile::new(vec![0x1005, 0x2003, 0xC000, 0xFFFF]);
        let text = image.render();
        assert!(text.contains("1005 ; 000: MOV r0, 5"));
        assert_eq!(ImageFile::parse(&text).unwrap(), image);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("gate16-image-{}.hex", std::process::id()));
        let image = ImageFile::new(vec![0xA002, 0xC000, 0xB000]);

        save_image(&path, &image).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, image);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_image("/nonexistent/gate16/program.hex"),
            Err(ImageError::IoError(_))
        ));
    }
}
