//! Flat binary images: 16-bit little endian words, no header.

use std::fs;
use std::io;
use std::path::Path;

use crate::fault::Fault;
use crate::word::Word;

/// Splits `bytes` into little endian words. The words are not range checked.
pub fn decode(bytes: &[u8]) -> Result<Vec<Word>, Fault> {
    if bytes.len() % 2 != 0 {
        return Err(Fault::TruncatedImage { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn encode(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Reads the image at `path`
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<Word>> {
    let bytes = fs::read(path)?;
    decode(&bytes).map_err(|fault| io::Error::new(io::ErrorKind::InvalidData, fault))
}

/// Writes `words` as an image to `path`
pub fn write_file<P: AsRef<Path>>(path: P, words: &[Word]) -> io::Result<()> {
    fs::write(path, encode(words))
}
