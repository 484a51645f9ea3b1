use std::fmt;

const SPACE: u8 = b' ';
const ESCAPE: u8 = b'!';
const WRAP: i32 = 93;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CipherError {
    NoKey,
    EmptyKey,
    NonAscii(u8),
    DanglingEscape,
    Unencodable(u8),
}

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherError::NoKey => write!(f, "ciphered field before the key was read"),
            CipherError::EmptyKey => write!(f, "empty key"),
            CipherError::NonAscii(b) => write!(f, "non-ASCII byte {b:#04x} in ciphered field"),
            CipherError::DanglingEscape => write!(f, "escape marker at end of field"),
            CipherError::Unencodable(b) => write!(f, "byte {b:#04x} cannot be enciphered"),
        }
    }
}

impl std::error::Error for CipherError {}

/// Rolling-key substitution stream.
///
/// The cursor is shared by every field deciphered through the same stream and
/// advances once per input byte, escape markers included.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyStream {
    key: Vec<u8>,
    pos: usize,
}

impl KeyStream {
    pub fn new(key: &str) -> Result<Self, CipherError> {
        Self::with_cursor(key, 0)
    }

    pub fn with_cursor(key: &str, pos: usize) -> Result<Self, CipherError> {
        if key.is_empty() {
            return Err(CipherError::EmptyKey);
        }
        if let Some(&b) = key.as_bytes().iter().find(|b| !b.is_ascii()) {
            return Err(CipherError::NonAscii(b));
        }
        Ok(KeyStream {
            key: key.as_bytes().to_vec(),
            pos: pos % key.len(),
        })
    }

    pub fn key(&self) -> &str {
        // constructed from ASCII only
        std::str::from_utf8(&self.key).unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.pos
    }

    fn step(&mut self) -> u8 {
        let k = self.key[self.pos];
        self.pos += 1;
        if self.pos == self.key.len() {
            self.pos = 0;
        }
        k
    }

    fn shift(c: u8, k: u8) -> u8 {
        if c == SPACE {
            return SPACE;
        }
        let mut z = c as i32 - k as i32;
        if c < k {
            z += WRAP;
        }
        if z < 0x20 {
            z += WRAP;
        }
        z as u8
    }

    pub fn decipher(&mut self, field: &str) -> Result<String, CipherError> {
        let raw = field.as_bytes();
        let mut res = String::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            let c = raw[i];
            if !c.is_ascii() {
                return Err(CipherError::NonAscii(c));
            }
            let k = self.step();
            if c == ESCAPE {
                i += 1;
                let Some(&lit) = raw.get(i) else {
                    return Err(CipherError::DanglingEscape);
                };
                if !lit.is_ascii() {
                    return Err(CipherError::NonAscii(lit));
                }
                res.push(lit as char);
            } else {
                res.push(Self::shift(c, k) as char);
            }
            i += 1;
        }
        Ok(res)
    }

    /// Inverse of [`KeyStream::decipher`]: picks the first ciphertext byte in
    /// `'"'..='~'` that maps to each plaintext byte, escaping the rest.
    pub fn encipher(&mut self, text: &str) -> Result<String, CipherError> {
        let mut res = String::with_capacity(text.len());
        for &b in text.as_bytes() {
            if !b.is_ascii_graphic() {
                return Err(CipherError::Unencodable(b));
            }
            let k = self.step();
            match (b'"'..=b'~').find(|&c| Self::shift(c, k) == b) {
                Some(c) => res.push(c as char),
                None => {
                    res.push(ESCAPE as char);
                    res.push(b as char);
                }
            }
        }
        Ok(res)
    }
}
