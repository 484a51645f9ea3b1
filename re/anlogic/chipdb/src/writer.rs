use crate::keystream::{CipherError, KeyStream};

/// Builds `.db` text line by line, enciphering the chosen fields with the same
/// rolling cursor a [`crate::session::Session`] uses to read them back.
#[derive(Debug, Default)]
pub struct CipherWriter {
    out: String,
    keys: Option<KeyStream>,
}

impl CipherWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: &str) -> Result<Self, CipherError> {
        Ok(CipherWriter {
            out: String::new(),
            keys: Some(KeyStream::new(key)?),
        })
    }

    pub fn set_key(&mut self, key: &str) -> Result<(), CipherError> {
        self.keys = Some(KeyStream::new(key)?);
        Ok(())
    }

    pub fn set_keystream(&mut self, keys: KeyStream) {
        self.keys = Some(keys);
    }

    pub fn cursor(&self) -> Option<usize> {
        self.keys.as_ref().map(|k| k.cursor())
    }

    fn encipher(&mut self, text: &str) -> Result<String, CipherError> {
        self.keys.as_mut().ok_or(CipherError::NoKey)?.encipher(text)
    }

    fn push(&mut self, fields: &[String]) {
        self.out.push_str(&fields.join(" "));
        self.out.push('\n');
    }

    /// Emits one line with the fields at `ids` enciphered, in that order.
    /// Indices past the end of `fields` are ignored.
    pub fn line(&mut self, fields: &[&str], ids: &[usize]) -> Result<(), CipherError> {
        let mut fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        for &i in ids {
            if i < fields.len() {
                fields[i] = self.encipher(&fields[i])?;
            }
        }
        self.push(&fields);
        Ok(())
    }

    /// Emits one line with every field enciphered except the ones at `ids`.
    pub fn line_skip(&mut self, fields: &[&str], ids: &[usize]) -> Result<(), CipherError> {
        let mut fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        for i in 0..fields.len() {
            if !ids.contains(&i) {
                fields[i] = self.encipher(&fields[i])?;
            }
        }
        self.push(&fields);
        Ok(())
    }

    /// Emits a line without touching the cursor.
    pub fn plain(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self.out.push('\n');
        self
    }

    pub fn empty(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}
