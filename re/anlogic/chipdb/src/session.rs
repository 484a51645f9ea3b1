use std::io::{BufRead, Lines, Write};
use std::iter::Peekable;
use std::str::FromStr;

use crate::error::{DecodeError, FormatViolation, Section, ViolationKind};
use crate::keystream::{CipherError, KeyStream};

/// One line's whitespace-separated fields, after selective deciphering.
pub type Record = Vec<String>;

/// Decode state for a single `.db` file: the line source, the shared key
/// stream and the optional plaintext dump.
pub struct Session<'a> {
    lines: Peekable<Lines<Box<dyn BufRead + 'a>>>,
    line: usize,
    keys: Option<KeyStream>,
    dump: Option<Box<dyn Write + 'a>>,
    section: Section,
    record: usize,
}

enum Peeked {
    Eof,
    Empty(bool),
    Error,
}

impl<'a> Session<'a> {
    pub fn new(input: Box<dyn BufRead + 'a>) -> Self {
        Session {
            lines: input.lines().peekable(),
            line: 0,
            keys: None,
            dump: None,
            section: Section::Header,
            record: 0,
        }
    }

    pub fn from_text(text: &'a str) -> Self {
        Self::new(Box::new(text.as_bytes()))
    }

    pub fn with_dump(mut self, dump: Box<dyn Write + 'a>) -> Self {
        self.dump = Some(dump);
        self
    }

    pub fn set_key(&mut self, key: &str) -> Result<(), DecodeError> {
        let keys = KeyStream::new(key).map_err(|e| self.violation(ViolationKind::Cipher(e)))?;
        self.keys = Some(keys);
        Ok(())
    }

    pub fn set_keystream(&mut self, keys: KeyStream) {
        self.keys = Some(keys);
    }

    pub fn cursor(&self) -> Option<usize> {
        self.keys.as_ref().map(|k| k.cursor())
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn enter(&mut self, section: Section) {
        log::debug!("{section} at line {}", self.line + 1);
        self.section = section;
        self.record = 0;
    }

    pub fn record(&mut self, record: usize) {
        self.record = record;
    }

    pub fn violation(&self, kind: ViolationKind) -> DecodeError {
        DecodeError::Format(FormatViolation {
            kind,
            section: self.section,
            record: self.record,
            line: self.line,
        })
    }

    fn next_line(&mut self) -> Result<String, DecodeError> {
        match self.lines.next() {
            None => {
                self.line += 1;
                Err(self.violation(ViolationKind::UnexpectedEof))
            }
            Some(l) => {
                self.line += 1;
                Ok(l?)
            }
        }
    }

    fn decipher(&mut self, raw: &str) -> Result<String, DecodeError> {
        let res = match self.keys.as_mut() {
            Some(keys) => keys.decipher(raw),
            None => Err(CipherError::NoKey),
        };
        res.map_err(|e| self.violation(ViolationKind::Cipher(e)))
    }

    fn read_fields(&mut self) -> Result<Record, DecodeError> {
        let l = self.next_line()?;
        Ok(l.split_whitespace().map(String::from).collect())
    }

    fn emit(&mut self, fields: &Record) -> Result<(), DecodeError> {
        if let Some(dump) = self.dump.as_mut() {
            writeln!(dump, "{}", fields.join(" "))?;
        }
        Ok(())
    }

    /// Reads the next line, deciphering the fields at `ids` in the order given.
    pub fn decode(&mut self, ids: &[usize]) -> Result<Record, DecodeError> {
        let mut fields = self.read_fields()?;
        for &i in ids {
            let Some(raw) = fields.get(i) else {
                return Err(self.violation(ViolationKind::MissingField {
                    index: i,
                    len: fields.len(),
                }));
            };
            fields[i] = self.decipher(raw)?;
        }
        self.emit(&fields)?;
        Ok(fields)
    }

    /// Reads the next line, deciphering every field except the ones at `ids`.
    pub fn decode_skip(&mut self, ids: &[usize]) -> Result<Record, DecodeError> {
        let mut fields = self.read_fields()?;
        for i in 0..fields.len() {
            if !ids.contains(&i) {
                fields[i] = self.decipher(&fields[i])?;
            }
        }
        self.emit(&fields)?;
        Ok(fields)
    }

    pub fn expect_empty(&mut self) -> Result<(), DecodeError> {
        let fields = self.decode(&[])?;
        if !fields.is_empty() {
            return Err(self.violation(ViolationKind::NotEmpty {
                fields: fields.len(),
            }));
        }
        Ok(())
    }

    /// Checks whether the next raw line has no fields, without consuming it.
    pub fn peek_is_empty(&mut self) -> Result<bool, DecodeError> {
        let peeked = match self.lines.peek() {
            None => Peeked::Eof,
            Some(Ok(l)) => Peeked::Empty(l.split_whitespace().next().is_none()),
            Some(Err(_)) => Peeked::Error,
        };
        match peeked {
            Peeked::Empty(empty) => Ok(empty),
            Peeked::Eof => Err(DecodeError::Format(FormatViolation {
                kind: ViolationKind::UnexpectedEof,
                section: self.section,
                record: self.record,
                line: self.line + 1,
            })),
            Peeked::Error => {
                self.next_line()?;
                Ok(false)
            }
        }
    }

    pub fn field<'r>(&self, rec: &'r Record, index: usize) -> Result<&'r str, DecodeError> {
        rec.get(index).map(String::as_str).ok_or_else(|| {
            self.violation(ViolationKind::MissingField {
                index,
                len: rec.len(),
            })
        })
    }

    pub fn number<T: FromStr>(&self, rec: &Record, index: usize) -> Result<T, DecodeError> {
        let value = self.field(rec, index)?;
        value.parse().map_err(|_| {
            self.violation(ViolationKind::BadNumber {
                index,
                value: value.to_string(),
            })
        })
    }

    pub fn count(&self, rec: &Record, index: usize) -> Result<usize, DecodeError> {
        self.number(rec, index)
    }

    pub fn expect_tag(&self, rec: &Record, tag: &'static str) -> Result<(), DecodeError> {
        let found = rec.first().map(String::as_str).unwrap_or("");
        if found != tag {
            return Err(self.violation(ViolationKind::TagMismatch {
                expected: tag,
                found: found.to_string(),
            }));
        }
        Ok(())
    }

    pub fn expect_zero(&self, rec: &Record, index: usize) -> Result<(), DecodeError> {
        let value: i64 = self.number(rec, index)?;
        if value != 0 {
            return Err(self.violation(ViolationKind::NotZero {
                index,
                value: rec[index].clone(),
            }));
        }
        Ok(())
    }

    pub fn expect_len(&self, rec: &Record, len: usize) -> Result<(), DecodeError> {
        if rec.len() != len {
            return Err(self.violation(ViolationKind::CountMismatch {
                expected: len,
                found: rec.len(),
            }));
        }
        Ok(())
    }

    /// Reads a count line followed by that many lines deciphered at `ids`.
    pub fn counted_list(&mut self, ids: &[usize]) -> Result<Vec<Record>, DecodeError> {
        let head = self.decode(&[])?;
        let n = self.count(&head, 0)?;
        (0..n).map(|_| self.decode(ids)).collect()
    }

    pub fn finish(mut self) -> Result<(), DecodeError> {
        if let Some(dump) = self.dump.as_mut() {
            dump.flush()?;
        }
        Ok(())
    }
}
