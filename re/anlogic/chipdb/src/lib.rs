//! Decoder for the chip database (`.db`) files shipped with the Anlogic TD
//! toolchain.
//!
//! The file is a line-oriented sequence of count-framed sections. Selected
//! fields are obfuscated with a rolling-key substitution whose cursor runs
//! across the whole file, so every section has to be read in order.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub mod bcc;
pub mod db;
pub mod error;
pub mod grammar;
pub mod keystream;
pub mod publish;
pub mod resolve;
pub mod session;
pub mod tiles;
pub mod writer;

pub use db::ChipDb;
pub use error::{DecodeError, FormatViolation, Section, ViolationKind};
pub use session::Session;

/// Decodes one database, optionally mirroring the deciphered text to `dump`.
pub fn decode<'a>(
    input: Box<dyn BufRead + 'a>,
    dump: Option<Box<dyn Write + 'a>>,
) -> Result<ChipDb, DecodeError> {
    let mut session = Session::new(input);
    if let Some(dump) = dump {
        session = session.with_dump(dump);
    }
    let db = grammar::parse(&mut session)?;
    session.finish()?;
    Ok(db)
}

pub fn decode_file<'a>(
    path: &Path,
    dump: Option<Box<dyn Write + 'a>>,
) -> Result<ChipDb, DecodeError> {
    let f = File::open(path)?;
    decode(Box::new(BufReader::new(f)), dump)
}
