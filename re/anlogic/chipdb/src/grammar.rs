//! The `.db` grammar: a fixed sequence of count-framed sections, each read
//! by a function over the shared [`Session`].

use serde::{Deserialize, Serialize};

use crate::db::ChipDb;
use crate::error::{DecodeError, Section};
use crate::session::{Record, Session};

pub mod arch;
pub mod bcc;
pub mod bil;
pub mod models;
pub mod routing;
pub mod timing;

const LEGACY_KEY: &str = "ph1_100";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SchemaVariant {
    Legacy,
    Current,
}

impl SchemaVariant {
    pub fn from_key(key: &str) -> Self {
        if key == LEGACY_KEY {
            SchemaVariant::Legacy
        } else {
            SchemaVariant::Current
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub banner: Record,
    pub magic: String,
    pub key: String,
    pub variant: SchemaVariant,
    pub arch_names: Vec<Record>,
}

/// Reads the banner, the key line and the architecture name lines. Installs
/// the key on the session.
pub fn read_header(s: &mut Session) -> Result<Header, DecodeError> {
    s.enter(Section::Header);
    let banner = s.decode(&[])?;
    let line = s.decode(&[])?;
    let magic = s.field(&line, 0)?.to_string();
    let key = s.field(&line, 1)?.to_string();
    let count = s.count(&line, 2)?;
    s.set_key(&key)?;
    let variant = SchemaVariant::from_key(&key);
    let mut arch_names = vec![];
    for i in 0..count {
        s.record(i);
        arch_names.push(s.decode(&[0])?);
    }
    Ok(Header {
        banner,
        magic,
        key,
        variant,
        arch_names,
    })
}

/// Decodes a whole file.
pub fn parse(s: &mut Session) -> Result<ChipDb, DecodeError> {
    let header = read_header(s)?;
    log::debug!(
        "{} architecture(s), {:?} schema",
        header.arch_names.len(),
        header.variant
    );
    let mut architectures = vec![];
    s.enter(Section::Architecture);
    for (i, name) in header.arch_names.iter().enumerate() {
        s.record(i);
        architectures.push(arch::read_architecture(s, name)?);
    }
    let routing = routing::read_routing(s, header.variant)?;
    let legacy_routing = match header.variant {
        SchemaVariant::Legacy => Some(routing::read_legacy_routing(s)?),
        SchemaVariant::Current => None,
    };
    let models = models::read_models(s)?;
    let names = models::read_names(s)?;
    let constraints = models::read_constraints(s)?;
    let pack = models::read_pack(s)?;
    let timing = timing::read_timing_lib(s)?;
    let serdes = timing::read_serdes(s)?;
    let catalogs = bcc::read_bcc_info(s)?;
    let grid = bil::read_bil_info(s)?;
    let (bel_types, trailer) = bil::read_trailer(s, &grid)?;
    log::info!(
        "decoded {} lines: {} catalogs, {} bits, {}x{} grid, {} instances",
        s.line(),
        catalogs.len(),
        catalogs.iter().map(|(_, c)| c.entries.len()).sum::<usize>(),
        grid.max_col,
        grid.max_row,
        grid.instances.len()
    );
    Ok(ChipDb {
        banner: header.banner,
        magic: header.magic,
        key: header.key,
        variant: header.variant,
        architectures,
        routing,
        legacy_routing,
        models,
        names,
        constraints,
        pack,
        timing,
        serdes,
        catalogs,
        grid,
        bel_types,
        trailer,
    })
}
