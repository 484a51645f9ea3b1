use std::{error::Error, fs::File, io::Write, path::Path};

use serde::{Deserialize, Serialize};

use crate::bcc::BccCatalogs;
use crate::grammar::SchemaVariant;
use crate::grammar::arch::ArchitectureDescriptor;
use crate::grammar::models::{Model, Pack};
use crate::grammar::routing::{LegacyRouting, Routing};
use crate::grammar::timing::{Serdes, TimingLib};
use crate::session::Record;
use crate::tiles::{TileGrid, TileGridSchema};

/// Everything decoded from one `.db` file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChipDb {
    pub banner: Record,
    pub magic: String,
    pub key: String,
    pub variant: SchemaVariant,
    pub architectures: Vec<ArchitectureDescriptor>,
    pub routing: Routing,
    pub legacy_routing: Option<LegacyRouting>,
    pub models: Vec<Model>,
    pub names: Vec<Record>,
    pub constraints: Vec<Record>,
    pub pack: Pack,
    pub timing: TimingLib,
    pub serdes: Option<Serdes>,
    pub catalogs: BccCatalogs,
    pub grid: TileGrid,
    pub bel_types: Vec<Record>,
    pub trailer: Vec<Record>,
}

impl ChipDb {
    /// Name of the first architecture, as used for the database directory.
    pub fn arch_name(&self) -> Option<&str> {
        self.architectures.first().map(|a| a.name.as_str())
    }

    pub fn default_schema(&self) -> TileGridSchema {
        match self.variant {
            SchemaVariant::Legacy => TileGridSchema::Legacy,
            SchemaVariant::Current => TileGridSchema::Current,
        }
    }

    pub fn write_tilegrid<W: Write>(&self, mut w: W, schema: TileGridSchema) -> std::io::Result<()> {
        writeln!(w, "{}", self.grid.to_json(schema).pretty(4))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let f = File::open(path)?;
        let mut cf = zstd::stream::Decoder::new(f)?;
        let config = bincode::config::standard();
        Ok(bincode::serde::decode_from_std_read(&mut cf, config)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let f = File::create(path)?;
        self.write_to(f)
    }

    pub fn write_to<W: Write>(&self, w: W) -> Result<(), Box<dyn Error>> {
        let mut cf = zstd::stream::Encoder::new(w, 9)?;
        let config = bincode::config::standard();
        bincode::serde::encode_into_std_write(self, &mut cf, config)?;
        cf.finish()?;
        Ok(())
    }
}
