use serde::{Deserialize, Serialize};

use super::SchemaVariant;
use crate::error::{DecodeError, Section, ViolationKind};
use crate::session::{Record, Session};

const FIXED_REGIONS: usize = 16;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct WireRegion {
    pub header: Record,
    pub entries: Vec<Record>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IndexedRegion {
    pub index: Record,
    pub region: WireRegion,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    pub counts: Record,
    pub leading: Vec<WireRegion>,
    pub fixed: Vec<WireRegion>,
    pub indexed: Vec<IndexedRegion>,
    pub trailing: Vec<WireRegion>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegacyRouting {
    pub regions: Vec<WireRegion>,
    pub extra: Vec<Record>,
}

fn trailing_regions(variant: SchemaVariant) -> usize {
    match variant {
        SchemaVariant::Current => 9,
        SchemaVariant::Legacy => 19,
    }
}

/// Header with four zero fields and an entry count, then the entries with
/// all but field 1 ciphered.
pub fn read_wire_region(s: &mut Session) -> Result<WireRegion, DecodeError> {
    let header = s.decode(&[])?;
    for i in 0..4 {
        s.expect_zero(&header, i)?;
    }
    let n = s.count(&header, 4)?;
    let entries: Result<Vec<_>, _> = (0..n).map(|_| s.decode_skip(&[1])).collect();
    Ok(WireRegion {
        header,
        entries: entries?,
    })
}

fn read_regions(s: &mut Session, n: usize, base: usize) -> Result<Vec<WireRegion>, DecodeError> {
    (0..n)
        .map(|i| {
            s.record(base + i);
            read_wire_region(s)
        })
        .collect()
}

pub fn read_routing(s: &mut Session, variant: SchemaVariant) -> Result<Routing, DecodeError> {
    s.enter(Section::Routing);
    let counts = s.decode(&[])?;
    let num_leading = s.count(&counts, 0)?;
    let num_indexed = s.count(&counts, 1)?;
    let mut base = 0;
    let leading = read_regions(s, num_leading, base)?;
    base += num_leading;
    let fixed = read_regions(s, FIXED_REGIONS, base)?;
    base += FIXED_REGIONS;
    let mut indexed = vec![];
    for i in 0..num_indexed {
        s.record(base + i);
        let index = s.decode(&[])?;
        let found = s.count(&index, 0)?;
        if found != i + 1 && found != i {
            return Err(s.violation(ViolationKind::IndexEcho {
                expected: format!("{} or {i}", i + 1),
                found: found.to_string(),
            }));
        }
        let region = read_wire_region(s)?;
        indexed.push(IndexedRegion { index, region });
    }
    base += num_indexed;
    let trailing = read_regions(s, trailing_regions(variant), base)?;
    let entries: usize = leading
        .iter()
        .chain(&fixed)
        .chain(indexed.iter().map(|r| &r.region))
        .chain(&trailing)
        .map(|r| r.entries.len())
        .sum();
    log::debug!("routing: {entries} wire entries");
    Ok(Routing {
        counts,
        leading,
        fixed,
        indexed,
        trailing,
    })
}

pub fn read_legacy_routing(s: &mut Session) -> Result<LegacyRouting, DecodeError> {
    s.enter(Section::LegacyRouting);
    let count = s.decode(&[])?;
    let n = s.count(&count, 0)?;
    let regions = read_regions(s, n, 0)?;
    s.record(n);
    let extra = s.counted_list(&[0])?;
    Ok(LegacyRouting { regions, extra })
}
