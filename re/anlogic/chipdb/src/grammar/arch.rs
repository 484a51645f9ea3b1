use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, ViolationKind};
use crate::session::{Record, Session};

const INDEXED_RECORDS: std::ops::Range<u32> = 3..42;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub index: u32,
    pub body: Vec<Record>,
    pub lists: Vec<Vec<Record>>,
}

/// Per-architecture metadata. Apart from the name, all of it is opaque.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureDescriptor {
    pub name: String,
    pub name_line: Record,
    pub head: Record,
    pub lists: Vec<Vec<Record>>,
    pub dims: Record,
    pub table: Record,
    pub pairs: Vec<Record>,
    pub elements: Record,
    pub misc: Vec<Record>,
    pub indexed: Vec<IndexedRecord>,
}

/// A counts line `c0 .. c4` followed by the five lists it sizes.
fn read_lists(s: &mut Session) -> Result<Vec<Vec<Record>>, DecodeError> {
    let counts = s.decode(&[])?;
    let mut lists = vec![];
    for j in 0..5 {
        let n = s.count(&counts, j)?;
        let list: Result<Vec<_>, _> = (0..n).map(|_| s.decode(&[0])).collect();
        lists.push(list?);
    }
    Ok(lists)
}

pub fn read_architecture(
    s: &mut Session,
    name_line: &Record,
) -> Result<ArchitectureDescriptor, DecodeError> {
    let name = s.field(name_line, 0)?.to_string();
    let head = s.decode(&[0, 1, 2])?;
    let lists = read_lists(s)?;
    let dims = s.decode(&[])?;
    let table = s.decode(&[])?;
    let pair_counts = s.decode(&[])?;
    let mut pairs = vec![];
    for j in 0..4 {
        let n = s.count(&pair_counts, j)?;
        if n > 0 {
            let ids: Vec<usize> = (0..n).map(|k| 1 + 2 * k).collect();
            pairs.push(s.decode(&ids)?);
        }
    }
    let num_elements = s.decode(&[])?;
    let expected = s.count(&num_elements, 0)?;
    let elements = s.decode(&[])?;
    s.expect_len(&elements, expected)?;
    let misc: Result<Vec<_>, _> = (0..4).map(|_| s.decode(&[])).collect();
    let misc = misc?;
    let mut indexed = vec![];
    for index in INDEXED_RECORDS {
        let line = s.decode(&[])?;
        let found: u32 = s.number(&line, 0)?;
        if found != index {
            return Err(s.violation(ViolationKind::IndexEcho {
                expected: index.to_string(),
                found: found.to_string(),
            }));
        }
        let body = vec![s.decode(&[])?, s.decode(&[])?];
        let lists = read_lists(s)?;
        indexed.push(IndexedRecord { index, body, lists });
    }
    log::debug!("architecture {name}: {} indexed records", indexed.len());
    Ok(ArchitectureDescriptor {
        name,
        name_line: name_line.clone(),
        head,
        lists,
        dims,
        table,
        pairs,
        elements,
        misc,
        indexed,
    })
}
