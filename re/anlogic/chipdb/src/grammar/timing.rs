use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Section};
use crate::session::{Record, Session};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimingGroup {
    pub head: Record,
    pub body: Vec<Record>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimingNest {
    pub head: Record,
    pub body: Vec<Record>,
    pub items: Vec<(Record, Record)>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimingLib {
    pub tag: Record,
    pub pairs: Vec<Record>,
    pub pairs2: Vec<TimingGroup>,
    pub pairs3: Vec<TimingGroup>,
    pub nested: Vec<TimingNest>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Serdes {
    pub pcie: Vec<Record>,
    pub serdes: Vec<Record>,
}

fn read_group(s: &mut Session, lines: usize) -> Result<TimingGroup, DecodeError> {
    let head = s.decode(&[0, 1])?;
    let body: Result<Vec<_>, _> = (0..lines).map(|_| s.decode(&[])).collect();
    Ok(TimingGroup { head, body: body? })
}

fn read_nest(s: &mut Session) -> Result<TimingNest, DecodeError> {
    let head = s.decode(&[0])?;
    let k = s.count(&head, 2)?;
    let body = vec![s.decode(&[])?, s.decode(&[])?];
    let mut items = vec![];
    for _ in 0..k {
        let a = s.decode(&[0])?;
        let b = s.decode(&[])?;
        items.push((a, b));
    }
    s.expect_empty()?;
    Ok(TimingNest { head, body, items })
}

pub fn read_timing_lib(s: &mut Session) -> Result<TimingLib, DecodeError> {
    s.enter(Section::TimingLib);
    let tag = s.decode(&[0])?;
    s.expect_tag(&tag, "TimingLib")?;
    let counts: Vec<usize> = (1..=4)
        .map(|i| s.count(&tag, i))
        .collect::<Result<_, _>>()?;
    let mut record = 0;
    let mut pairs = vec![];
    for _ in 0..counts[0] {
        s.record(record);
        record += 1;
        pairs.push(s.decode(&[0, 1])?);
    }
    let mut pairs2 = vec![];
    for _ in 0..counts[1] {
        s.record(record);
        record += 1;
        pairs2.push(read_group(s, 2)?);
    }
    let mut pairs3 = vec![];
    for _ in 0..counts[2] {
        s.record(record);
        record += 1;
        pairs3.push(read_group(s, 3)?);
    }
    let mut nested = vec![];
    for _ in 0..counts[3] {
        s.record(record);
        record += 1;
        nested.push(read_nest(s)?);
    }
    Ok(TimingLib {
        tag,
        pairs,
        pairs2,
        pairs3,
        nested,
    })
}

/// PCIe and SERDES lists, absent when the next line is empty.
pub fn read_serdes(s: &mut Session) -> Result<Option<Serdes>, DecodeError> {
    s.enter(Section::Serdes);
    if s.peek_is_empty()? {
        s.expect_empty()?;
        return Ok(None);
    }
    let pcie = s.counted_list(&[0])?;
    s.record(1);
    let serdes = s.counted_list(&[0])?;
    Ok(Some(Serdes { pcie, serdes }))
}
