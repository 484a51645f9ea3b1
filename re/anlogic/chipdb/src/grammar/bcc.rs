use indexmap::IndexMap;

use crate::bcc::{BccCatalogs, BccEntry, ExprToken, Subexpr};
use crate::error::{DecodeError, Section, ViolationKind};
use crate::session::{Record, Session};

const BIT_HEADER_FIELDS: usize = 12;

fn flag(s: &Session, rec: &Record, index: usize, name: &'static str) -> Result<bool, DecodeError> {
    match s.field(rec, index)? {
        "0" => Ok(false),
        "1" => Ok(true),
        value => Err(s.violation(ViolationKind::BadFlag {
            name,
            value: value.to_string(),
        })),
    }
}

fn tokens(s: &mut Session, expected: usize) -> Result<Vec<ExprToken>, DecodeError> {
    let line = s.decode(&[])?;
    s.expect_len(&line, expected)?;
    (0..line.len())
        .map(|i| s.number(&line, i).map(ExprToken::from_code))
        .collect()
}

/// One bit: the 12-field header, both expression forms, the variable table
/// and the closing sentinel.
pub fn read_bit(s: &mut Session) -> Result<BccEntry, DecodeError> {
    let head = s.decode(&[0, 1])?;
    s.expect_len(&head, BIT_HEADER_FIELDS)?;
    let name = head[0].clone();
    let kind = head[1].clone();
    let frame = s.number(&head, 2)?;
    let bit = s.number(&head, 3)?;
    let xoff = s.number(&head, 4)?;
    let yoff = s.number(&head, 5)?;
    let uses_wire_or_arc = flag(s, &head, 6, "usesWireOrArc")?;
    let remap = flag(s, &head, 7, "remap")?;
    let pll_info = flag(s, &head, 8, "pllInfo")?;
    if remap != (kind != "NONE") {
        return Err(s.violation(ViolationKind::RemapType { remap, kind }));
    }
    let num_infix = s.count(&head, 9)?;
    let num_rpn = s.count(&head, 10)?;
    let num_vars = s.count(&head, 11)?;
    let infix = tokens(s, num_infix)?;
    let rpn = tokens(s, num_rpn)?;
    let mut vars = IndexMap::new();
    for _ in 0..num_vars {
        let line = s.decode(&[1])?;
        let id: u32 = s.number(&line, 0)?;
        let raw = s.field(&line, 1)?.to_string();
        vars.insert(id, Subexpr::new(raw));
    }
    s.expect_empty()?;
    Ok(BccEntry {
        name,
        kind,
        frame,
        bit,
        xoff,
        yoff,
        uses_wire_or_arc,
        remap,
        pll_info,
        infix,
        rpn,
        vars,
    })
}

pub fn read_bcc_info(s: &mut Session) -> Result<BccCatalogs, DecodeError> {
    s.enter(Section::BccInfo);
    let tag = s.decode(&[0])?;
    s.expect_tag(&tag, "bcc_info")?;
    let n = s.count(&tag, 1)?;
    let mut catalogs = BccCatalogs::default();
    for i in 0..n {
        s.record(i);
        let header = s.decode(&[0])?;
        let name = s.field(&header, 0)?.to_string();
        let k = s.count(&header, 1)?;
        let mut entries = vec![];
        for _ in 0..k {
            entries.push(read_bit(s)?);
        }
        s.expect_empty()?;
        let catalog = catalogs.catalog_mut(&name);
        catalog.headers.push(header);
        catalog.entries.extend(entries);
    }
    s.expect_empty()?;
    log::debug!("{} bcc catalogs", catalogs.len());
    Ok(catalogs)
}
