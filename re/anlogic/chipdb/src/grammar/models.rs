use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Section, ViolationKind};
use crate::session::{Record, Session};

/// Leaf body cipher sets, selected by field 2 of the leaf head.
pub const MODEL_CIPHER_SETS: &[(u32, &[usize])] = &[(1, &[1]), (2, &[1, 5]), (3, &[1, 5, 9])];

pub fn model_cipher_set(selector: u32) -> Option<&'static [usize]> {
    MODEL_CIPHER_SETS
        .iter()
        .find(|&&(sel, _)| sel == selector)
        .map(|&(_, ids)| ids)
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelLeaf {
    pub head: Record,
    pub body: Record,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub header: Record,
    pub groups: Vec<Vec<ModelLeaf>>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub header: Record,
    pub entries: Vec<Record>,
    pub kcap: Record,
}

fn read_leaf(s: &mut Session) -> Result<ModelLeaf, DecodeError> {
    let head = s.decode(&[0])?;
    let selector: u32 = s.number(&head, 2)?;
    let Some(ids) = model_cipher_set(selector) else {
        return Err(s.violation(ViolationKind::BadModelSelector(selector)));
    };
    let body = s.decode(ids)?;
    Ok(ModelLeaf { head, body })
}

pub fn read_models(s: &mut Session) -> Result<Vec<Model>, DecodeError> {
    s.enter(Section::Models);
    let count = s.decode(&[])?;
    let n = s.count(&count, 0)?;
    let mut models = vec![];
    for i in 0..n {
        s.record(i);
        let header = s.decode(&[])?;
        let num_groups = s.count(&header, 0)?;
        let mut groups = vec![];
        for g in 0..num_groups {
            let num_leaves = s.count(&header, g + 1)?;
            let leaves: Result<Vec<_>, _> = (0..num_leaves).map(|_| read_leaf(s)).collect();
            groups.push(leaves?);
        }
        models.push(Model { header, groups });
    }
    log::debug!("{} models", models.len());
    Ok(models)
}

pub fn read_names(s: &mut Session) -> Result<Vec<Record>, DecodeError> {
    s.enter(Section::Names);
    s.counted_list(&[0])
}

pub fn read_constraints(s: &mut Session) -> Result<Vec<Record>, DecodeError> {
    s.enter(Section::Constraints);
    let count = s.decode(&[])?;
    let n = s.count(&count, 0)?;
    (0..n)
        .map(|i| {
            s.record(i);
            s.decode_skip(&[0])
        })
        .collect()
}

/// The `pack N` list followed by the `kcap` line.
pub fn read_pack(s: &mut Session) -> Result<Pack, DecodeError> {
    s.enter(Section::Pack);
    let header = s.decode(&[])?;
    s.expect_tag(&header, "pack")?;
    let n = s.count(&header, 1)?;
    let entries: Result<Vec<_>, _> = (0..n).map(|_| s.decode(&[0])).collect();
    let entries = entries?;
    let kcap = s.decode(&[])?;
    s.expect_tag(&kcap, "kcap")?;
    Ok(Pack {
        header,
        entries,
        kcap,
    })
}
