use std::collections::BTreeMap;

use indexmap::IndexMap;
use jzon::JsonValue;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use unnamed_entity::{EntityId, EntityVec, entity_id};

use crate::session::Record;

entity_id! {
    pub id InstId u32;
}

/// Tile-grid JSON layout.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TileGridSchema {
    /// Keyed by instance name, with generated sites.
    Current,
    /// Rows of cells with `wl_beg`/`bl_beg` instance records.
    Legacy,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum InstanceFlag {
    /// Addressable; registered for remap lookups.
    Template,
    /// Zero extent and zero address.
    Placeholder,
    Located(i32),
}

impl InstanceFlag {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => InstanceFlag::Template,
            0 => InstanceFlag::Placeholder,
            _ => InstanceFlag::Located(raw),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            InstanceFlag::Template => -1,
            InstanceFlag::Placeholder => 0,
            InstanceFlag::Located(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TileInstance {
    pub name: String,
    pub kind: String,
    pub x: u32,
    pub y: u32,
    pub extent: (u32, u32),
    pub frame_base: u32,
    pub bit_base: u32,
    pub flag: InstanceFlag,
}

const SITES: &[(&str, &str, u32)] = &[("plb", "slice", 4), ("dsp", "mult18", 4)];

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Site {
    pub name: String,
    pub kind: &'static str,
}

impl TileInstance {
    pub fn sites(&self) -> Vec<Site> {
        for &(prefix, kind, num) in SITES {
            if self.kind.starts_with(prefix) {
                return (0..num)
                    .map(|i| Site {
                        name: format!("{kind}{i}"),
                        kind,
                    })
                    .collect();
            }
        }
        vec![]
    }

    fn to_current_json(&self) -> JsonValue {
        let mut fields = vec![
            ("type", JsonValue::from(self.kind.as_str())),
            ("x", JsonValue::from(self.x)),
            ("y", JsonValue::from(self.y)),
            ("w", JsonValue::from(self.extent.0)),
            ("h", JsonValue::from(self.extent.1)),
            ("start_frame", JsonValue::from(self.frame_base)),
            ("start_bit", JsonValue::from(self.bit_base)),
            ("flag", JsonValue::from(self.flag.raw())),
        ];
        let sites = self.sites();
        if !sites.is_empty() {
            fields.push((
                "sites",
                JsonValue::Array(
                    sites
                        .iter()
                        .map(|site| {
                            JsonValue::Object(jzon::object::Object::from_iter([
                                ("name", site.name.as_str()),
                                ("type", site.kind),
                            ]))
                        })
                        .collect(),
                ),
            ));
        }
        JsonValue::Object(jzon::object::Object::from_iter(fields))
    }

    fn to_legacy_json(&self) -> JsonValue {
        JsonValue::Object(jzon::object::Object::from_iter([
            ("inst", JsonValue::from(self.name.as_str())),
            ("type", JsonValue::from(self.kind.as_str())),
            ("unk1", JsonValue::from(self.extent.0)),
            ("unk2", JsonValue::from(self.extent.1)),
            ("wl_beg", JsonValue::from(self.frame_base)),
            ("bl_beg", JsonValue::from(self.bit_base)),
            ("unk5", JsonValue::from(self.flag.raw())),
        ]))
    }
}

/// Placement of all tile instances, indexed `[row, col]`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    pub header: Record,
    pub max_col: u32,
    pub max_row: u32,
    pub instances: EntityVec<InstId, TileInstance>,
    pub cells: Array2<Vec<InstId>>,
    pub templates: Array2<BTreeMap<String, InstId>>,
    pub by_name: IndexMap<String, InstId>,
}

impl TileGrid {
    pub fn new(max_col: u32, max_row: u32, header: Record) -> Self {
        let dim = (max_row as usize, max_col as usize);
        TileGrid {
            header,
            max_col,
            max_row,
            instances: EntityVec::new(),
            cells: Array2::from_elem(dim, vec![]),
            templates: Array2::from_elem(dim, BTreeMap::new()),
            by_name: IndexMap::new(),
        }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.max_col as i64 && y < self.max_row as i64
    }

    /// Registers an instance in its cell, by name, and as a template when
    /// flagged addressable. The position must lie inside the grid.
    pub fn insert(&mut self, inst: TileInstance) -> InstId {
        let (row, col) = (inst.y as usize, inst.x as usize);
        let name = inst.name.clone();
        let template = (inst.flag == InstanceFlag::Template).then(|| inst.kind.clone());
        let id = self.instances.push(inst);
        self.cells[[row, col]].push(id);
        if let Some(kind) = template {
            self.templates[[row, col]].insert(kind, id);
        }
        if let Some(prev) = self.by_name.insert(name, id) {
            log::warn!(
                "duplicate instance name {}, replacing instance {}",
                self.instances[id].name,
                prev.to_idx()
            );
        }
        id
    }

    pub fn instance(&self, name: &str) -> Option<&TileInstance> {
        self.by_name.get(name).map(|&id| &self.instances[id])
    }

    pub fn cell(&self, x: u32, y: u32) -> impl Iterator<Item = &TileInstance> {
        self.cells[[y as usize, x as usize]]
            .iter()
            .map(|&id| &self.instances[id])
    }

    /// Addressable instance of `kind` at (x, y), if any.
    pub fn template(&self, x: i64, y: i64, kind: &str) -> Option<&TileInstance> {
        if !self.contains(x, y) {
            return None;
        }
        self.templates[[y as usize, x as usize]]
            .get(kind)
            .map(|&id| &self.instances[id])
    }

    pub fn to_json(&self, schema: TileGridSchema) -> JsonValue {
        match schema {
            TileGridSchema::Current => JsonValue::Object(jzon::object::Object::from_iter(
                self.by_name
                    .iter()
                    .map(|(name, &id)| (name.as_str(), self.instances[id].to_current_json())),
            )),
            TileGridSchema::Legacy => JsonValue::Array(
                (0..self.max_row)
                    .map(|y| {
                        JsonValue::Array(
                            (0..self.max_col)
                                .map(|x| {
                                    jzon::object! {
                                        x: x,
                                        y: y,
                                        loc: format!("x{x}y{y}"),
                                        val: Vec::from_iter(self.cell(x, y).map(TileInstance::to_legacy_json)),
                                    }
                                })
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }
}
