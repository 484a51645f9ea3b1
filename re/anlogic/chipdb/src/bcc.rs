use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use jzon::JsonValue;
use serde::{Deserialize, Serialize};

use crate::session::Record;

/// One symbol of a configuration-bit expression.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ExprToken {
    False,
    True,
    /// Codes 2..=4, meaning unknown.
    Unknown(u8),
    LParen,
    RParen,
    Or,
    And,
    Not,
    Var(u32),
}

impl ExprToken {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ExprToken::False,
            1 => ExprToken::True,
            2..=4 => ExprToken::Unknown(code as u8),
            5 => ExprToken::LParen,
            6 => ExprToken::RParen,
            7 => ExprToken::Or,
            8 => ExprToken::And,
            9 => ExprToken::Not,
            _ => ExprToken::Var(code),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ExprToken::False => 0,
            ExprToken::True => 1,
            ExprToken::Unknown(c) => c.into(),
            ExprToken::LParen => 5,
            ExprToken::RParen => 6,
            ExprToken::Or => 7,
            ExprToken::And => 8,
            ExprToken::Not => 9,
            ExprToken::Var(id) => id,
        }
    }
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprToken::False => write!(f, "0"),
            ExprToken::True => write!(f, "1"),
            ExprToken::Unknown(c) => write!(f, "?{c}"),
            ExprToken::LParen => write!(f, "("),
            ExprToken::RParen => write!(f, ")"),
            ExprToken::Or => write!(f, "+"),
            ExprToken::And => write!(f, "*"),
            ExprToken::Not => write!(f, "~"),
            ExprToken::Var(id) => write!(f, "v{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SubexprKind {
    Property,
    ArcVal,
    Comp,
    Memory,
    Selector,
    Wire,
    Ports,
    Other,
}

impl SubexprKind {
    pub fn classify(raw: &str) -> Self {
        let op = raw.split('(').next().unwrap_or("");
        match op {
            "PROPERTY" => SubexprKind::Property,
            "ARCVAL" => SubexprKind::ArcVal,
            "COMP" => SubexprKind::Comp,
            "MEMORY" => SubexprKind::Memory,
            "SELECTOR" => SubexprKind::Selector,
            "WIRE" => SubexprKind::Wire,
            "PORTS" => SubexprKind::Ports,
            _ => SubexprKind::Other,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Subexpr {
    pub kind: SubexprKind,
    pub raw: String,
}

impl Subexpr {
    pub fn new(raw: String) -> Self {
        Subexpr {
            kind: SubexprKind::classify(&raw),
            raw,
        }
    }
}

/// One configuration-bit definition.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BccEntry {
    pub name: String,
    pub kind: String,
    pub frame: u32,
    pub bit: u32,
    pub xoff: i32,
    pub yoff: i32,
    pub uses_wire_or_arc: bool,
    pub remap: bool,
    pub pll_info: bool,
    pub infix: Vec<ExprToken>,
    pub rpn: Vec<ExprToken>,
    pub vars: IndexMap<u32, Subexpr>,
}

impl BccEntry {
    /// Renders the infix expression with variables replaced by their raw
    /// subexpressions.
    pub fn expression(&self) -> String {
        self.infix
            .iter()
            .map(|tok| match tok {
                ExprToken::Var(id) if self.vars.contains_key(id) => self.vars[id].raw.clone(),
                _ => tok.to_string(),
            })
            .join("")
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(jzon::object::Object::from_iter([
            ("name", JsonValue::from(self.name.as_str())),
            ("type", JsonValue::from(self.kind.as_str())),
            ("frame", JsonValue::from(self.frame)),
            ("bit", JsonValue::from(self.bit)),
            ("xoff", JsonValue::from(self.xoff)),
            ("yoff", JsonValue::from(self.yoff)),
            ("uses_wire_or_arc", JsonValue::from(self.uses_wire_or_arc)),
            ("remap", JsonValue::from(self.remap)),
            ("pll_info", JsonValue::from(self.pll_info)),
            ("infix", JsonValue::from(Vec::from_iter(self.infix.iter().map(|t| t.code())))),
            ("rpn", JsonValue::from(Vec::from_iter(self.rpn.iter().map(|t| t.code())))),
            (
                "vars",
                JsonValue::Object(jzon::object::Object::from_iter(
                    self.vars.iter().map(|(id, sub)| (id.to_string(), sub.raw.as_str())),
                )),
            ),
            ("expression", JsonValue::from(self.expression())),
        ]))
    }
}

/// All bits of one cell type, in file order. The catalog headers
/// (`name k n1 n2 n3`) are kept opaque.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BccCatalog {
    pub headers: Vec<Record>,
    pub entries: Vec<BccEntry>,
}

impl BccCatalog {
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.entries.iter().map(BccEntry::to_json).collect())
    }

    pub fn get(&self, name: &str) -> Option<&BccEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BccCatalogs {
    pub catalogs: IndexMap<String, BccCatalog>,
}

impl BccCatalogs {
    pub fn get(&self, name: &str) -> Option<&BccCatalog> {
        self.catalogs.get(name)
    }

    /// Returns the catalog for `name`, appending to it if already present.
    pub fn catalog_mut(&mut self, name: &str) -> &mut BccCatalog {
        self.catalogs.entry(name.to_string()).or_default()
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BccCatalog)> {
        self.catalogs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// File name for a catalog under `bits/`.
    pub fn file_name(name: &str) -> String {
        format!("{}.json", name.replace('/', "_"))
    }
}
