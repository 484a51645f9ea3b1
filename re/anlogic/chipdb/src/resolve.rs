use std::collections::BTreeMap;
use std::fmt;

use crate::bcc::BccEntry;
use crate::db::ChipDb;
use crate::tiles::{InstanceFlag, TileGrid, TileInstance};

const RESERVED_COLUMNS: &[u32] = &[974, 2926];
const RESERVED_WIDTH: u32 = 6;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BitAddress {
    Fuse { row: u32, col: u32 },
    /// PLL bits carry no fuse address.
    NotApplicable,
}

/// A remapped bit whose target tile has no addressable instance of the
/// requested type.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnresolvedRemap {
    pub bit: String,
    pub owner: String,
    pub x: i64,
    pub y: i64,
    pub kind: String,
}

impl fmt::Display for UnresolvedRemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: no {} template at x{}y{}",
            self.owner, self.bit, self.kind, self.x, self.y
        )
    }
}

impl std::error::Error for UnresolvedRemap {}

/// Computes the fuse address of `entry` as owned by `owner`.
pub fn resolve(
    grid: &TileGrid,
    entry: &BccEntry,
    owner: &TileInstance,
) -> Result<BitAddress, UnresolvedRemap> {
    if entry.pll_info {
        return Ok(BitAddress::NotApplicable);
    }
    let tile = if entry.remap {
        let x = i64::from(owner.x) + i64::from(entry.xoff);
        let y = i64::from(owner.y) + i64::from(entry.yoff);
        let kind = entry.kind.to_lowercase();
        match grid.template(x, y, &kind) {
            Some(tile) => tile,
            None => {
                return Err(UnresolvedRemap {
                    bit: entry.name.clone(),
                    owner: owner.name.clone(),
                    x,
                    y,
                    kind,
                });
            }
        }
    } else {
        owner
    };
    Ok(BitAddress::Fuse {
        row: tile.frame_base + entry.frame,
        col: tile.bit_base + entry.bit,
    })
}

/// Skips the reserved bit-line columns. Each threshold is tested against the
/// already corrected column.
pub fn correct_column(mut col: u32) -> u32 {
    for &threshold in RESERVED_COLUMNS {
        if col >= threshold {
            col += RESERVED_WIDTH;
        }
    }
    col
}

/// Hit counts per fuse over every bit of every placed instance.
#[derive(Debug, Clone, Default)]
pub struct FuseMap {
    pub hits: BTreeMap<(u32, u32), u32>,
    pub not_applicable: usize,
    pub unresolved: Vec<UnresolvedRemap>,
}

impl FuseMap {
    pub fn build(db: &ChipDb, correct: bool) -> Self {
        let mut res = FuseMap::default();
        for inst in db.grid.instances.values() {
            if inst.flag == InstanceFlag::Placeholder {
                continue;
            }
            let Some(catalog) = db.catalogs.get(&inst.kind) else {
                continue;
            };
            for entry in &catalog.entries {
                match resolve(&db.grid, entry, inst) {
                    Ok(BitAddress::Fuse { row, col }) => {
                        let col = if correct { correct_column(col) } else { col };
                        *res.hits.entry((row, col)).or_default() += 1;
                    }
                    Ok(BitAddress::NotApplicable) => res.not_applicable += 1,
                    Err(e) => {
                        log::warn!("unresolved remap: {e}");
                        res.unresolved.push(e);
                    }
                }
            }
        }
        log::info!(
            "fuse map: {} fuses, {} pll bits, {} unresolved",
            res.hits.len(),
            res.not_applicable,
            res.unresolved.len()
        );
        res
    }

    pub fn get(&self, row: u32, col: u32) -> u32 {
        self.hits.get(&(row, col)).copied().unwrap_or(0)
    }

    /// One line per frame row: `.` for no hit, the count up to 9, `#` above.
    pub fn render(&self) -> String {
        let Some(max_row) = self.hits.keys().map(|&(r, _)| r).max() else {
            return String::new();
        };
        let max_col = self.hits.keys().map(|&(_, c)| c).max().unwrap_or(0);
        let mut res = String::new();
        for row in 0..=max_row {
            for col in 0..=max_col {
                res.push(match self.get(row, col) {
                    0 => '.',
                    n @ 1..=9 => char::from_digit(n, 10).unwrap_or('#'),
                    _ => '#',
                });
            }
            res.push('\n');
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcc::BccEntry;
    use indexmap::IndexMap;

    fn tile(name: &str, kind: &str, x: u32, y: u32, frame: u32, bit: u32, flag: i32) -> TileInstance {
        TileInstance {
            name: name.to_string(),
            kind: kind.to_string(),
            x,
            y,
            extent: (1, 1),
            frame_base: frame,
            bit_base: bit,
            flag: InstanceFlag::from_raw(flag),
        }
    }

    fn bit(kind: &str, frame: u32, bit: u32, xoff: i32, yoff: i32, pll: bool) -> BccEntry {
        BccEntry {
            name: "B".to_string(),
            kind: kind.to_string(),
            frame,
            bit,
            xoff,
            yoff,
            uses_wire_or_arc: false,
            remap: kind != "NONE",
            pll_info: pll,
            infix: vec![],
            rpn: vec![],
            vars: IndexMap::new(),
        }
    }

    fn grid() -> TileGrid {
        let mut grid = TileGrid::new(2, 1, vec![]);
        grid.insert(tile("plb_x0y0", "plb", 0, 0, 100, 200, -1));
        grid.insert(tile("plb_x1y0", "plb", 1, 0, 300, 400, -1));
        grid
    }

    #[test]
    fn owner_address() {
        let g = grid();
        let owner = g.instance("plb_x0y0").unwrap();
        assert_eq!(
            resolve(&g, &bit("NONE", 1, 5, 0, 0, false), owner),
            Ok(BitAddress::Fuse { row: 101, col: 205 })
        );
    }

    #[test]
    fn remapped_address() {
        let g = grid();
        let owner = g.instance("plb_x0y0").unwrap();
        assert_eq!(
            resolve(&g, &bit("PLB", 1, 5, 1, 0, false), owner),
            Ok(BitAddress::Fuse { row: 301, col: 405 })
        );
    }

    #[test]
    fn pll_not_applicable() {
        let g = grid();
        let owner = g.instance("plb_x0y0").unwrap();
        assert_eq!(
            resolve(&g, &bit("NONE", 1, 5, 0, 0, true), owner),
            Ok(BitAddress::NotApplicable)
        );
        assert_eq!(
            resolve(&g, &bit("PIB", 1, 5, 9, 9, true), owner),
            Ok(BitAddress::NotApplicable)
        );
    }

    #[test]
    fn remap_miss() {
        let g = grid();
        let owner = g.instance("plb_x1y0").unwrap();
        let err = resolve(&g, &bit("PLB", 0, 0, 1, 0, false), owner).unwrap_err();
        assert_eq!((err.x, err.y, err.kind.as_str()), (2, 0, "plb"));
        let err = resolve(&g, &bit("PIB", 0, 0, -1, 0, false), owner).unwrap_err();
        assert_eq!(err.kind, "pib");
        assert!(resolve(&g, &bit("PLB", 0, 0, 0, -1, false), owner).is_err());
    }

    #[test]
    fn column_correction() {
        assert_eq!(correct_column(973), 973);
        assert_eq!(correct_column(974), 980);
        assert_eq!(correct_column(2926), 2938);
        assert_eq!(correct_column(2919), 2925);
        assert_eq!(correct_column(2920), 2932);
    }

    #[test]
    fn render() {
        let mut map = FuseMap::default();
        map.hits.insert((0, 2), 1);
        map.hits.insert((1, 0), 2);
        map.hits.insert((1, 1), 12);
        assert_eq!(map.get(1, 1), 12);
        assert_eq!(map.get(0, 0), 0);
        assert_eq!(map.render(), "..1\n2#.\n");
        assert_eq!(FuseMap::default().render(), "");
    }
}
