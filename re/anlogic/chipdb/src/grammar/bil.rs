use ndarray::Array2;

use crate::error::{DecodeError, Section, ViolationKind};
use crate::session::{Record, Session};
use crate::tiles::{InstanceFlag, TileGrid, TileInstance};

const INSTANCE_FIELDS: usize = 9;
const TRAILER_SENTINELS: &[&str] = &["power%%20no", "FOOT_IOB"];

fn read_instance(s: &mut Session, x: u32, y: u32) -> Result<TileInstance, DecodeError> {
    let rec = s.decode(&[0, 1])?;
    s.expect_len(&rec, INSTANCE_FIELDS)?;
    let ix: u32 = s.number(&rec, 2)?;
    let iy: u32 = s.number(&rec, 3)?;
    if (ix, iy) != (x, y) {
        return Err(s.violation(ViolationKind::IndexEcho {
            expected: format!("x{x}y{y}"),
            found: format!("x{ix}y{iy}"),
        }));
    }
    let extent = (s.number(&rec, 4)?, s.number(&rec, 5)?);
    let frame_base = s.number(&rec, 6)?;
    let bit_base = s.number(&rec, 7)?;
    let flag = InstanceFlag::from_raw(s.number(&rec, 8)?);
    if flag == InstanceFlag::Placeholder && (extent != (0, 0) || frame_base != 0 || bit_base != 0)
    {
        return Err(s.violation(ViolationKind::PlaceholderExtent));
    }
    s.expect_empty()?;
    Ok(TileInstance {
        name: rec[0].clone(),
        kind: rec[1].clone(),
        x,
        y,
        extent,
        frame_base,
        bit_base,
        flag,
    })
}

/// The tile table: a header sizing the grid, one line per cell and one
/// record per instance.
pub fn read_bil_info(s: &mut Session) -> Result<TileGrid, DecodeError> {
    s.enter(Section::BilInfo);
    let header = s.decode(&[0])?;
    s.expect_tag(&header, "bil_info")?;
    let max_col: u32 = s.number(&header, 1)?;
    let max_row: u32 = s.number(&header, 2)?;
    let declared = s.count(&header, 7)?;
    s.count(&header, 8)?;
    let mut grid = TileGrid::new(max_col, max_row, header);
    let mut seen = Array2::from_elem((max_row as usize, max_col as usize), false);
    let mut total = 0;
    for i in 0..(max_row as usize * max_col as usize) {
        s.record(i);
        let cell = s.decode(&[])?;
        let x: u32 = s.number(&cell, 0)?;
        let y: u32 = s.number(&cell, 1)?;
        let n = s.count(&cell, 2)?;
        if !grid.contains(x.into(), y.into()) {
            return Err(s.violation(ViolationKind::OutsideGrid { x, y }));
        }
        let slot = &mut seen[[y as usize, x as usize]];
        if *slot {
            return Err(s.violation(ViolationKind::DuplicateCell { x, y }));
        }
        *slot = true;
        for _ in 0..n {
            let inst = read_instance(s, x, y)?;
            grid.insert(inst);
        }
        total += n;
    }
    if total != declared {
        return Err(s.violation(ViolationKind::TotalMismatch {
            declared,
            counted: total,
        }));
    }
    log::debug!("bil_info: {max_col}x{max_row}, {total} instances");
    Ok(grid)
}

/// The bel-type table and the uninterpreted tail up to the footer sentinel
/// and the line after it.
pub fn read_trailer(s: &mut Session, grid: &TileGrid) -> Result<(Vec<Record>, Vec<Record>), DecodeError> {
    s.enter(Section::Trailer);
    s.expect_empty()?;
    let n = s.count(&grid.header, 8)?;
    let bel_types: Result<Vec<_>, _> = (0..n).map(|_| s.decode(&[0])).collect();
    let bel_types = bel_types?;
    s.expect_empty()?;
    let mut tail = vec![];
    loop {
        s.record(tail.len());
        let rec = s.decode(&[0])?;
        let done = rec
            .first()
            .is_some_and(|f| TRAILER_SENTINELS.contains(&f.as_str()));
        tail.push(rec);
        if done {
            break;
        }
    }
    tail.push(s.decode(&[])?);
    Ok((bel_types, tail))
}
