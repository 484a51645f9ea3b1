mod common;

use std::path::Path;

use assert_matches::assert_matches;
use prjcombine_re_anlogic_chipdb::bcc::{ExprToken, SubexprKind};
use prjcombine_re_anlogic_chipdb::grammar::SchemaVariant;
use prjcombine_re_anlogic_chipdb::publish::Staging;
use prjcombine_re_anlogic_chipdb::resolve::{BitAddress, FuseMap, resolve};
use prjcombine_re_anlogic_chipdb::tiles::{InstanceFlag, TileGridSchema};
use prjcombine_re_anlogic_chipdb::{
    ChipDb, DecodeError, FormatViolation, Section, ViolationKind, decode, decode_file,
};

use common::{FIXTURE_LINES, LEGACY_TILEGRID_JSON, TILEGRID_JSON, fixture, fixture_with};

fn decode_text(text: &str) -> Result<ChipDb, DecodeError> {
    decode(Box::new(text.as_bytes()), None)
}

fn replace_line(from: &'static str, to: &'static str) -> impl Fn(String) -> String {
    move |l| if l == from { to.to_string() } else { l }
}

#[test]
fn fixture_decodes() {
    let db = decode_text(&fixture()).unwrap();
    assert_eq!(db.magic, "TDDB");
    assert_eq!(db.key, "TANG");
    assert_eq!(db.variant, SchemaVariant::Current);
    assert_eq!(db.arch_name(), Some("eagle"));
    assert_eq!(db.architectures[0].head[..3], ["eagle", "NONE", "NONE"]);
    assert_eq!(db.architectures[0].indexed.len(), 39);
    assert_eq!(db.routing.fixed.len(), 16);
    assert_eq!(db.routing.trailing.len(), 9);
    assert!(db.legacy_routing.is_none());
    assert!(db.serdes.is_none());
    assert_eq!(db.timing.tag, ["TimingLib", "0", "0", "0", "0"]);
    assert_eq!(db.trailer.last().unwrap(), &["END"]);

    assert_eq!(db.catalogs.len(), 1);
    let plb = db.catalogs.get("plb").unwrap();
    assert_eq!(plb.headers, [["plb", "1", "0", "0", "0"]]);
    let entry = &plb.entries[0];
    assert_eq!(entry.name, "F0_INV");
    assert_eq!(entry.kind, "NONE");
    assert_eq!((entry.frame, entry.bit, entry.xoff, entry.yoff), (1, 5, 0, 0));
    assert!(!entry.uses_wire_or_arc && !entry.remap && !entry.pll_info);
    assert_eq!(entry.infix, [ExprToken::Not, ExprToken::Var(10)]);
    assert_eq!(entry.rpn, [ExprToken::Var(10), ExprToken::Not]);
    assert_eq!(entry.vars[&10].raw, "PROPERTY(F0INV,ON)");
    assert_eq!(entry.vars[&10].kind, SubexprKind::Property);
    assert_eq!(entry.expression(), "~PROPERTY(F0INV,ON)");

    let inst = db.grid.instance("plb_x0y0").unwrap();
    assert_eq!(inst.flag, InstanceFlag::Template);
    assert_eq!((inst.frame_base, inst.bit_base), (100, 200));
    assert_eq!(db.grid.template(0, 0, "plb"), Some(inst));
    assert_eq!(
        resolve(&db.grid, entry, inst),
        Ok(BitAddress::Fuse { row: 101, col: 205 })
    );
}

#[test]
fn fixture_tilegrid_json() {
    let db = decode_text(&fixture()).unwrap();
    assert_eq!(db.grid.to_json(TileGridSchema::Current).dump(), TILEGRID_JSON);
    assert_eq!(db.grid.to_json(TileGridSchema::Legacy).dump(), LEGACY_TILEGRID_JSON);

    let mut out = vec![];
    db.write_tilegrid(&mut out, db.default_schema()).unwrap();
    let parsed = jzon::parse(std::str::from_utf8(&out).unwrap()).unwrap();
    assert_eq!(parsed.dump(), TILEGRID_JSON);
}

#[test]
fn fixture_dump() {
    let text = fixture();
    let mut out = vec![];
    decode(Box::new(text.as_bytes()), Some(Box::new(&mut out))).unwrap();
    let dump = String::from_utf8(out).unwrap();
    let lines: Vec<_> = dump.lines().collect();
    assert_eq!(lines.len(), FIXTURE_LINES);
    assert_eq!(lines[0], "ANLOGIC_CHIPDB 1");
    assert_eq!(lines[2], "eagle 20");
    assert_eq!(lines[3], "eagle NONE NONE 8 8 41 72");
    assert_eq!(lines[201], "TimingLib 0 0 0 0");
    assert_eq!(lines[203], "bcc_info 1");
    assert_eq!(lines[204], "plb 1 0 0 0");
    assert_eq!(lines[205], "F0_INV NONE 1 5 0 0 0 0 0 2 2 1");
    assert_eq!(lines[208], "10 PROPERTY(F0INV,ON)");
    assert_eq!(lines[212], "bil_info 1 1 0 0 0 0 1 0");
    assert_eq!(lines[214], "plb_x0y0 plb 0 0 4 54 100 200 -1");
    assert_eq!(lines[218], "FOOT_IOB 0");
    assert_eq!(lines[219], "END");
}

#[test]
fn fixture_fuse_map() {
    let db = decode_text(&fixture()).unwrap();
    let map = FuseMap::build(&db, true);
    assert_eq!(map.hits.len(), 1);
    assert_eq!(map.get(101, 205), 1);
    assert!(map.unresolved.is_empty());
    let rendered = map.render();
    assert_eq!(rendered.lines().count(), 102);
    assert!(rendered.ends_with("1\n"));
}

#[test]
fn fixture_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eagle_s20.zst");
    let db = decode_text(&fixture()).unwrap();
    db.to_file(&path).unwrap();
    assert_eq!(ChipDb::from_file(&path).unwrap(), db);
}

#[test]
fn trailing_garbage_ignored() {
    let text = fixture() + "whatever\n";
    assert!(decode_text(&text).is_ok());
}

#[test]
fn wrong_tag() {
    let text = fixture_with(replace_line("kcap", "kcab"));
    assert_matches!(
        decode_text(&text),
        Err(DecodeError::Format(FormatViolation {
            kind: ViolationKind::TagMismatch { expected: "kcap", .. },
            section: Section::Pack,
            line: 201,
            ..
        }))
    );
}

fn nonzero_routing_fixture() -> String {
    let mut lines: Vec<String> = fixture().lines().map(String::from).collect();
    // first fixed region header
    assert_eq!(lines[171], "0 0 0 0 0");
    lines[171] = "0 0 0 7 0".to_string();
    lines.join("\n") + "\n"
}

#[test]
fn nonzero_routing_field() {
    let text = nonzero_routing_fixture();
    assert_matches!(
        decode_text(&text),
        Err(DecodeError::Format(FormatViolation {
            kind: ViolationKind::NotZero { index: 3, .. },
            section: Section::Routing,
            record: 0,
            line: 172,
        }))
    );
}

#[test]
fn total_mismatch() {
    let text = fixture_with(replace_line(
        "SScCZX]S 1 1 0 0 0 0 1 0",
        "SScCZX]S 1 1 0 0 0 0 2 0",
    ));
    assert_matches!(
        decode_text(&text),
        Err(DecodeError::Format(FormatViolation {
            kind: ViolationKind::TotalMismatch { declared: 2, counted: 1 },
            section: Section::BilInfo,
            ..
        }))
    );
}

#[test]
fn wrong_key_desyncs() {
    let text = fixture_with(replace_line("TDDB TANG 1", "TDDB TANH 1"));
    assert_matches!(decode_text(&text), Err(DecodeError::Format(_)));
}

#[test]
fn truncated() {
    let text: String = fixture().lines().take(210).map(|l| format!("{l}\n")).collect();
    assert_matches!(
        decode_text(&text),
        Err(DecodeError::Format(FormatViolation {
            kind: ViolationKind::UnexpectedEof,
            section: Section::BccInfo,
            line: 211,
            ..
        }))
    );
}

#[test]
fn missing_file() {
    assert_matches!(
        decode_file(Path::new("/nonexistent/eagle_s20.db"), None),
        Err(DecodeError::Io(_))
    );
}

/// Mirrors the CLI flow: outputs are staged before decoding and only
/// committed on success.
fn decode_and_publish(text: &str, out: &Path) -> Result<(), DecodeError> {
    let mut staging = Staging::new();
    let tilegrid = staging.stage(out.join("tilegrid.json"))?;
    let decrypt = staging.stage(out.join("decrypted.txt"))?;
    let db = decode(Box::new(text.as_bytes()), Some(Box::new(staging.file(decrypt))))?;
    db.write_tilegrid(staging.file(tilegrid), TileGridSchema::Current)?;
    staging.commit()?;
    Ok(())
}

#[test]
fn failures_publish_nothing() {
    let bad = [
        fixture_with(replace_line("kcap", "kcab")),
        nonzero_routing_fixture(),
        fixture_with(replace_line(
            "SScCZX]S 1 1 0 0 0 0 1 0",
            "SScCZX]S 1 1 0 0 0 0 2 0",
        )),
    ];
    for text in bad {
        let dir = tempfile::tempdir().unwrap();
        assert!(decode_and_publish(&text, dir.path()).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    let dir = tempfile::tempdir().unwrap();
    decode_and_publish(&fixture(), dir.path()).unwrap();
    let json = std::fs::read_to_string(dir.path().join("tilegrid.json")).unwrap();
    assert_eq!(jzon::parse(&json).unwrap().dump(), TILEGRID_JSON);
    let dump = std::fs::read_to_string(dir.path().join("decrypted.txt")).unwrap();
    assert_eq!(dump.lines().count(), FIXTURE_LINES);
}
