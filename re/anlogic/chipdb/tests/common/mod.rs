#![allow(dead_code)]

/// A minimal database with key `TANG`: one architecture, empty routing and
/// model sections, a single-bit `plb` catalog and a 1x1 tile table.
pub fn fixture() -> String {
    fixture_with(|l| l)
}

/// Same as [`fixture`], with every line passed through `edit`.
pub fn fixture_with(edit: impl Fn(String) -> String) -> String {
    let mut lines: Vec<String> = vec![];
    let mut push = |l: &str| lines.push(l.to_string());
    push("ANLOGIC_CHIPDB 1");
    push("TDDB TANG 1");
    push("\\EXV\\ 20");
    push("IRQcI ?9E) ?9E) 8 8 41 72");
    push("0 0 0 0 0");
    push("17 23");
    push("1 2 3");
    push("0 0 0 0");
    push("2");
    push("7 9");
    for _ in 0..4 {
        push("0");
    }
    for j in 3..42 {
        push(&j.to_string());
        push("0");
        push("0");
        push("0 0 0 0 0");
    }
    push("0 0");
    for _ in 0..(16 + 9) {
        push("0 0 0 0 0");
    }
    // models, names, constraints
    push("0");
    push("0");
    push("0");
    push("pack 0");
    push("kcap");
    push("ESdM_QCMS 0 0 0 0");
    push("");
    push("LZGPSeJ` 1");
    push("ZcF 1 0 0 0");
    push("7wV-?@ E3?/ 1 5 0 0 0 0 0 2 2 1");
    push("9 10");
    push("10 9");
    push("10 G6@:<6EC|*~3E:z9Ej");
    push("");
    push("");
    push("");
    push("SScCZX]S 1 1 0 0 0 0 1 0");
    push("0 0 1");
    push("aVY!_iwpq aVY 0 0 4 54 100 200 -1");
    push("");
    push("");
    push("");
    push("*@9KC:99 0");
    push("END");
    let mut res = String::new();
    for l in lines {
        res.push_str(&edit(l));
        res.push('\n');
    }
    res
}

pub const FIXTURE_LINES: usize = 220;

pub const TILEGRID_JSON: &str = concat!(
    r#"{"plb_x0y0":{"type":"plb","x":0,"y":0,"w":4,"h":54,"start_frame":100,"start_bit":200,"flag":-1,"#,
    r#""sites":[{"name":"slice0","type":"slice"},{"name":"slice1","type":"slice"},"#,
    r#"{"name":"slice2","type":"slice"},{"name":"slice3","type":"slice"}]}}"#,
);

pub const LEGACY_TILEGRID_JSON: &str = concat!(
    r#"[[{"x":0,"y":0,"loc":"x0y0","val":[{"inst":"plb_x0y0","type":"plb","unk1":4,"unk2":54,"#,
    r#""wl_beg":100,"bl_beg":200,"unk5":-1}]}]]"#,
);
