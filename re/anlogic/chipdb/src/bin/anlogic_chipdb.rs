use std::error::Error;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use prjcombine_re_anlogic_chipdb::bcc::BccCatalogs;
use prjcombine_re_anlogic_chipdb::publish::Staging;
use prjcombine_re_anlogic_chipdb::resolve::FuseMap;
use prjcombine_re_anlogic_chipdb::tiles::TileGridSchema;
use rayon::prelude::*;
use simple_error::{SimpleError, bail};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Schema {
    Current,
    Legacy,
}

#[derive(Debug, Parser)]
#[command(
    name = "anlogic_chipdb",
    about = "Decode Anlogic TD chip database files."
)]
struct Args {
    /// Input .db files.
    #[arg(required = true)]
    db: Vec<PathBuf>,
    /// Tile grid JSON output.
    #[arg(long)]
    tilegrid: Option<PathBuf>,
    /// Deciphered plaintext output.
    #[arg(long)]
    decrypt: Option<PathBuf>,
    /// Directory for tilegrid.json and bits/<catalog>.json.
    #[arg(long)]
    datadir: Option<PathBuf>,
    /// Database root; writes <db-dir>/<arch>/<part>/tilegrid.json.
    #[arg(long, env = "PRJTANG_DB")]
    db_dir: Option<PathBuf>,
    /// Architecture directory under --db-dir; defaults to the decoded name.
    #[arg(long)]
    arch: Option<String>,
    /// Tile grid JSON layout; defaults to the layout matching the file.
    #[arg(long, value_enum)]
    schema: Option<Schema>,
    /// Fuse hit map output.
    #[arg(long)]
    fusemap: Option<PathBuf>,
    /// Apply the reserved bit-line corrections to the fuse map.
    #[arg(long)]
    correct_columns: bool,
    /// Compressed decoded database output.
    #[arg(long)]
    cache: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn has_per_file_outputs(&self) -> bool {
        self.tilegrid.is_some()
            || self.decrypt.is_some()
            || self.datadir.is_some()
            || self.fusemap.is_some()
            || self.cache.is_some()
    }
}

fn decode_one(args: &Args, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut staging = Staging::new();
    let decrypt = args.decrypt.as_ref().map(|p| staging.stage(p)).transpose()?;
    let tilegrid = args.tilegrid.as_ref().map(|p| staging.stage(p)).transpose()?;
    let fusemap = args.fusemap.as_ref().map(|p| staging.stage(p)).transpose()?;
    let cache = args.cache.as_ref().map(|p| staging.stage(p)).transpose()?;
    if let Some(dir) = &args.datadir {
        Staging::check_dir(&dir.join("bits"))?;
    }
    if let Some(dir) = &args.db_dir {
        Staging::check_dir(dir)?;
    }

    log::info!("decoding {}", path.display());
    let db = {
        let dump = decrypt
            .map(|id| Box::new(BufWriter::new(staging.file(id))) as Box<dyn Write + '_>);
        prjcombine_re_anlogic_chipdb::decode_file(path, dump)?
    };
    let schema = match args.schema {
        Some(Schema::Current) => TileGridSchema::Current,
        Some(Schema::Legacy) => TileGridSchema::Legacy,
        None => db.default_schema(),
    };

    if let Some(id) = tilegrid {
        db.write_tilegrid(staging.file(id), schema)?;
    }
    if let Some(dir) = &args.datadir {
        let id = staging.stage(dir.join("tilegrid.json"))?;
        db.write_tilegrid(staging.file(id), schema)?;
        for (name, catalog) in db.catalogs.iter() {
            let id = staging.stage(dir.join("bits").join(BccCatalogs::file_name(name)))?;
            staging.write(id, catalog.to_json().pretty(4).as_bytes())?;
        }
    }
    if let Some(dir) = &args.db_dir {
        let arch = match (&args.arch, db.arch_name()) {
            (Some(arch), _) => arch.clone(),
            (None, Some(arch)) => arch.to_string(),
            (None, None) => bail!("{}: no architecture name, pass --arch", path.display()),
        };
        let Some(part) = path.file_stem() else {
            bail!("{}: no file stem", path.display());
        };
        let id = staging.stage(dir.join(arch).join(part).join("tilegrid.json"))?;
        db.write_tilegrid(staging.file(id), schema)?;
    }
    if let Some(id) = fusemap {
        let map = FuseMap::build(&db, args.correct_columns);
        staging.write(id, map.render().as_bytes())?;
    }
    if let Some(id) = cache {
        db.write_to(staging.file(id))?;
    }
    let written = staging.commit()?;
    log::info!("{}: wrote {} files", path.display(), written.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    clilog::init_stderr_color_debug();
    let args = Args::parse();
    log::set_max_level(match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    for path in &args.db {
        if !path.is_file() {
            bail!("File path {} does not exist...", path.display());
        }
    }
    if args.db.len() > 1 && args.has_per_file_outputs() {
        bail!("--tilegrid, --decrypt, --datadir, --fusemap and --cache take a single input file");
    }
    let mut failed = 0;
    for res in args
        .db
        .par_iter()
        .map(|path| {
            decode_one(&args, path)
                .map_err(|e| SimpleError::new(format!("{}: {e}", path.display())))
        })
        .collect::<Vec<_>>()
    {
        if let Err(e) = res {
            log::error!("{e}");
            failed += 1;
        }
    }
    if failed != 0 {
        bail!("{failed} of {} files failed", args.db.len());
    }
    Ok(())
}
