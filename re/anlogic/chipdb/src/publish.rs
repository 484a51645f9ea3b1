//! Output files are staged next to their destination and only persisted once
//! every output of a decode has been written.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use unnamed_entity::{EntityVec, entity_id};

entity_id! {
    pub id StageId u32;
}

#[derive(Debug)]
struct Staged {
    file: NamedTempFile,
    dest: PathBuf,
}

#[derive(Debug, Default)]
pub struct Staging {
    files: EntityVec<StageId, Staged>,
}

fn parent_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that files can be created in `dir`, creating it if needed.
    pub fn check_dir(dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)?;
        NamedTempFile::new_in(dir)?;
        Ok(())
    }

    /// Creates a temporary file in the directory of `dest`. `dest` must not
    /// be an existing directory.
    pub fn stage(&mut self, dest: impl AsRef<Path>) -> io::Result<StageId> {
        let dest = dest.as_ref().to_path_buf();
        if dest.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: is a directory", dest.display()),
            ));
        }
        let dir = parent_dir(&dest);
        std::fs::create_dir_all(dir)?;
        let file = NamedTempFile::new_in(dir)?;
        Ok(self.files.push(Staged { file, dest }))
    }

    pub fn file(&mut self, id: StageId) -> &mut File {
        self.files[id].file.as_file_mut()
    }

    pub fn write(&mut self, id: StageId, data: &[u8]) -> io::Result<()> {
        self.file(id).write_all(data)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Moves every staged file to its destination. If any move fails, the
    /// files already moved by this call are removed again. Dropping the
    /// staging instead discards them.
    pub fn commit(self) -> io::Result<Vec<PathBuf>> {
        let mut res: Vec<PathBuf> = vec![];
        for staged in self.files.into_values() {
            let Staged { mut file, dest } = staged;
            let persisted = file
                .as_file_mut()
                .flush()
                .and_then(|()| file.persist(&dest).map(drop).map_err(|e| e.error));
            if let Err(e) = persisted {
                for done in &res {
                    if let Err(e) = std::fs::remove_file(done) {
                        log::warn!("cannot remove {}: {e}", done.display());
                    }
                }
                return Err(io::Error::new(e.kind(), format!("{}: {e}", dest.display())));
            }
            log::debug!("wrote {}", dest.display());
            res.push(dest);
        }
        Ok(res)
    }
}
