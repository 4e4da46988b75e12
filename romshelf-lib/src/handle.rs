use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::HandleError;

/// An archive opened once for all of its members.
pub type SharedArchive = RefCell<ZipArchive<File>>;

/// A byte source that can be hashed and relocated: a plain file on disk or a
/// member of a ZIP archive.
#[derive(Debug)]
pub enum FileHandle<'a> {
    Plain(PathBuf),
    Member(ArchiveMember<'a>),
}

/// A non-directory entry of an open ZIP archive.
pub struct ArchiveMember<'a> {
    pub archive: &'a SharedArchive,
    pub archive_path: PathBuf,
    pub index: usize,
    /// Full entry name inside the archive, e.g. `dir/game.adf`
    pub name: String,
    /// Uncompressed size from the central directory
    pub size: u64,
}

impl std::fmt::Debug for ArchiveMember<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveMember")
            .field("archive_path", &self.archive_path)
            .field("index", &self.index)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

/// What [`FileHandle::rename`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// The source file is gone and now lives at the destination.
    Moved,
    /// The archive member was copied out; the archive is unchanged.
    Extracted,
}

impl FileHandle<'_> {
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        Self::Plain(path.into())
    }

    /// Size reported by the file system or the archive directory.
    pub fn size(&self) -> io::Result<u64> {
        match self {
            Self::Plain(path) => Ok(fs::metadata(path)?.len()),
            Self::Member(member) => Ok(member.size),
        }
    }

    /// Path used in reports and logs. Archive members are keyed as
    /// `archive.zip/member/path`.
    pub fn location(&self) -> PathBuf {
        match self {
            Self::Plain(path) => path.clone(),
            Self::Member(member) => member.archive_path.join(&member.name),
        }
    }

    /// Last component of the location.
    pub fn file_name(&self) -> String {
        match self {
            Self::Plain(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Member(member) => member
                .name
                .rsplit('/')
                .next()
                .unwrap_or(&member.name)
                .to_string(),
        }
    }

    /// Open the byte stream, hand it to `f` and close it again. The stream
    /// is dropped on every exit path.
    pub fn read_with<T>(
        &self,
        f: impl FnOnce(&mut dyn Read) -> io::Result<T>,
    ) -> Result<T, HandleError> {
        match self {
            Self::Plain(path) => {
                let mut file = File::open(path)?;
                Ok(f(&mut file)?)
            }
            Self::Member(member) => {
                let mut archive = member.archive.borrow_mut();
                let mut entry = archive.by_index(member.index)?;
                Ok(f(&mut entry)?)
            }
        }
    }

    /// Move the file to `dest`. Falls back to copy and remove when the
    /// destination is on another file system. Archive members are only
    /// extracted.
    pub fn rename(&self, dest: &Path) -> Result<Transfer, HandleError> {
        match self {
            Self::Plain(path) => match fs::rename(path, dest) {
                Ok(()) => Ok(Transfer::Moved),
                Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                    log::debug!(
                        "{} is on another file system, copying to {}",
                        path.display(),
                        dest.display()
                    );
                    write_into_place(dest, |tmp| fs::copy(path, tmp).map(|_| ()))?;
                    fs::remove_file(path)?;
                    Ok(Transfer::Moved)
                }
                Err(e) => Err(e.into()),
            },
            Self::Member(_) => {
                write_into_place(dest, |tmp| {
                    self.read_with(|reader| {
                        let mut out = File::create(tmp)?;
                        io::copy(reader, &mut out)?;
                        out.sync_all()
                    })
                })?;
                log::warn!(
                    "Moving an archive member is not supported, {} was only extracted to {}",
                    self.location().display(),
                    dest.display()
                );
                Ok(Transfer::Extracted)
            }
        }
    }

    /// Remove the file. Archive members can not be removed.
    pub fn delete(&self) -> Result<(), HandleError> {
        match self {
            Self::Plain(path) => Ok(fs::remove_file(path)?),
            Self::Member(_) => {
                let location = self.location();
                log::warn!(
                    "Deleting an archive member is not supported, {} skipped",
                    location.display()
                );
                Err(HandleError::unsupported(format!(
                    "delete archive member {}",
                    location.display()
                )))
            }
        }
    }
}

/// Produce `dest` through a sibling `.part` file. A failed write leaves
/// nothing at `dest`.
fn write_into_place<E>(
    dest: &Path,
    write: impl FnOnce(&Path) -> Result<(), E>,
) -> Result<(), HandleError>
where
    HandleError: From<E>,
{
    let mut tmp_name = dest.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".part");
    let tmp = dest.with_file_name(tmp_name);

    let result = write(&tmp)
        .map_err(HandleError::from)
        .and_then(|()| Ok(fs::rename(&tmp, dest)?));
    if result.is_err() && tmp.exists() {
        if let Err(e) = fs::remove_file(&tmp) {
            log::warn!("could not remove {}: {e}", tmp.display());
        }
    }
    result
}
