use std::io::{self, Read};

use sha1::Digest;

use romshelf_dat::Fingerprint;

use crate::handle::FileHandle;

const CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Running CRC32, MD5 and SHA1 state over a byte stream.
struct Digests {
    crc: crc32fast::Hasher,
    md5: md5::Context,
    sha1: sha1::Sha1,
    read: u64,
}

impl Digests {
    fn new() -> Self {
        Self {
            crc: crc32fast::Hasher::new(),
            md5: md5::Context::new(),
            sha1: sha1::Sha1::new(),
            read: 0,
        }
    }

    /// Read until an empty read. Hash state accumulated before an error is
    /// kept.
    fn consume<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<()> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.crc.update(&buf[..n]);
            self.md5.consume(&buf[..n]);
            self.sha1.update(&buf[..n]);
            self.read += n as u64;
        }
    }

    fn finish(self, size: u64, loaded: bool) -> Fingerprint {
        Fingerprint {
            size,
            crc32: format!("{:08x}", self.crc.finalize()),
            md5: format!("{:x}", self.md5.compute()),
            sha1: format!("{:x}", self.sha1.finalize()),
            loaded,
        }
    }
}

/// Fingerprint a byte stream whose expected length is `declared_size`.
///
/// `loaded` is set only if the stream ended cleanly after exactly
/// `declared_size` bytes.
pub fn fingerprint_reader<R: Read + ?Sized>(reader: &mut R, declared_size: u64) -> Fingerprint {
    let mut digests = Digests::new();
    let outcome = digests.consume(reader);
    let read = digests.read;
    match outcome {
        Ok(()) if read == declared_size => digests.finish(declared_size, true),
        Ok(()) => {
            log::error!("read {read} bytes but the declared size is {declared_size}");
            digests.finish(declared_size, false)
        }
        Err(e) => {
            log::error!("read failed after {read} bytes: {e}");
            digests.finish(declared_size, false)
        }
    }
}

/// Fingerprint a file or archive member.
///
/// Any failure to stat, open or read the handle yields a fingerprint with
/// `loaded == false`, which never matches the catalog.
pub fn fingerprint(handle: &FileHandle<'_>) -> Fingerprint {
    log::debug!("hashing {}", handle.location().display());

    let size = match handle.size() {
        Ok(size) => size,
        Err(e) => {
            log::error!(
                "could not get the size of {}: {e}",
                handle.location().display()
            );
            return Digests::new().finish(0, false);
        }
    };

    match handle.read_with(|reader| Ok(fingerprint_reader(reader, size))) {
        Ok(fingerprint) => {
            if fingerprint.loaded {
                log::info!(
                    "scanned {} (size {}, sha1 {})",
                    handle.location().display(),
                    fingerprint.size,
                    fingerprint.sha1
                );
            } else {
                log::error!("{} was not read completely", handle.location().display());
            }
            fingerprint
        }
        Err(e) => {
            log::error!("opening {} failed: {e}", handle.location().display());
            Digests::new().finish(size, false)
        }
    }
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
