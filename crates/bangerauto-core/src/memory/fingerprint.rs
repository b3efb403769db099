use std::fs::File;
use std::io;
use std::path::Path;

use md5::{Digest, Md5};

use crate::error::Result;

/// Lower-case hex MD5 of a file's contents.
///
/// Version files key their configurations by this value.
pub fn fingerprint_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}
