use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Files are hashed in fixed 64 KiB blocks.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-1 and return the 160-bit digest as lowercase
/// hex. Depends only on file bytes, never on metadata.
pub fn compute(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; BLOCK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
