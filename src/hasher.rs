//! Configurable streamed file digests
//!
//! Content addressing hashes each file with one of the supported algorithms.
//! Files are read in fixed-size chunks and fed into an incremental digest
//! context, so memory use stays bounded regardless of file size. Digests are
//! rendered as uppercase hexadecimal strings, which is the form every other
//! component (store sharding, mirror references) consumes.

use crate::error::{CasbakError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Read buffer size for streamed hashing
const CHUNK_SIZE: usize = 8192;

/// Digest algorithms supported for content addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (32 hex characters)
    Md5,
    /// SHA-1 (40 hex characters)
    Sha1,
    /// SHA-224 (56 hex characters)
    Sha224,
    /// SHA-256 (64 hex characters)
    Sha256,
    /// SHA-512 (128 hex characters)
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms, in declaration order
    pub const ALL: &'static [HashAlgorithm] = &[
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Length of the rendered hex digest
    ///
    /// The shard-depth invariant is expressed against this length: splitting
    /// 2-character prefixes off the digest must leave a non-empty file name.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha224 => 56,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = CasbakError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(HashAlgorithm::Md5),
            "SHA1" => Ok(HashAlgorithm::Sha1),
            "SHA224" => Ok(HashAlgorithm::Sha224),
            "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(CasbakError::invalid_config(format!(
                "unknown hash algorithm: {}",
                s
            ))),
        }
    }
}

/// Hash a file's content with the given algorithm
///
/// Streams the file through an incremental digest context in 8 KiB chunks
/// and returns the result as an uppercase hex string. Open and read failures
/// are per-file errors; the caller skips the file and continues the run.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let digest = match algorithm {
        HashAlgorithm::Md5 => digest_file::<Md5>(path),
        HashAlgorithm::Sha1 => digest_file::<Sha1>(path),
        HashAlgorithm::Sha224 => digest_file::<Sha224>(path),
        HashAlgorithm::Sha256 => digest_file::<Sha256>(path),
        HashAlgorithm::Sha512 => digest_file::<Sha512>(path),
    };

    digest.map_err(|source| CasbakError::Hash {
        path: path.to_path_buf(),
        source,
    })
}

/// Stream a file through one concrete digest implementation
fn digest_file<D: Digest>(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}
