use crate::error::VariableError;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [Self; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String, VariableError> {
    let file = File::open(path).map_err(|err| VariableError::io(path, err))?;
    let mut reader = BufReader::new(file);
    let digest = match algorithm {
        HashAlgorithm::Md5 => digest_reader::<Md5>(&mut reader),
        HashAlgorithm::Sha1 => digest_reader::<Sha1>(&mut reader),
        HashAlgorithm::Sha256 => digest_reader::<Sha256>(&mut reader),
        HashAlgorithm::Sha512 => digest_reader::<Sha512>(&mut reader),
    };
    digest.map_err(|err| VariableError::io(path, err))
}

fn digest_reader<D: Digest + Write>(reader: &mut impl Read) -> io::Result<String> {
    let mut hasher = D::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
