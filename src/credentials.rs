use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;
/// Length of a 16-byte salt written as padded base64 by older account files.
const BASE64_SALT_LEN: usize = 24;

/// Salted SHA-256 password hash, hex encoded.
///
/// New salts are hex; salts from older account files are padded base64 and
/// still verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub password_hash: String,
    pub salt: String,
}

impl Credentials {
    pub fn from_password(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        Self {
            password_hash: hash_password(&salt, password),
            salt: hex::encode(salt),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        match decode_salt(&self.salt) {
            Some(salt) => hash_password(&salt, password) == self.password_hash,
            None => false,
        }
    }
}

fn decode_salt(salt: &str) -> Option<Vec<u8>> {
    if salt.len() == BASE64_SALT_LEN && salt.ends_with("==") {
        return STANDARD.decode(salt).ok();
    }
    hex::decode(salt).ok()
}

fn hash_password(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
