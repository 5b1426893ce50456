//! CBC block transforms over the three AES key sizes.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::{BLOCK_SIZE, CipherError};

pub(crate) enum BlockEncryptor {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
}

impl BlockEncryptor {
    pub(crate) fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let bad_key = |_| CipherError::InvalidKeyLength(key.len());
        Ok(match key.len() {
            16 => Self::Aes128(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?),
            24 => Self::Aes192(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?),
            32 => Self::Aes256(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?),
            n => return Err(CipherError::InvalidKeyLength(n)),
        })
    }

    /// Encrypts `buf` in place. `buf.len()` must be a multiple of [`BLOCK_SIZE`].
    pub(crate) fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.encrypt_block_mut(block),
                Self::Aes192(c) => c.encrypt_block_mut(block),
                Self::Aes256(c) => c.encrypt_block_mut(block),
            }
        }
    }
}

pub(crate) enum BlockDecryptor {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
}

impl BlockDecryptor {
    pub(crate) fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let bad_key = |_| CipherError::InvalidKeyLength(key.len());
        Ok(match key.len() {
            16 => Self::Aes128(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?),
            24 => Self::Aes192(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?),
            32 => Self::Aes256(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?),
            n => return Err(CipherError::InvalidKeyLength(n)),
        })
    }

    /// Decrypts `buf` in place. `buf.len()` must be a multiple of [`BLOCK_SIZE`].
    pub(crate) fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.decrypt_block_mut(block),
                Self::Aes192(c) => c.decrypt_block_mut(block),
                Self::Aes256(c) => c.decrypt_block_mut(block),
            }
        }
    }
}
