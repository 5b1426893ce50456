use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use tracing::trace;
use zeroize::Zeroizing;

use crate::block::{BlockDecryptor, BlockEncryptor};
use crate::{BLOCK_SIZE, CipherError, DEFAULT_READ_SIZE, KEY_SIZES};

/// AES-CBC stream cipher bound to one key and IV.
///
/// Input is consumed in `read_size` pieces. Bytes that do not fill a whole
/// block are carried over to the next read, so the output is independent of
/// how the reader happens to split the data. PKCS#7 padding is added exactly
/// once, after the reader reports end of input.
pub struct StreamCipher {
    key: Zeroizing<Vec<u8>>,
    iv: [u8; BLOCK_SIZE],
    read_size: usize,
}

impl StreamCipher {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        if !KEY_SIZES.contains(&key.len()) {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        let iv: [u8; BLOCK_SIZE] = iv
            .try_into()
            .map_err(|_| CipherError::InvalidIvLength(iv.len()))?;
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
            iv,
            read_size: DEFAULT_READ_SIZE,
        })
    }

    /// Overrides the read granularity. Zero is treated as one.
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size.max(1);
        self
    }

    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// Encrypts `reader` to EOF into `writer`. Returns ciphertext bytes written.
    pub fn encrypt<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<u64, CipherError> {
        let mut enc = BlockEncryptor::new(&self.key, &self.iv)?;
        let mut buf = vec![0u8; self.read_size + BLOCK_SIZE];
        let mut pending = 0usize;
        let mut written = 0u64;

        loop {
            let n = read_some(&mut reader, &mut buf[pending..pending + self.read_size])?;
            if n == 0 {
                break;
            }
            pending += n;

            let whole = pending - pending % BLOCK_SIZE;
            if whole > 0 {
                enc.encrypt_blocks(&mut buf[..whole]);
                writer.write_all(&buf[..whole])?;
                written += whole as u64;
                buf.copy_within(whole..pending, 0);
                pending -= whole;
            }
        }

        // pending < BLOCK_SIZE here; a full pad block when it is zero.
        let pad = BLOCK_SIZE - pending;
        buf[pending..BLOCK_SIZE].fill(pad as u8);
        enc.encrypt_blocks(&mut buf[..BLOCK_SIZE]);
        writer.write_all(&buf[..BLOCK_SIZE])?;
        written += BLOCK_SIZE as u64;
        writer.flush()?;

        trace!(bytes = written, "encrypted stream");
        Ok(written)
    }

    /// Decrypts `reader` to EOF into `writer`. Returns plaintext bytes written.
    ///
    /// The final block is held back until EOF so its padding can be checked
    /// and stripped.
    pub fn decrypt<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<u64, CipherError> {
        let mut dec = BlockDecryptor::new(&self.key, &self.iv)?;
        let mut buf = vec![0u8; self.read_size + BLOCK_SIZE];
        let mut pending = 0usize;
        let mut consumed = 0u64;
        let mut written = 0u64;

        loop {
            let n = read_some(&mut reader, &mut buf[pending..pending + self.read_size])?;
            if n == 0 {
                break;
            }
            consumed += n as u64;
            pending += n;

            let ready = if pending % BLOCK_SIZE == 0 {
                pending - BLOCK_SIZE
            } else {
                pending - pending % BLOCK_SIZE
            };
            if ready > 0 {
                dec.decrypt_blocks(&mut buf[..ready]);
                writer.write_all(&buf[..ready])?;
                written += ready as u64;
                buf.copy_within(ready..pending, 0);
                pending -= ready;
            }
        }

        if pending != BLOCK_SIZE {
            return Err(CipherError::TruncatedCiphertext(consumed));
        }

        let last = &mut buf[..BLOCK_SIZE];
        dec.decrypt_blocks(last);
        let pad = usize::from(last[BLOCK_SIZE - 1]);
        if pad == 0 || pad > BLOCK_SIZE || last[BLOCK_SIZE - pad..].iter().any(|&b| usize::from(b) != pad) {
            return Err(CipherError::InvalidPadding);
        }
        writer.write_all(&last[..BLOCK_SIZE - pad])?;
        written += (BLOCK_SIZE - pad) as u64;
        writer.flush()?;

        trace!(bytes = written, "decrypted stream");
        Ok(written)
    }
}

impl fmt::Debug for StreamCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCipher")
            .field("key_bits", &(self.key.len() * 8))
            .field("read_size", &self.read_size)
            .finish_non_exhaustive()
    }
}

/// `Read::read` that retries on `Interrupted`.
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padded_len;

    const KEY: [u8; 32] = [0x42; 32];
    const IV: [u8; 16] = [0x24; 16];

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    fn seal(cipher: &StreamCipher, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let n = cipher.encrypt(data, &mut out).unwrap();
        assert_eq!(n, out.len() as u64);
        out
    }

    fn open(cipher: &StreamCipher, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut out = Vec::new();
        let n = cipher.decrypt(data, &mut out)?;
        assert_eq!(n, out.len() as u64);
        Ok(out)
    }

    /// Hands out at most `step` bytes per read and interrupts every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn roundtrip_at_block_edges() {
        for len in [0, 1, 15, 16, 17, 1000, 1024, 1025] {
            let cipher = StreamCipher::new(&KEY, &IV).unwrap();
            let data = sample(len);
            let sealed = seal(&cipher, &data);
            assert_eq!(sealed.len() as u64, padded_len(len as u64), "len {len}");
            assert_eq!(open(&cipher, &sealed).unwrap(), data, "len {len}");
        }
    }

    #[test]
    fn roundtrip_ten_mib_with_unaligned_reads() {
        let cipher = StreamCipher::new(&KEY, &IV).unwrap().with_read_size(1000);
        let data = sample(10 * 1024 * 1024);
        let sealed = seal(&cipher, &data);
        assert_eq!(sealed.len(), data.len() + BLOCK_SIZE);
        assert_eq!(open(&cipher, &sealed).unwrap(), data);
    }

    #[test]
    fn ciphertext_does_not_depend_on_read_size() {
        let data = sample(5000);
        let reference = seal(&StreamCipher::new(&KEY, &IV).unwrap(), &data);
        for read_size in [1, 7, 16, 1000, 4096] {
            let cipher = StreamCipher::new(&KEY, &IV).unwrap().with_read_size(read_size);
            assert_eq!(seal(&cipher, &data), reference, "read_size {read_size}");
        }
    }

    #[test]
    fn short_and_interrupted_reads_are_tolerated() {
        let cipher = StreamCipher::new(&KEY, &IV).unwrap();
        let data = sample(3001);
        let reference = seal(&cipher, &data);

        let mut sealed = Vec::new();
        cipher
            .encrypt(Trickle { data: &data, step: 5, interrupt: false }, &mut sealed)
            .unwrap();
        assert_eq!(sealed, reference);

        let mut opened = Vec::new();
        cipher
            .decrypt(Trickle { data: &sealed, step: 3, interrupt: false }, &mut opened)
            .unwrap();
        assert_eq!(opened, data);
    }

    #[test]
    fn empty_input_is_one_padding_block() {
        let cipher = StreamCipher::new(&KEY[..16], &IV).unwrap();
        let sealed = seal(&cipher, &[]);
        assert_eq!(sealed.len(), BLOCK_SIZE);
        assert!(open(&cipher, &sealed).unwrap().is_empty());
    }

    #[test]
    fn tampered_padding_is_rejected() {
        let cipher = StreamCipher::new(&KEY, &IV).unwrap();
        let mut sealed = seal(&cipher, &sample(16));
        assert_eq!(sealed.len(), 32);
        // Final plaintext block is 16 x 0x10; flip its last byte to 0x11.
        sealed[15] ^= 0x10 ^ 0x11;
        assert!(matches!(open(&cipher, &sealed), Err(CipherError::InvalidPadding)));
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let cipher = StreamCipher::new(&KEY, &IV).unwrap();
        let sealed = seal(&cipher, &sample(100));
        let cut = &sealed[..sealed.len() - 3];
        assert!(matches!(
            open(&cipher, cut),
            Err(CipherError::TruncatedCiphertext(n)) if n == cut.len() as u64
        ));
        assert!(matches!(open(&cipher, &[]), Err(CipherError::TruncatedCiphertext(0))));
    }

    #[test]
    fn wrong_key_fails_padding_or_garbles() {
        let data = sample(64);
        let sealed = seal(&StreamCipher::new(&KEY, &IV).unwrap(), &data);
        let other = StreamCipher::new(&[0x43; 32], &IV).unwrap();
        match open(&other, &sealed) {
            Err(CipherError::InvalidPadding) => {}
            Ok(garbled) => assert_ne!(garbled, data),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn key_and_iv_lengths_are_validated() {
        for len in [16, 24, 32] {
            assert!(StreamCipher::new(&vec![1u8; len], &IV).is_ok());
        }
        assert!(matches!(
            StreamCipher::new(&[1u8; 31], &IV),
            Err(CipherError::InvalidKeyLength(31))
        ));
        assert!(matches!(
            StreamCipher::new(&KEY, &[0u8; 17]),
            Err(CipherError::InvalidIvLength(17))
        ));
        assert_eq!(StreamCipher::new(&KEY, &IV).unwrap().with_read_size(0).read_size(), 1);
    }

    #[test]
    fn debug_does_not_leak_key() {
        let cipher = StreamCipher::new(&KEY, &IV).unwrap();
        let rendered = format!("{cipher:?}");
        assert!(rendered.contains("key_bits: 256"));
        assert!(!rendered.contains("66"));
    }
}
