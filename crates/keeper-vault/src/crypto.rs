//! AES-256-CBC record encryption with PKCS#7 padding.
//!
//! Every record gets a fresh random 16-byte IV which is prepended to the
//! ciphertext, and the concatenation is base64-encoded. Records are
//! therefore self-describing: decrypting one needs only the master key.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use keeper_core::SecretString;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::keystore::MasterKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// IV length in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// Why a stored record could not be turned back into plaintext.
///
/// Carries no record coordinates; [`CipherFailure::into_vault_error`] attaches
/// them once the caller knows which record it was working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherFailure {
    /// The stored value is not base64 or has an impossible length.
    Corrupt(String),
    /// PKCS#7 padding did not verify after decryption.
    Padding,
    /// Unpadded bytes are not UTF-8; holds the offset of the first bad byte.
    Encoding(usize),
}

impl CipherFailure {
    /// Attach record coordinates.
    pub fn into_vault_error(self, category: &str, identifier: &str) -> VaultError {
        let category = category.to_string();
        let identifier = identifier.to_string();
        match self {
            CipherFailure::Corrupt(reason) => VaultError::CorruptRecord {
                category,
                identifier,
                reason,
            },
            CipherFailure::Padding => VaultError::Padding {
                category,
                identifier,
            },
            CipherFailure::Encoding(offset) => VaultError::Encoding {
                category,
                identifier,
                offset,
            },
        }
    }
}

/// Encrypt `plaintext` under `key` with a freshly drawn IV.
///
/// Returns `base64(iv || ciphertext)`.
pub fn encrypt_record(key: &MasterKey, plaintext: &[u8]) -> String {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = encrypt_with_iv(key, &iv, plaintext);

    let mut framed = Vec::with_capacity(IV_SIZE + ciphertext.len());
    framed.extend_from_slice(&iv);
    framed.extend_from_slice(&ciphertext);
    STANDARD.encode(framed)
}

/// Decrypt a value produced by [`encrypt_record`].
pub fn decrypt_record(
    key: &MasterKey,
    encoded: &str,
) -> std::result::Result<SecretString, CipherFailure> {
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| CipherFailure::Corrupt(format!("base64 decode failed: {e}")))?;

    if decoded.len() < IV_SIZE {
        return Err(CipherFailure::Corrupt(format!(
            "record is {} bytes, shorter than the {IV_SIZE}-byte IV",
            decoded.len()
        )));
    }

    let (iv_bytes, body) = decoded.split_at(IV_SIZE);
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(iv_bytes);

    let plaintext = decrypt_with_iv(key, &iv, body)?;
    SecretString::from_utf8(plaintext.to_vec()).map_err(CipherFailure::Encoding)
}

/// Raw AES-256-CBC encryption with PKCS#7 padding under an explicit IV.
pub(crate) fn encrypt_with_iv(key: &MasterKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Raw AES-256-CBC decryption and PKCS#7 unpadding under an explicit IV.
pub(crate) fn decrypt_with_iv(
    key: &MasterKey,
    iv: &[u8; IV_SIZE],
    body: &[u8],
) -> std::result::Result<Zeroizing<Vec<u8>>, CipherFailure> {
    if body.is_empty() {
        return Err(CipherFailure::Corrupt("record has no ciphertext blocks".to_string()));
    }
    if body.len() % BLOCK_SIZE != 0 {
        return Err(CipherFailure::Corrupt(format!(
            "ciphertext length {} is not a multiple of the {BLOCK_SIZE}-byte block size",
            body.len()
        )));
    }

    Aes256CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map(Zeroizing::new)
        .map_err(|_| CipherFailure::Padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(encoded: &str) -> Vec<u8> {
        STANDARD.decode(encoded).unwrap()
    }

    #[test]
    fn test_round_trip_encrypt_decrypt() {
        let key = MasterKey::generate();
        let encoded = encrypt_record(&key, "seedphrase123,privkeyABC".as_bytes());

        let decrypted = decrypt_record(&key, &encoded).unwrap();
        assert_eq!(decrypted.expose_secret(), "seedphrase123,privkeyABC");
    }

    #[test]
    fn test_layout_is_iv_then_whole_blocks() {
        let key = MasterKey::generate();
        // 16 bytes of input pads to two full blocks.
        let decoded = decode(&encrypt_record(&key, &[b'x'; 16]));
        assert_eq!(decoded.len(), IV_SIZE + 2 * BLOCK_SIZE);

        let decoded = decode(&encrypt_record(&key, b"abc"));
        assert_eq!(decoded.len(), IV_SIZE + BLOCK_SIZE);
    }

    #[test]
    fn test_same_plaintext_different_ciphertext() {
        let key = MasterKey::generate();
        let a = encrypt_record(&key, b"same plaintext");
        let b = encrypt_record(&key, b"same plaintext");

        assert_ne!(a, b);
        assert_ne!(decode(&a)[..IV_SIZE], decode(&b)[..IV_SIZE]);
    }

    #[test]
    fn test_empty_plaintext_works() {
        let key = MasterKey::generate();
        let encoded = encrypt_record(&key, b"");

        assert_eq!(decode(&encoded).len(), IV_SIZE + BLOCK_SIZE);
        assert_eq!(decrypt_record(&key, &encoded).unwrap().expose_secret(), "");
    }

    #[test]
    fn test_unicode_round_trip() {
        let key = MasterKey::generate();
        let text = "助記詞: abandon ability able 🔑";
        let encoded = encrypt_record(&key, text.as_bytes());
        assert_eq!(decrypt_record(&key, &encoded).unwrap().expose_secret(), text);
    }

    #[test]
    fn test_known_answer() {
        // NIST SP 800-38A F.2.5, first block, followed by one block of padding.
        let key = MasterKey::from_bytes(
            hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap()
                .try_into()
                .unwrap(),
        );
        let iv: [u8; IV_SIZE] = hex::decode("000102030405060708090a0b0c0d0e0f")
            .unwrap()
            .try_into()
            .unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = encrypt_with_iv(&key, &iv, &plaintext);
        assert_eq!(ciphertext.len(), 2 * BLOCK_SIZE);
        assert_eq!(
            hex::encode(&ciphertext[..BLOCK_SIZE]),
            "f58c4c04d6e5f1ba779eabfb5f7bfbd6"
        );

        let decrypted = decrypt_with_iv(&key, &iv, &ciphertext).unwrap();
        assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_wrong_key_never_yields_plaintext() {
        let key_a = MasterKey::generate();
        let key_b = MasterKey::generate();
        let encoded = encrypt_record(&key_a, b"sensitive data");

        // A random key passes the padding check about 1 time in 256; the
        // UTF-8 check catches those.
        let result = decrypt_record(&key_b, &encoded);
        assert!(matches!(
            result,
            Err(CipherFailure::Padding) | Err(CipherFailure::Encoding(_))
        ));
    }

    #[test]
    fn test_tampered_padding_detected() {
        let key = MasterKey::generate();
        let mut decoded = decode(&encrypt_record(&key, b"abc"));

        // CBC: flipping IV byte 15 flips plaintext byte 15, the last padding
        // byte (0x0d). 0x0d ^ 0x2d = 0x20, which is larger than a block.
        decoded[IV_SIZE - 1] ^= 0x2d;
        let tampered = STANDARD.encode(&decoded);

        assert_eq!(
            decrypt_record(&key, &tampered).unwrap_err(),
            CipherFailure::Padding
        );
    }

    #[test]
    fn test_short_record_is_corrupt() {
        let key = MasterKey::generate();
        let short = STANDARD.encode([0u8; 10]);
        assert!(matches!(
            decrypt_record(&key, &short),
            Err(CipherFailure::Corrupt(_))
        ));

        let iv_only = STANDARD.encode([0u8; IV_SIZE]);
        assert!(matches!(
            decrypt_record(&key, &iv_only),
            Err(CipherFailure::Corrupt(_))
        ));
    }

    #[test]
    fn test_partial_block_is_corrupt() {
        let key = MasterKey::generate();
        let ragged = STANDARD.encode([0u8; IV_SIZE + BLOCK_SIZE + 3]);
        assert!(matches!(
            decrypt_record(&key, &ragged),
            Err(CipherFailure::Corrupt(_))
        ));
    }

    #[test]
    fn test_surrounding_whitespace_is_corrupt() {
        let key = MasterKey::generate();
        let encoded = encrypt_record(&key, b"seed");

        for altered in [format!(" {encoded}"), format!("{encoded}\n")] {
            assert!(matches!(
                decrypt_record(&key, &altered),
                Err(CipherFailure::Corrupt(_))
            ));
        }
    }

    #[test]
    fn test_non_base64_is_corrupt() {
        let key = MasterKey::generate();
        assert!(matches!(
            decrypt_record(&key, "***not base64***"),
            Err(CipherFailure::Corrupt(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_detected() {
        let key = MasterKey::generate();
        let iv = [9u8; IV_SIZE];
        let ciphertext = encrypt_with_iv(&key, &iv, &[b'o', b'k', 0xff]);

        let mut framed = iv.to_vec();
        framed.extend_from_slice(&ciphertext);
        let encoded = STANDARD.encode(framed);

        assert!(matches!(
            decrypt_record(&key, &encoded),
            Err(CipherFailure::Encoding(2))
        ));
    }
}
