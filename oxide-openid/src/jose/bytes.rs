//! Byte level helpers shared by signing and encryption.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256, Sha384, Sha512};
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::JoseError;

/// Fill a buffer of `len` bytes from the operating system random source.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, JoseError> {
    let mut result = vec![0; len];
    OsRng
        .try_fill_bytes(result.as_mut_slice())
        .map_err(|_| JoseError::Random)?;
    Ok(result)
}

/// Split a key into its first and second half.
///
/// For odd lengths the second half holds the additional byte.
pub fn split_half(bytes: &[u8]) -> (&[u8], &[u8]) {
    bytes.split_at(bytes.len() / 2)
}

/// The AL value of RFC 7518 section 5.2.2.1.
///
/// The number of bits in the additional authenticated data as a 64-bit big-endian integer.
pub fn al_length(aad: &[u8]) -> [u8; 8] {
    ((aad.len() as u64) * 8).to_be_bytes()
}

/// Compare two byte strings without short-circuiting on the first difference.
///
/// Only the length is compared in variable time.
pub fn constant_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    lhs.ct_eq(rhs).into()
}

/// SHA-2 digest with the given output size in bits, one of 256, 384 or 512.
pub(crate) fn sha2_digest(bits: usize, input: &[u8]) -> Vec<u8> {
    match bits {
        384 => Sha384::digest(input).to_vec(),
        512 => Sha512::digest(input).to_vec(),
        _ => Sha256::digest(input).to_vec(),
    }
}

/// HMAC with SHA-2 of the given output size in bits.
pub(crate) fn hmac_sha2(bits: usize, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, JoseError> {
    fn run<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, JoseError> {
        let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| JoseError::Cipher)?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac.finalize().into_bytes().to_vec())
    }

    match bits {
        384 => run::<Hmac<Sha384>>(key, parts),
        512 => run::<Hmac<Sha512>>(key, parts),
        _ => run::<Hmac<Sha256>>(key, parts),
    }
}

pub(crate) fn b64_encode<T: AsRef<[u8]>>(input: T) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn b64_decode<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, JoseError> {
    Ok(URL_SAFE_NO_PAD.decode(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_has_requested_length() {
        let first = random_bytes(32).unwrap();
        let second = random_bytes(32).unwrap();
        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
        assert!(random_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn halves() {
        let key = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(split_half(&key), (&key[..3], &key[3..]));
        let odd = [1u8, 2, 3];
        assert_eq!(split_half(&odd), (&odd[..1], &odd[1..]));
    }

    #[test]
    fn al_is_bit_length() {
        // Example from RFC 7518, Appendix B.3: 51 octets of AAD.
        let aad = [0u8; 51];
        assert_eq!(al_length(&aad), [0, 0, 0, 0, 0, 0, 1, 152]);
        assert_eq!(al_length(&[]), [0; 8]);
    }

    #[test]
    fn compare() {
        assert!(constant_time_eq(b"tag", b"tag"));
        assert!(!constant_time_eq(b"tag", b"tab"));
        assert!(!constant_time_eq(b"tag", b"tags"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn hmac_sizes() {
        let key = b"key";
        assert_eq!(hmac_sha2(256, key, &[b"a", b"b"]).unwrap().len(), 32);
        assert_eq!(hmac_sha2(384, key, &[b"ab"]).unwrap().len(), 48);
        assert_eq!(
            hmac_sha2(512, key, &[b"a", b"b"]).unwrap(),
            hmac_sha2(512, key, &[b"ab"]).unwrap()
        );
        assert_eq!(sha2_digest(384, b"").len(), 48);
    }

    #[test]
    fn url_safe_without_padding() {
        assert_eq!(b64_encode([0xfbu8, 0xff]), "-_8");
        assert_eq!(b64_decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(b64_decode("+/8=").is_err());
    }
}
