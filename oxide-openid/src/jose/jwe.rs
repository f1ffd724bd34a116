//! Compact JSON web encryption (RFC 7516) with RSA key wrapping and AES-CBC-HMAC-SHA2 content
//! encryption.
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt};
use sha1::Sha1;
use sha2::Sha256;

use super::algorithm::{JweAlg, JweEnc, KeyAlgorithm};
use super::bytes::{al_length, b64_decode, b64_encode, constant_time_eq, hmac_sha2, random_bytes, split_half};
use super::key::JsonWebKey;
use super::JoseError;

const IV_LEN: usize = 16;

/// The protected header of an encrypted token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    /// The key management algorithm.
    pub alg: JweAlg,

    /// The content encryption algorithm.
    pub enc: JweEnc,

    /// The id of the recipient key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Content type, `JWT` for nested tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

/// Encrypt a plaintext for the holder of `key`.
///
/// Only the public part of the key is needed.
pub fn encrypt(plaintext: &[u8], alg: JweAlg, enc: JweEnc, key: &JsonWebKey) -> Result<String, JoseError> {
    check_key(alg, key)?;
    let public = key
        .rsa_public_key()
        .ok_or(JoseError::AlgorithmMismatch(alg.as_str()))?;

    let header = JweHeader {
        alg,
        enc,
        kid: Some(key.kid().to_string()),
        cty: Some("JWT".to_string()),
    };
    let protected = b64_encode(serde_json::to_vec(&header)?);

    let cek = random_bytes(enc.key_len())?;
    let encrypted_key = match alg {
        JweAlg::Rsa1_5 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, &cek)?,
        JweAlg::RsaOaep => public.encrypt(&mut OsRng, Oaep::new::<Sha1>(), &cek)?,
        JweAlg::RsaOaep256 => public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek)?,
    };

    let iv = random_bytes(IV_LEN)?;
    let (ciphertext, tag) = seal(enc, &cek, &iv, protected.as_bytes(), plaintext)?;

    Ok([
        protected,
        b64_encode(encrypted_key),
        b64_encode(iv),
        b64_encode(ciphertext),
        b64_encode(tag),
    ]
    .join("."))
}

/// Decrypt a compact JWE with the private `key`.
pub fn decrypt(token: &str, key: &JsonWebKey) -> Result<(JweHeader, Vec<u8>), JoseError> {
    let parts = token.split('.').collect::<Vec<_>>();
    if parts.len() != 5 {
        return Err(JoseError::Malformed("expected five segments"));
    }

    let protected = parts[0];
    let header: JweHeader = serde_json::from_slice(&b64_decode(protected)?)?;
    check_key(header.alg, key)?;
    let private = key.rsa_private_key()?;

    let encrypted_key = b64_decode(parts[1])?;
    let iv = b64_decode(parts[2])?;
    let ciphertext = b64_decode(parts[3])?;
    let tag = b64_decode(parts[4])?;
    if iv.len() != IV_LEN {
        return Err(JoseError::Malformed("initialization vector length"));
    }

    let cek = match header.alg {
        // RFC 3218 section 2.3.2: a failed unwrap continues with a random key so the only
        // observable failure is the tag check.
        JweAlg::Rsa1_5 => match private.decrypt(Pkcs1v15Encrypt, &encrypted_key) {
            Ok(cek) if cek.len() == header.enc.key_len() => cek,
            _ => random_bytes(header.enc.key_len())?,
        },
        JweAlg::RsaOaep => private.decrypt(Oaep::new::<Sha1>(), &encrypted_key)?,
        JweAlg::RsaOaep256 => private.decrypt(Oaep::new::<Sha256>(), &encrypted_key)?,
    };
    if cek.len() != header.enc.key_len() {
        return Err(JoseError::Malformed("content encryption key length"));
    }

    let plaintext = open(header.enc, &cek, &iv, protected.as_bytes(), &ciphertext, &tag)?;
    Ok((header, plaintext))
}

/// If the string has the shape of a compact JWE, five segments.
pub fn is_jwe(token: &str) -> bool {
    token.split('.').count() == 5
}

/// Authenticated encryption of RFC 7518 section 5.2.2.1.
fn seal(enc: JweEnc, cek: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), JoseError> {
    let (mac_key, enc_key) = split_half(cek);
    let ciphertext = match enc {
        JweEnc::A128CbcHs256 => cbc_encryptor::<Aes128>(enc_key, iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        JweEnc::A192CbcHs384 => cbc_encryptor::<Aes192>(enc_key, iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        JweEnc::A256CbcHs512 => cbc_encryptor::<Aes256>(enc_key, iv)?.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    let tag = tag(enc, mac_key, aad, iv, &ciphertext)?;
    Ok((ciphertext, tag))
}

fn open(enc: JweEnc, cek: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>, JoseError> {
    let (mac_key, enc_key) = split_half(cek);
    let expected = self::tag(enc, mac_key, aad, iv, ciphertext)?;
    if !constant_time_eq(&expected, tag) {
        return Err(JoseError::InvalidTag);
    }

    let plaintext = match enc {
        JweEnc::A128CbcHs256 => cbc_decryptor::<Aes128>(enc_key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        JweEnc::A192CbcHs384 => cbc_decryptor::<Aes192>(enc_key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        JweEnc::A256CbcHs512 => cbc_decryptor::<Aes256>(enc_key, iv)?.decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| JoseError::Cipher)
}

/// The first half of HMAC(mac_key, AAD || IV || ciphertext || AL).
fn tag(enc: JweEnc, mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, JoseError> {
    let al = al_length(aad);
    let mut full = hmac_sha2(enc.key_bits(), mac_key, &[aad, iv, ciphertext, &al])?;
    full.truncate(enc.key_len() / 2);
    Ok(full)
}

fn cbc_encryptor<C>(key: &[u8], iv: &[u8]) -> Result<cbc::Encryptor<C>, JoseError>
where
    cbc::Encryptor<C>: KeyIvInit,
    C: BlockEncryptMut + cbc::cipher::BlockCipher,
{
    cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(|_| JoseError::Cipher)
}

fn cbc_decryptor<C>(key: &[u8], iv: &[u8]) -> Result<cbc::Decryptor<C>, JoseError>
where
    cbc::Decryptor<C>: KeyIvInit,
    C: BlockDecryptMut + cbc::cipher::BlockCipher,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(|_| JoseError::Cipher)
}

fn check_key(alg: JweAlg, key: &JsonWebKey) -> Result<(), JoseError> {
    if key.algorithm() == KeyAlgorithm::Encrypt(alg) {
        Ok(())
    } else {
        Err(JoseError::AlgorithmMismatch(alg.as_str()))
    }
}
