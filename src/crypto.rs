use crate::constants::*;
use crate::error::KrbError;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut};
use aes::Aes256;
use des::{Des, TdesEde3};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use tracing::error;
use zeroize::{Zeroize, Zeroizing};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
#[cfg(test)]
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

type Des3CbcEnc = cbc::Encryptor<TdesEde3>;
type Des3CbcDec = cbc::Decryptor<TdesEde3>;

type Aes256Block = GenericArray<u8, <aes::Aes256 as aes::cipher::BlockSizeUser>::BlockSize>;

type HmacSha1 = Hmac<Sha1>;

// Ki and Ke derivation constants are the key usage followed by one of these.
const DK_KE: u8 = 0xAA;
const DK_KI: u8 = 0x55;
#[cfg(test)]
const DK_KC: u8 = 0x99;

/// RFC 3961 section 5.1 n-fold. Stretches or shrinks `input` to `out_len` bytes by
/// summing rotated copies of it with ones-complement addition.
pub(crate) fn n_fold(input: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_len];
    let in_len = input.len();
    if in_len == 0 || out_len == 0 {
        return out;
    }

    let (mut a, mut b) = (out_len, in_len);
    while b != 0 {
        let c = b;
        b = a % b;
        a = c;
    }
    let lcm = out_len * in_len / a;
    let in_bits = in_len << 3;

    let mut carry: usize = 0;
    for i in (0..lcm).rev() {
        // The bit of the rotated input copy that lands on the lsb of out[i % out_len].
        let msbit = ((in_bits - 1)
            + ((in_bits + 13) * (i / in_len))
            + ((in_len - (i % in_len)) << 3))
            % in_bits;

        let hi = input[((in_len - 1) - (msbit >> 3)) % in_len] as usize;
        let lo = input[(in_len - (msbit >> 3)) % in_len] as usize;
        carry += (((hi << 8) | lo) >> ((msbit & 7) + 1)) & 0xff;

        carry += out[i % out_len] as usize;
        out[i % out_len] = (carry & 0xff) as u8;
        carry >>= 8;
    }

    // End around carry.
    if carry != 0 {
        for byte in out.iter_mut().rev() {
            carry += *byte as usize;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
    }

    out
}

/// Derive an aes256-cts-hmac-sha1-96 key from a passphrase and salt. The salt is
/// normally the realm concatenated with the principal's name components.
pub(crate) fn derive_key_aes256_cts_hmac_sha1_96(
    passphrase: &[u8],
    salt: &[u8],
    iter_count: u32,
) -> Result<[u8; AES_256_KEY_LEN], KrbError> {
    if iter_count == 0 {
        return Err(KrbError::InsecurePassphrase);
    }

    let mut buf = Zeroizing::new([0u8; AES_256_KEY_LEN]);
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, buf.as_mut());

    Ok(dk_aes_256(&buf, b"kerberos"))
}

fn dk_aes_256(key: &[u8; AES_256_KEY_LEN], constant: &[u8]) -> [u8; AES_256_KEY_LEN] {
    use aes::cipher::KeyInit;

    let folded = n_fold(constant, AES_BLOCK_SIZE);
    let cipher = Aes256::new(key.into());

    let mut out = [0u8; AES_256_KEY_LEN];
    let (lower, upper) = out.split_at_mut(AES_BLOCK_SIZE);
    cipher.encrypt_block_b2b(
        GenericArray::from_slice(&folded),
        GenericArray::from_mut_slice(lower),
    );
    cipher.encrypt_block_b2b(
        GenericArray::from_slice(lower),
        GenericArray::from_mut_slice(upper),
    );
    out
}

fn dk_usage_aes_256(
    key: &[u8; AES_256_KEY_LEN],
    key_usage: i32,
    kind: u8,
) -> Zeroizing<[u8; AES_256_KEY_LEN]> {
    let mut constant = [0u8; 5];
    constant[..4].copy_from_slice(&key_usage.to_be_bytes());
    constant[4] = kind;
    Zeroizing::new(dk_aes_256(key, &constant))
}

/// Given the base key and the key_usage value decrypt and authenticate the provided
/// ciphertext. The confounder is removed from the returned plaintext.
pub(crate) fn decrypt_aes256_cts_hmac_sha1_96(
    key: &[u8; AES_256_KEY_LEN],
    ciphertext: &[u8],
    key_usage: i32,
) -> Result<Zeroizing<Vec<u8>>, KrbError> {
    let Some((ciphertext, msg_hmac)) = ciphertext.split_last_chunk::<SHA1_HMAC_LEN>() else {
        return Err(KrbError::InsufficientData);
    };

    if ciphertext.is_empty() {
        return Err(KrbError::MessageEmpty);
    }

    let ki = dk_usage_aes_256(key, key_usage, DK_KI);
    let ke = dk_usage_aes_256(key, key_usage, DK_KE);

    let mut plaintext = decrypt_aes256_cts(&ke, ciphertext)?;

    let mut mac =
        HmacSha1::new_from_slice(ki.as_ref()).map_err(|_| KrbError::InvalidHmacSha1Key)?;
    mac.update(&plaintext);
    mac.verify_truncated_left(msg_hmac).map_err(|_| {
        error!("ciphertext integrity check failed");
        KrbError::MessageAuthenticationFailed
    })?;

    // Drop the confounder.
    Ok(Zeroizing::new(plaintext.split_off(AES_BLOCK_SIZE)))
}

/// Only needed to build encrypted fixtures.
#[cfg(test)]
pub(crate) fn encrypt_aes256_cts_hmac_sha1_96(
    key: &[u8; AES_256_KEY_LEN],
    plaintext: &[u8],
    key_usage: i32,
) -> Result<Vec<u8>, KrbError> {
    use rand::Rng;

    if plaintext.is_empty() {
        return Err(KrbError::PlaintextEmpty);
    };
    let ki = dk_usage_aes_256(key, key_usage, DK_KI);
    let ke = dk_usage_aes_256(key, key_usage, DK_KE);

    let mut confounder = [0u8; AES_BLOCK_SIZE];
    rand::rng().fill(&mut confounder);

    let mut mac =
        HmacSha1::new_from_slice(ki.as_ref()).map_err(|_| KrbError::InvalidHmacSha1Key)?;
    mac.update(&confounder);
    mac.update(plaintext);
    let tag = mac.finalize().into_bytes();

    let mut ciphertext = vec![0u8; AES_BLOCK_SIZE + plaintext.len() + SHA1_HMAC_LEN];
    let (cipher, hmac) = ciphertext.split_at_mut(AES_BLOCK_SIZE + plaintext.len());

    encrypt_aes256_cts(&ke, &confounder, plaintext, cipher)?;
    hmac.copy_from_slice(&tag[..SHA1_HMAC_LEN]);

    Ok(ciphertext)
}

// CBC over the confounder and plaintext, with the last two blocks swapped and the
// final block truncated (NIST SP800-38A CS3).
#[cfg(test)]
fn encrypt_aes256_cts(
    key: &[u8; AES_256_KEY_LEN],
    confounder: &[u8],
    plaintext: &[u8],
    ciphertext: &mut [u8],
) -> Result<(), KrbError> {
    use aes::cipher::{KeyInit, KeyIvInit};

    debug_assert!(ciphertext.len() == plaintext.len() + AES_BLOCK_SIZE);

    let mut ciphertext_chunks = ciphertext.chunks_mut(AES_BLOCK_SIZE);
    let mut previous_chunk = ciphertext_chunks.next().ok_or(KrbError::InsufficientData)?;

    let mut chunks = std::iter::zip(ciphertext_chunks, plaintext.chunks(AES_BLOCK_SIZE));
    let (last_chunk, last_plain) = chunks.next_back().ok_or(KrbError::InsufficientData)?;

    let mut cipher = Aes256CbcEnc::new(key.into(), &IV_ZERO.into());

    let mut block = [0u8; AES_BLOCK_SIZE];
    block.copy_from_slice(confounder);
    cipher.encrypt_block_mut((&mut block).into());
    previous_chunk.copy_from_slice(&block);

    for (cipher_chunk, plain_chunk) in chunks {
        block.copy_from_slice(plain_chunk);
        cipher.encrypt_block_mut((&mut block).into());
        cipher_chunk.copy_from_slice(&block);
        previous_chunk = cipher_chunk;
    }

    // block now holds Cn-1.
    let tail_len = last_plain.len();
    let mut c_n: Aes256Block = [0u8; AES_BLOCK_SIZE].into();
    let (p_n, c_n_pad) = c_n.split_at_mut(tail_len);
    p_n.copy_from_slice(last_plain);
    c_n_pad.copy_from_slice(&block[tail_len..]);
    for (p, c) in p_n.iter_mut().zip(block.iter()) {
        *p ^= c;
    }

    Aes256::new(key.into()).encrypt_block(&mut c_n);

    previous_chunk.copy_from_slice(&c_n);
    last_chunk.copy_from_slice(&block[..tail_len]);

    Ok(())
}

fn decrypt_aes256_cts(
    key: &[u8; AES_256_KEY_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KrbError> {
    use aes::cipher::{KeyInit, KeyIvInit};

    // The first block is always the confounder, so a short message is corrupt.
    if ciphertext.len() <= AES_BLOCK_SIZE {
        return Err(KrbError::CtsCiphertextInvalid);
    }

    let mut cipher = Aes256CbcDec::new(key.into(), &IV_ZERO.into());

    let mut plaintext = Zeroizing::new(vec![0u8; ciphertext.len()]);

    let mut chunks = std::iter::zip(
        ciphertext.chunks(AES_BLOCK_SIZE),
        plaintext.chunks_mut(AES_BLOCK_SIZE),
    );

    // The final (possibly partial) block, and the full block before it. On the
    // wire these hold Cn-1 and Cn respectively.
    let (c_n1_chunk, p_n_chunk) = chunks.next_back().ok_or(KrbError::InsufficientData)?;
    let (c_n_chunk, p_n1_chunk) = chunks.next_back().ok_or(KrbError::InsufficientData)?;

    for (cipher_chunk, plain_chunk) in chunks {
        cipher.decrypt_block_b2b_mut(cipher_chunk.into(), plain_chunk.into())
    }

    // Decrypting Cn gives Z. Pn is the head of Z xor Cn-1*, and the tail of Z
    // completes Cn-1 which then finishes the CBC chain.
    let mut z: Aes256Block = [0u8; AES_BLOCK_SIZE].into();
    Aes256::new(key.into()).decrypt_block_b2b(c_n_chunk.into(), &mut z);

    let tail_len = c_n1_chunk.len();
    let (z_head, z_tail) = z.split_at(tail_len);

    for ((p, c), zb) in p_n_chunk.iter_mut().zip(c_n1_chunk.iter()).zip(z_head.iter()) {
        *p = c ^ zb;
    }

    let mut c_n1: Aes256Block = [0u8; AES_BLOCK_SIZE].into();
    let (c_n1_head, c_n1_tail) = c_n1.split_at_mut(tail_len);
    c_n1_head.copy_from_slice(c_n1_chunk);
    c_n1_tail.copy_from_slice(z_tail);

    cipher.decrypt_block_b2b_mut(&c_n1, p_n1_chunk.into());

    z.as_mut_slice().zeroize();

    Ok(plaintext)
}

/// Legacy propagating CBC. The key doubles as the initial chaining value, and the
/// data is enciphered in place. `data` must be a whole number of blocks.
pub(crate) fn encrypt_des_pcbc(key: &[u8; DES_KEY_LEN], data: &mut [u8]) -> Result<(), KrbError> {
    use des::cipher::KeyInit;

    if data.len() % DES_BLOCK_SIZE != 0 {
        return Err(KrbError::BlockAlignment);
    }

    let cipher = Des::new(GenericArray::from_slice(key));
    let mut chain = Zeroizing::new(*key);
    let mut plain = Zeroizing::new([0u8; DES_BLOCK_SIZE]);

    for block in data.chunks_exact_mut(DES_BLOCK_SIZE) {
        plain.copy_from_slice(block);
        for (b, c) in block.iter_mut().zip(chain.iter()) {
            *b ^= c;
        }
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        for ((c, p), b) in chain.iter_mut().zip(plain.iter()).zip(block.iter()) {
            *c = p ^ b;
        }
    }

    Ok(())
}

pub(crate) fn decrypt_des_pcbc(key: &[u8; DES_KEY_LEN], data: &mut [u8]) -> Result<(), KrbError> {
    use des::cipher::KeyInit;

    if data.len() % DES_BLOCK_SIZE != 0 {
        return Err(KrbError::BlockAlignment);
    }

    let cipher = Des::new(GenericArray::from_slice(key));
    let mut chain = Zeroizing::new(*key);
    let mut enciphered = [0u8; DES_BLOCK_SIZE];

    for block in data.chunks_exact_mut(DES_BLOCK_SIZE) {
        enciphered.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        for ((b, c), e) in block.iter_mut().zip(chain.iter_mut()).zip(enciphered.iter()) {
            *b ^= *c;
            *c = *b ^ e;
        }
    }

    Ok(())
}

/// des3-cbc-raw: three key EDE in CBC mode with a zero IV. No confounder and no
/// checksum, so the ciphertext is exactly as long as the plaintext.
pub(crate) fn encrypt_des3_cbc_raw(
    key: &[u8; DES3_KEY_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, KrbError> {
    use cbc::cipher::KeyIvInit;

    if plaintext.is_empty() {
        return Err(KrbError::PlaintextEmpty);
    }
    if plaintext.len() % DES_BLOCK_SIZE != 0 {
        return Err(KrbError::BlockAlignment);
    }

    let mut cipher = Des3CbcEnc::new_from_slices(key, &DES_IV_ZERO)
        .map_err(|_| KrbError::InvalidEncryptionKey)?;

    let mut ciphertext = plaintext.to_vec();
    for block in ciphertext.chunks_exact_mut(DES_BLOCK_SIZE) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    Ok(ciphertext)
}

pub(crate) fn decrypt_des3_cbc_raw(
    key: &[u8; DES3_KEY_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KrbError> {
    use cbc::cipher::KeyIvInit;

    if ciphertext.is_empty() {
        return Err(KrbError::MessageEmpty);
    }
    if ciphertext.len() % DES_BLOCK_SIZE != 0 {
        return Err(KrbError::BlockAlignment);
    }

    let mut cipher = Des3CbcDec::new_from_slices(key, &DES_IV_ZERO)
        .map_err(|_| KrbError::InvalidEncryptionKey)?;

    let mut plaintext = Zeroizing::new(ciphertext.to_vec());
    for block in plaintext.chunks_exact_mut(DES_BLOCK_SIZE) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
    Ok(plaintext)
}
