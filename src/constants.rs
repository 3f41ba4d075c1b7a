pub const AES_256_KEY_LEN: usize = 32;
pub const AES_BLOCK_SIZE: usize = 16;

pub const SHA1_HMAC_LEN: usize = 12;

pub const IV_ZERO: [u8; AES_BLOCK_SIZE] = [0u8; AES_BLOCK_SIZE];

pub const DES_KEY_LEN: usize = 8;
pub const DES3_KEY_LEN: usize = 24;
pub const DES_BLOCK_SIZE: usize = 8;

pub const DES_IV_ZERO: [u8; DES_BLOCK_SIZE] = [0u8; DES_BLOCK_SIZE];

/// The RFC 3962 default iteration count. This is insecure and should only be used
/// when a key was created with it.
pub const RFC_PBKDF2_SHA1_ITER: u32 = 0x1000;

/// Key usage for a ticket's encrypted part, RFC 4120 section 7.5.1.
pub const KEY_USAGE_KDC_REP_TICKET: i32 = 2;

/// The largest legacy ticket, plaintext or ciphertext.
pub const MAX_KTXT_LEN: usize = 1250;

/// Legacy name, instance and realm fields, including the terminator.
pub const LEGACY_NAME_SZ: usize = 40;

pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;
