use super::collaborator::TicketEncryptor;
use super::lifetime::LifetimeCode;
use super::principal::LegacyNames;
use super::{EncryptionType, ServiceKey};
use crate::constants::{DES_BLOCK_SIZE, DES_KEY_LEN, KEY_USAGE_KDC_REP_TICKET, MAX_KTXT_LEN};
use crate::crypto::{decrypt_des3_cbc_raw, decrypt_des_pcbc, encrypt_des_pcbc};
use crate::error::KrbError;
use binrw::io::Cursor;
use binrw::{binread, binwrite, BinRead, BinWrite, NullString};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, error};
use zeroize::{Zeroize, Zeroizing};

/// The order of the multi-byte fields in a legacy ticket. Bit 0 of the flags byte
/// is set when the ticket is little endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyByteOrder {
    Little,
    Big,
}

impl LegacyByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            LegacyByteOrder::Little
        } else {
            LegacyByteOrder::Big
        }
    }

    fn flag(self) -> u8 {
        match self {
            LegacyByteOrder::Little => 1,
            LegacyByteOrder::Big => 0,
        }
    }
}

impl Default for LegacyByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

// Wire layout of the plaintext ticket, before the zero padding.
#[binwrite]
#[bw(big)]
#[binread]
#[br(big)]
struct LegacyTicketLayout {
    flags: u8,
    client_name: NullString,
    client_instance: NullString,
    client_realm: NullString,
    address: [u8; 4],
    session_key: [u8; DES_KEY_LEN],
    lifetime: u8,
    #[br(is_little = (flags & 1) != 0)]
    #[bw(is_little = (flags & 1) != 0)]
    issue_time: u32,
    service_name: NullString,
    service_instance: NullString,
}

impl Drop for LegacyTicketLayout {
    fn drop(&mut self) {
        self.session_key.zeroize();
    }
}

/// The plaintext content of a legacy ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct LegacyTicketPart {
    /// Flag bits other than the byte order bit.
    pub flags: u8,
    pub byte_order: LegacyByteOrder,
    pub client_name: String,
    pub client_instance: String,
    pub client_realm: String,
    pub address: Ipv4Addr,
    session_key: [u8; DES_KEY_LEN],
    pub lifetime: LifetimeCode,
    /// Seconds since the epoch, truncated to 32 bits.
    pub issue_time: u32,
    pub service_name: String,
    pub service_instance: String,
}

impl fmt::Debug for LegacyTicketPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyTicketPart")
            .field("flags", &self.flags)
            .field("byte_order", &self.byte_order)
            .field("client_name", &self.client_name)
            .field("client_instance", &self.client_instance)
            .field("client_realm", &self.client_realm)
            .field("address", &self.address)
            .field("session_key", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .field("issue_time", &self.issue_time)
            .field("service_name", &self.service_name)
            .field("service_instance", &self.service_instance)
            .finish()
    }
}

impl Drop for LegacyTicketPart {
    fn drop(&mut self) {
        self.session_key.zeroize();
    }
}

impl LegacyTicketPart {
    pub fn new(
        names: &LegacyNames,
        address: Ipv4Addr,
        session_key: [u8; DES_KEY_LEN],
        lifetime: LifetimeCode,
        issue_time: u32,
        byte_order: LegacyByteOrder,
    ) -> Self {
        LegacyTicketPart {
            flags: 0,
            byte_order,
            client_name: names.name.clone(),
            client_instance: names.instance.clone(),
            client_realm: names.realm.clone(),
            address,
            session_key,
            lifetime,
            issue_time,
            service_name: names.service_name.clone(),
            service_instance: names.service_instance.clone(),
        }
    }

    pub fn session_key(&self) -> &[u8; DES_KEY_LEN] {
        &self.session_key
    }

    fn strings(&self) -> [&str; 5] {
        [
            &self.client_name,
            &self.client_instance,
            &self.client_realm,
            &self.service_name,
            &self.service_instance,
        ]
    }

    /// The plaintext length, padded to whole cipher blocks.
    pub fn encoded_len(&self) -> usize {
        // flags, address, session key, lifetime and issue time.
        let fixed = 1 + 4 + DES_KEY_LEN + 1 + 4;
        let strings: usize = self.strings().iter().map(|s| s.len() + 1).sum();
        (fixed + strings).div_ceil(DES_BLOCK_SIZE) * DES_BLOCK_SIZE
    }

    /// Serialise to the padded plaintext layout.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>, KrbError> {
        if self.strings().iter().any(|s| s.as_bytes().contains(&0)) {
            error!("legacy ticket names may not contain NUL");
            return Err(KrbError::LegacyNameInvalid);
        }

        let padded_len = self.encoded_len();
        if padded_len > MAX_KTXT_LEN {
            error!(
                len = padded_len,
                max = MAX_KTXT_LEN,
                "legacy ticket exceeds the maximum length"
            );
            return Err(KrbError::LegacyLengthExceeded);
        }

        let layout = LegacyTicketLayout {
            flags: (self.flags & !1) | self.byte_order.flag(),
            client_name: NullString::from(self.client_name.as_str()),
            client_instance: NullString::from(self.client_instance.as_str()),
            client_realm: NullString::from(self.client_realm.as_str()),
            address: self.address.octets(),
            session_key: self.session_key,
            lifetime: self.lifetime.as_byte(),
            issue_time: self.issue_time,
            service_name: NullString::from(self.service_name.as_str()),
            service_instance: NullString::from(self.service_instance.as_str()),
        };

        // Sized up front so the buffer never reallocates and leaves a copy behind.
        let mut buf = Zeroizing::new(Vec::with_capacity(padded_len));
        let mut cursor = Cursor::new(&mut *buf);
        layout.write(&mut cursor).map_err(|err| {
            error!(?err, "unable to write legacy ticket");
            KrbError::BinRWError
        })?;

        buf.resize(padded_len, 0);
        Ok(buf)
    }

    /// Parse a plaintext ticket, including any trailing zero padding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KrbError> {
        if bytes.len() > MAX_KTXT_LEN {
            return Err(KrbError::LegacyLengthExceeded);
        }
        if bytes.len() % DES_BLOCK_SIZE != 0 {
            error!(len = bytes.len(), "legacy ticket is not padded to the block size");
            return Err(KrbError::LegacyTicketInvalid);
        }

        let mut cursor = Cursor::new(bytes);
        let mut layout = LegacyTicketLayout::read(&mut cursor).map_err(|err| {
            error!(?err, "unable to read legacy ticket");
            KrbError::LegacyTicketInvalid
        })?;

        let consumed = cursor.position() as usize;
        let padding = bytes.get(consumed..).unwrap_or_default();
        if padding.len() >= DES_BLOCK_SIZE || padding.iter().any(|b| *b != 0) {
            error!(padding = padding.len(), "legacy ticket padding is invalid");
            return Err(KrbError::LegacyTicketInvalid);
        }

        let byte_order = if layout.flags & 1 != 0 {
            LegacyByteOrder::Little
        } else {
            LegacyByteOrder::Big
        };

        let take = |s: &mut NullString| {
            String::from_utf8(std::mem::take(&mut s.0)).map_err(|_| KrbError::LegacyTicketInvalid)
        };

        Ok(LegacyTicketPart {
            flags: layout.flags & !1,
            byte_order,
            client_name: take(&mut layout.client_name)?,
            client_instance: take(&mut layout.client_instance)?,
            client_realm: take(&mut layout.client_realm)?,
            address: Ipv4Addr::from(layout.address),
            session_key: layout.session_key,
            lifetime: LifetimeCode::from_byte(layout.lifetime),
            issue_time: layout.issue_time,
            service_name: take(&mut layout.service_name)?,
            service_instance: take(&mut layout.service_instance)?,
        })
    }

    /// Serialise and encrypt under the destination service key.
    pub fn seal<E: TicketEncryptor + ?Sized>(
        &self,
        dest_key: &ServiceKey,
        encryptor: &E,
    ) -> Result<LegacyTicket, KrbError> {
        let cipher = LegacyCipher::for_key(dest_key)?;
        let plaintext = self.to_bytes()?;
        let data = cipher.seal(plaintext, encryptor)?;

        Ok(LegacyTicket {
            kvno: dest_key.kvno(),
            data,
        })
    }
}

/// How a legacy ticket is encrypted, chosen by the destination key's enctype.
pub enum LegacyCipher {
    /// Single DES in propagating CBC mode with the key as the IV.
    DesPcbc { key: Zeroizing<[u8; DES_KEY_LEN]> },
    /// The generic primitive, with triple DES enctypes coerced to des3-cbc-raw.
    Generic { key: ServiceKey },
}

impl fmt::Debug for LegacyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyCipher::DesPcbc { .. } => f
                .debug_struct("DesPcbc")
                .field("key", &"[redacted]")
                .finish(),
            LegacyCipher::Generic { key } => f.debug_struct("Generic").field("key", key).finish(),
        }
    }
}

impl LegacyCipher {
    pub fn for_key(dest_key: &ServiceKey) -> Result<Self, KrbError> {
        let etype = dest_key.etype();
        if etype.is_single_des() {
            let key = Zeroizing::new(dest_key.des_key()?);
            Ok(LegacyCipher::DesPcbc { key })
        } else if etype.is_triple_des() {
            Ok(LegacyCipher::Generic {
                key: dest_key.with_etype(EncryptionType::DES3_CBC_RAW),
            })
        } else {
            Ok(LegacyCipher::Generic {
                key: dest_key.clone(),
            })
        }
    }

    fn seal<E: TicketEncryptor + ?Sized>(
        &self,
        mut plaintext: Zeroizing<Vec<u8>>,
        encryptor: &E,
    ) -> Result<Vec<u8>, KrbError> {
        match self {
            LegacyCipher::DesPcbc { key } => {
                encrypt_des_pcbc(key, plaintext.as_mut_slice()).map_err(|err| {
                    error!(?err, "legacy pcbc encryption failed");
                    KrbError::LegacyEncryptionFailed
                })?;
                Ok(std::mem::take(&mut *plaintext))
            }
            LegacyCipher::Generic { key } => {
                debug!(etype = ?key.etype(), "sealing legacy ticket with the generic cipher");
                let ciphertext = encryptor
                    .encrypt(key, KEY_USAGE_KDC_REP_TICKET, plaintext.as_slice())
                    .map(Zeroizing::new)
                    .map_err(|err| {
                        error!(?err, "legacy generic encryption failed");
                        KrbError::LegacyEncryptionFailed
                    })?;

                if ciphertext.len() > MAX_KTXT_LEN {
                    error!(
                        len = ciphertext.len(),
                        "legacy ticket ciphertext exceeds the maximum length"
                    );
                    return Err(KrbError::LegacyEncryptionFailed);
                }
                Ok(ciphertext.to_vec())
            }
        }
    }

    fn open(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, KrbError> {
        match self {
            LegacyCipher::DesPcbc { key } => {
                let mut plaintext = Zeroizing::new(ciphertext.to_vec());
                decrypt_des_pcbc(key, plaintext.as_mut_slice())?;
                Ok(plaintext)
            }
            LegacyCipher::Generic { key } if key.etype() == EncryptionType::DES3_CBC_RAW => {
                decrypt_des3_cbc_raw(&Zeroizing::new(key.des3_key()?), ciphertext)
            }
            LegacyCipher::Generic { key } => {
                error!(etype = ?key.etype(), "no cipher available to open legacy ticket");
                Err(KrbError::UnsupportedEncryption)
            }
        }
    }
}

/// An encrypted legacy ticket, ready to hand to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTicket {
    kvno: Option<u32>,
    data: Vec<u8>,
}

impl LegacyTicket {
    pub fn from_bytes(data: Vec<u8>, kvno: Option<u32>) -> Result<Self, KrbError> {
        if data.is_empty() || data.len() > MAX_KTXT_LEN {
            return Err(KrbError::LegacyTicketInvalid);
        }
        Ok(LegacyTicket { kvno, data })
    }

    /// The version of the service key the ticket is sealed under.
    pub fn kvno(&self) -> Option<u32> {
        self.kvno
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reverse [`LegacyTicketPart::seal`] with the destination key.
    pub fn decrypt(&self, dest_key: &ServiceKey) -> Result<LegacyTicketPart, KrbError> {
        let plaintext = LegacyCipher::for_key(dest_key)?.open(&self.data)?;
        LegacyTicketPart::from_bytes(&plaintext)
    }
}
