mod collaborator;
mod convert;
mod legacy;
mod lifetime;
mod principal;

pub use self::collaborator::{LocalCrypto, TicketDecryptor, TicketEncryptor};
pub use self::convert::{ConversionContext, TicketConverter};
pub use self::legacy::{LegacyByteOrder, LegacyCipher, LegacyTicket, LegacyTicketPart};
pub use self::lifetime::{
    LegacyTimeBound, LifetimeCode, TimeBoundError, ValidityWindow, LIFETIME_CODE_MAX,
    LIFETIME_LINEAR_UNIT, LIFETIME_TABLE,
};
pub use self::principal::{LegacyNames, PrincipalMapper, StandardPrincipalMapper};
pub use crate::asn1::constants::{AddressType, EncryptionType};
pub use crate::asn1::ticket_flags::TicketFlags;

use crate::asn1::{
    constants::PrincipalNameType,
    enc_ticket_part::EncTicketPart,
    encrypted_data::EncryptedData as KdcEncryptedData,
    host_address::HostAddress as KdcHostAddress,
    kerberos_string::KerberosString,
    principal_name::PrincipalName,
    realm::Realm,
    tagged_ticket::{TaggedTicket, Ticket as Asn1Ticket},
    OctetString,
};
use crate::constants::{AES_256_KEY_LEN, DES3_KEY_LEN, DES_KEY_LEN, RFC_PBKDF2_SHA1_ITER};
use crate::crypto::derive_key_aes256_cts_hmac_sha1_96;
use crate::error::KrbError;
use der::{Decode, Encode};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::time::SystemTime;
use tracing::{error, trace};
use zeroize::Zeroizing;

/// A long term key belonging to a service, used either to open a modern ticket or
/// to seal a legacy one.
#[derive(Clone)]
pub struct ServiceKey {
    etype: EncryptionType,
    k: Zeroizing<Vec<u8>>,
    kvno: Option<u32>,
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("etype", &self.etype)
            .field("k", &"[redacted]")
            .field("kvno", &self.kvno)
            .finish()
    }
}

impl ServiceKey {
    /// Wrap raw key material, checking it has the length its enctype requires.
    pub fn new(etype: EncryptionType, key: &[u8]) -> Result<Self, KrbError> {
        let expect = if etype.is_single_des() {
            DES_KEY_LEN
        } else if etype.is_triple_des() {
            DES3_KEY_LEN
        } else if etype == EncryptionType::AES256_CTS_HMAC_SHA1_96 {
            AES_256_KEY_LEN
        } else {
            error!(?etype, "unsupported service key type");
            return Err(KrbError::UnsupportedEncryption);
        };

        if key.len() != expect {
            error!(?etype, len = key.len(), "service key has an invalid length");
            return Err(KrbError::InvalidEncryptionKey);
        }

        Ok(ServiceKey {
            etype,
            k: Zeroizing::new(key.to_vec()),
            kvno: None,
        })
    }

    /// Derive an aes256-cts-hmac-sha1-96 key with the RFC 3962 string-to-key. The
    /// iteration count defaults to the RFC's 4096.
    pub fn new_aes256_cts_hmac_sha1_96(
        passphrase: &str,
        salt: &str,
        iter_count: Option<u32>,
    ) -> Result<Self, KrbError> {
        let k = derive_key_aes256_cts_hmac_sha1_96(
            passphrase.as_bytes(),
            salt.as_bytes(),
            iter_count.unwrap_or(RFC_PBKDF2_SHA1_ITER),
        )
        .map(|k| Zeroizing::new(k.to_vec()))?;

        Ok(ServiceKey {
            etype: EncryptionType::AES256_CTS_HMAC_SHA1_96,
            k,
            kvno: None,
        })
    }

    pub fn with_kvno(mut self, kvno: u32) -> Self {
        self.kvno = Some(kvno);
        self
    }

    pub fn etype(&self) -> EncryptionType {
        self.etype
    }

    pub fn kvno(&self) -> Option<u32> {
        self.kvno
    }

    pub fn key_bytes(&self) -> &[u8] {
        self.k.as_slice()
    }

    /// The same key material under another enctype of the same family.
    pub(crate) fn with_etype(&self, etype: EncryptionType) -> Self {
        ServiceKey {
            etype,
            k: self.k.clone(),
            kvno: self.kvno,
        }
    }

    pub(crate) fn des_key(&self) -> Result<[u8; DES_KEY_LEN], KrbError> {
        if !self.etype.is_single_des() {
            return Err(KrbError::UnsupportedEncryption);
        }
        self.k
            .as_slice()
            .try_into()
            .map_err(|_| KrbError::InvalidEncryptionKey)
    }

    pub(crate) fn des3_key(&self) -> Result<[u8; DES3_KEY_LEN], KrbError> {
        if !self.etype.is_triple_des() {
            return Err(KrbError::UnsupportedEncryption);
        }
        self.k
            .as_slice()
            .try_into()
            .map_err(|_| KrbError::InvalidEncryptionKey)
    }

    pub(crate) fn aes256_key(&self) -> Result<[u8; AES_256_KEY_LEN], KrbError> {
        if self.etype != EncryptionType::AES256_CTS_HMAC_SHA1_96 {
            return Err(KrbError::UnsupportedEncryption);
        }
        self.k
            .as_slice()
            .try_into()
            .map_err(|_| KrbError::InvalidEncryptionKey)
    }
}

/// The session key from inside a modern ticket. The key type is kept as the raw
/// value from the ticket since it may be one this crate has no cipher for.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    key_type: i32,
    k: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("key_type", &self.key_type)
            .field("k", &"[redacted]")
            .finish()
    }
}

impl SessionKey {
    pub fn new(key_type: i32, key: &[u8]) -> Self {
        SessionKey {
            key_type,
            k: Zeroizing::new(key.to_vec()),
        }
    }

    pub fn key_type(&self) -> i32 {
        self.key_type
    }

    pub fn key_bytes(&self) -> &[u8] {
        self.k.as_slice()
    }

    /// The key as a legacy session key. Only an eight byte des-cbc-crc key can be
    /// carried by a legacy ticket.
    pub(crate) fn legacy_des_key(&self) -> Result<Zeroizing<[u8; DES_KEY_LEN]>, KrbError> {
        if self.key_type != i32::from(EncryptionType::DES_CBC_CRC) || self.k.len() != DES_KEY_LEN
        {
            error!(
                key_type = self.key_type,
                len = self.k.len(),
                "session key can not be carried by a legacy ticket"
            );
            return Err(KrbError::LegacyBadKey);
        }

        let mut k = Zeroizing::new([0u8; DES_KEY_LEN]);
        k.copy_from_slice(self.k.as_slice());
        Ok(k)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAddress {
    Inet(Ipv4Addr),
    Inet6(Ipv6Addr),
    Other { addr_type: i32, address: Vec<u8> },
}

impl From<&KdcHostAddress> for HostAddress {
    fn from(addr: &KdcHostAddress) -> Self {
        let bytes = addr.address.as_bytes();
        match AddressType::try_from(addr.addr_type) {
            Ok(AddressType::Ipv4) => {
                if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
                    return HostAddress::Inet(Ipv4Addr::from(octets));
                }
            }
            Ok(AddressType::Ipv6) => {
                if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
                    return HostAddress::Inet6(Ipv6Addr::from(octets));
                }
            }
            _ => {}
        }
        HostAddress::Other {
            addr_type: addr.addr_type,
            address: bytes.to_vec(),
        }
    }
}

impl TryFrom<&HostAddress> for KdcHostAddress {
    type Error = KrbError;

    fn try_from(addr: &HostAddress) -> Result<Self, KrbError> {
        let (addr_type, address) = match addr {
            HostAddress::Inet(ip) => (i32::from(AddressType::Ipv4), ip.octets().to_vec()),
            HostAddress::Inet6(ip) => (i32::from(AddressType::Ipv6), ip.octets().to_vec()),
            HostAddress::Other { addr_type, address } => (*addr_type, address.clone()),
        };
        let address = OctetString::new(address).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(KdcHostAddress { addr_type, address })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptedData {
    Aes256CtsHmacSha196 { kvno: Option<u32>, data: Vec<u8> },
    // An enctype with no local cipher. A custom decryptor may still open it.
    Opaque { etype: i32, kvno: Option<u32>, data: Vec<u8> },
}

impl EncryptedData {
    pub fn etype(&self) -> i32 {
        match self {
            EncryptedData::Aes256CtsHmacSha196 { .. } => {
                i32::from(EncryptionType::AES256_CTS_HMAC_SHA1_96)
            }
            EncryptedData::Opaque { etype, .. } => *etype,
        }
    }

    pub fn kvno(&self) -> Option<u32> {
        match self {
            EncryptedData::Aes256CtsHmacSha196 { kvno, .. }
            | EncryptedData::Opaque { kvno, .. } => *kvno,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            EncryptedData::Aes256CtsHmacSha196 { data, .. }
            | EncryptedData::Opaque { data, .. } => data.as_slice(),
        }
    }
}

impl From<KdcEncryptedData> for EncryptedData {
    fn from(enc_data: KdcEncryptedData) -> Self {
        let kvno = enc_data.kvno;
        let data = enc_data.cipher.into_bytes().into_vec();
        match EncryptionType::try_from(enc_data.etype) {
            Ok(EncryptionType::AES256_CTS_HMAC_SHA1_96) => {
                EncryptedData::Aes256CtsHmacSha196 { kvno, data }
            }
            _ => EncryptedData::Opaque {
                etype: enc_data.etype,
                kvno,
                data,
            },
        }
    }
}

impl TryFrom<&EncryptedData> for KdcEncryptedData {
    type Error = KrbError;

    fn try_from(enc_data: &EncryptedData) -> Result<Self, KrbError> {
        let cipher =
            OctetString::new(enc_data.data()).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(KdcEncryptedData {
            etype: enc_data.etype(),
            kvno: enc_data.kvno(),
            cipher,
        })
    }
}

/// A modern ticket as received on the wire, still sealed under the service key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncTicket {
    tkt_vno: i8,
    service: Name,
    enc_part: EncryptedData,
}

impl EncTicket {
    pub fn new(service: Name, enc_part: EncryptedData) -> Self {
        EncTicket {
            tkt_vno: 5,
            service,
            enc_part,
        }
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, KrbError> {
        let TaggedTicket(ticket) = TaggedTicket::from_der(bytes).map_err(|err| {
            error!(?err, "DerDecodeTicket");
            KrbError::DerDecodeTicket
        })?;
        EncTicket::try_from(ticket)
    }

    pub fn to_der(&self) -> Result<Vec<u8>, KrbError> {
        let (sname, realm): (PrincipalName, Realm) = (&self.service).try_into()?;
        let ticket = Asn1Ticket {
            tkt_vno: self.tkt_vno,
            realm,
            sname,
            enc_part: (&self.enc_part).try_into()?,
        };
        TaggedTicket(ticket).to_der().map_err(|err| {
            error!(?err, "DerEncodeTicket");
            KrbError::DerEncodeTicket
        })
    }

    pub fn service(&self) -> &Name {
        &self.service
    }

    pub fn enc_part(&self) -> &EncryptedData {
        &self.enc_part
    }
}

impl TryFrom<Asn1Ticket> for EncTicket {
    type Error = KrbError;

    fn try_from(tkt: Asn1Ticket) -> Result<Self, Self::Error> {
        if tkt.tkt_vno != 5 {
            error!(tkt_vno = tkt.tkt_vno, "unsupported ticket version");
            return Err(KrbError::InvalidPvno);
        }

        let service = Name::try_from((tkt.sname, tkt.realm))?;
        let enc_part = EncryptedData::from(tkt.enc_part);

        Ok(EncTicket {
            tkt_vno: tkt.tkt_vno,
            service,
            enc_part,
        })
    }
}

/// The decrypted content of a modern ticket.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub(crate) client_name: Name,
    pub(crate) service_name: Name,
    pub(crate) session_key: SessionKey,
    pub(crate) flags: TicketFlags,
    pub(crate) auth_time: SystemTime,
    pub(crate) start_time: Option<SystemTime>,
    pub(crate) end_time: SystemTime,
    // None when the ticket carries no address restriction.
    pub(crate) client_addresses: Option<Vec<HostAddress>>,
}

impl Ticket {
    /// A ticket usable from any address, starting at `auth_time`. Decryptors that
    /// produce tickets from other sources start here.
    pub fn new(
        client_name: Name,
        service_name: Name,
        session_key: SessionKey,
        auth_time: SystemTime,
        end_time: SystemTime,
    ) -> Self {
        Ticket {
            client_name,
            service_name,
            session_key,
            flags: TicketFlags::none(),
            auth_time,
            start_time: None,
            end_time,
            client_addresses: None,
        }
    }

    pub fn with_start_time(mut self, start_time: SystemTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_client_addresses(mut self, addresses: Vec<HostAddress>) -> Self {
        self.client_addresses = Some(addresses);
        self
    }

    pub fn client_name(&self) -> &Name {
        &self.client_name
    }

    pub fn service_name(&self) -> &Name {
        &self.service_name
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    pub fn flags(&self) -> TicketFlags {
        self.flags
    }

    pub fn auth_time(&self) -> SystemTime {
        self.auth_time
    }

    pub fn start_time(&self) -> Option<SystemTime> {
        self.start_time
    }

    pub fn end_time(&self) -> SystemTime {
        self.end_time
    }

    pub fn client_addresses(&self) -> Option<&[HostAddress]> {
        self.client_addresses.as_deref()
    }

    pub fn validity_window(&self) -> ValidityWindow {
        ValidityWindow::new(self.auth_time, self.start_time, self.end_time)
    }

    /// Whether the ticket may be presented from `addr`. A ticket with no address
    /// list may be used from anywhere.
    pub fn permits_address(&self, addr: Ipv4Addr) -> bool {
        match &self.client_addresses {
            None => true,
            Some(addresses) => addresses
                .iter()
                .any(|a| matches!(a, HostAddress::Inet(ip) if *ip == addr)),
        }
    }

    pub(crate) fn from_enc_ticket_part(
        part: EncTicketPart,
        service_name: Name,
    ) -> Result<Self, KrbError> {
        trace!(flags = ?part.flags, "decoded ticket part");

        let client_name = Name::try_from((part.cname, part.crealm))?;
        let session_key = SessionKey::new(part.key.key_type, part.key.key_value.as_bytes());
        let client_addresses = part
            .client_addresses
            .map(|addrs| addrs.iter().map(HostAddress::from).collect());

        Ok(Ticket {
            client_name,
            service_name,
            session_key,
            flags: part.flags,
            auth_time: part.auth_time.to_system_time(),
            start_time: part.start_time.map(|t| t.to_system_time()),
            end_time: part.end_time.to_system_time(),
            client_addresses,
        })
    }

    #[cfg(test)]
    pub(crate) fn to_enc_ticket_part(&self) -> Result<EncTicketPart, KrbError> {
        use crate::asn1::encryption_key::EncryptionKey;
        use crate::asn1::kerberos_time::KerberosTime;
        use crate::asn1::transited_encoding::TransitedEncoding;

        let time = |t: SystemTime| {
            KerberosTime::from_system_time(t).map_err(|_| KrbError::DerEncodeKerberosTime)
        };

        let (cname, crealm): (PrincipalName, Realm) = (&self.client_name).try_into()?;
        let client_addresses = self
            .client_addresses
            .as_ref()
            .map(|addrs| addrs.iter().map(KdcHostAddress::try_from).collect())
            .transpose()?;

        Ok(EncTicketPart {
            flags: self.flags,
            key: EncryptionKey {
                key_type: self.session_key.key_type,
                key_value: OctetString::new(self.session_key.key_bytes())
                    .map_err(|_| KrbError::DerEncodeOctetString)?,
            },
            crealm,
            cname,
            transited: TransitedEncoding {
                tr_type: 1,
                contents: OctetString::new(Vec::new())
                    .map_err(|_| KrbError::DerEncodeOctetString)?,
            },
            auth_time: time(self.auth_time)?,
            start_time: self.start_time.map(time).transpose()?,
            end_time: time(self.end_time)?,
            renew_till: None,
            client_addresses,
            authorization_data: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd)]
pub enum Name {
    Principal {
        name: String,
        realm: String,
    },
    // MIT sends two component service names as name type 1 or 3, so both are
    // accepted and mapped the same way.
    SrvPrincipal {
        service: String,
        host: String,
        realm: String,
    },
    SrvHst {
        service: String,
        host: String,
        realm: String,
    },
    SrvInst {
        service: String,
        instance: Vec<String>,
        realm: String,
    },
}

impl Name {
    pub fn principal(name: &str, realm: &str) -> Self {
        Self::Principal {
            name: name.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service(srvname: &str, hostname: &str, realm: &str) -> Self {
        Self::SrvPrincipal {
            service: srvname.to_string(),
            host: hostname.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service_hst(srvname: &str, hostname: &str, realm: &str) -> Self {
        Self::SrvHst {
            service: srvname.to_string(),
            host: hostname.to_string(),
            realm: realm.to_string(),
        }
    }

    pub fn service_inst(srvname: &str, instance: &[&str], realm: &str) -> Self {
        Self::SrvInst {
            service: srvname.to_string(),
            instance: instance.iter().map(|i| i.to_string()).collect(),
            realm: realm.to_string(),
        }
    }

    pub fn realm(&self) -> &str {
        match self {
            Name::Principal { realm, .. }
            | Name::SrvPrincipal { realm, .. }
            | Name::SrvHst { realm, .. }
            | Name::SrvInst { realm, .. } => realm.as_str(),
        }
    }

    /// The name components without the realm.
    pub fn components(&self) -> Vec<&str> {
        match self {
            Name::Principal { name, .. } => vec![name.as_str()],
            Name::SrvPrincipal { service, host, .. } | Name::SrvHst { service, host, .. } => {
                vec![service.as_str(), host.as_str()]
            }
            Name::SrvInst {
                service, instance, ..
            } => std::iter::once(service.as_str())
                .chain(instance.iter().map(|i| i.as_str()))
                .collect(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.components().join("/"), self.realm())
    }
}

impl From<&Name> for String {
    fn from(val: &Name) -> Self {
        val.to_string()
    }
}

fn kerberos_string(s: &str) -> Result<KerberosString, KrbError> {
    KerberosString::from_str(s)
}

impl TryInto<(PrincipalName, Realm)> for &Name {
    type Error = KrbError;

    fn try_into(self) -> Result<(PrincipalName, Realm), KrbError> {
        let name_type = match self {
            Name::Principal { .. } | Name::SrvPrincipal { .. } => PrincipalNameType::NtPrincipal,
            Name::SrvHst { .. } => PrincipalNameType::NtSrvHst,
            Name::SrvInst { .. } => PrincipalNameType::NtSrvInst,
        };

        let name_string = self
            .components()
            .into_iter()
            .map(kerberos_string)
            .collect::<Result<Vec<_>, _>>()?;
        let realm = kerberos_string(self.realm())?;

        Ok((
            PrincipalName {
                name_type: name_type as i32,
                name_string,
            },
            realm,
        ))
    }
}

impl TryFrom<(PrincipalName, Realm)> for Name {
    type Error = KrbError;

    fn try_from((princ, realm): (PrincipalName, Realm)) -> Result<Self, Self::Error> {
        let PrincipalName {
            name_type,
            name_string,
        } = princ;

        let realm = String::from(&realm);
        let name_type: PrincipalNameType = name_type.try_into().map_err(|err| {
            error!(?err, ?name_type, "invalid principal name type");
            KrbError::PrincipalNameInvalidType
        })?;

        trace!(?name_type, ?name_string);

        let name_string: Vec<String> = name_string.iter().map(String::from).collect();

        match (name_type, name_string.as_slice()) {
            // MIT sends services as NtPrincipal, so the number of components decides.
            (PrincipalNameType::NtPrincipal | PrincipalNameType::NtUnknown, [name]) => {
                Ok(Name::Principal {
                    name: name.clone(),
                    realm,
                })
            }
            (PrincipalNameType::NtPrincipal | PrincipalNameType::NtUnknown, [service, host]) => {
                Ok(Name::SrvPrincipal {
                    service: service.clone(),
                    host: host.clone(),
                    realm,
                })
            }
            (PrincipalNameType::NtSrvHst, [service, host]) => Ok(Name::SrvHst {
                service: service.clone(),
                host: host.clone(),
                realm,
            }),
            (PrincipalNameType::NtSrvInst, [service, instance @ ..]) => Ok(Name::SrvInst {
                service: service.clone(),
                instance: instance.to_vec(),
                realm,
            }),
            (
                PrincipalNameType::NtPrincipal
                | PrincipalNameType::NtUnknown
                | PrincipalNameType::NtSrvHst
                | PrincipalNameType::NtSrvInst,
                _,
            ) => Err(KrbError::NameNumberOfComponents),
            _ => Err(KrbError::PrincipalNameInvalidType),
        }
    }
}

/// Encrypt a ticket under an aes256 service key, as a KDC would.
#[cfg(test)]
pub(crate) fn seal_ticket(ticket: &Ticket, key: &ServiceKey) -> Result<EncTicket, KrbError> {
    use crate::asn1::enc_ticket_part::TaggedEncTicketPart;
    use crate::constants::KEY_USAGE_KDC_REP_TICKET;
    use crate::crypto::encrypt_aes256_cts_hmac_sha1_96;

    let part = TaggedEncTicketPart(ticket.to_enc_ticket_part()?)
        .to_der()
        .map_err(|_| KrbError::DerEncodeEncTicketPart)?;
    let data =
        encrypt_aes256_cts_hmac_sha1_96(&key.aes256_key()?, &part, KEY_USAGE_KDC_REP_TICKET)?;

    Ok(EncTicket::new(
        ticket.service_name.clone(),
        EncryptedData::Aes256CtsHmacSha196 {
            kvno: key.kvno(),
            data,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn service_key_lengths() {
        assert!(ServiceKey::new(EncryptionType::DES_CBC_CRC, &[0x01; 8]).is_ok());
        assert!(ServiceKey::new(EncryptionType::DES3_CBC_SHA1_KD, &[0x01; 24]).is_ok());
        assert!(ServiceKey::new(EncryptionType::AES256_CTS_HMAC_SHA1_96, &[0x01; 32]).is_ok());

        assert_eq!(
            ServiceKey::new(EncryptionType::DES_CBC_MD5, &[0x01; 7]).unwrap_err(),
            KrbError::InvalidEncryptionKey
        );
        assert_eq!(
            ServiceKey::new(EncryptionType::RC4_HMAC, &[0x01; 16]).unwrap_err(),
            KrbError::UnsupportedEncryption
        );

        let key = ServiceKey::new(EncryptionType::DES_CBC_CRC, &[0x01; 8]).unwrap();
        assert!(key.des3_key().is_err());
        assert!(!format!("{:?}", key).contains("1, 1"));
    }

    #[test]
    fn session_key_legacy_shape() {
        let key = SessionKey::new(1, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert_eq!(
            *key.legacy_des_key().unwrap(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );

        let key = SessionKey::new(3, &[0x01; 8]);
        assert_eq!(key.legacy_des_key().unwrap_err(), KrbError::LegacyBadKey);

        let key = SessionKey::new(1, &[0x01; 16]);
        assert_eq!(key.legacy_des_key().unwrap_err(), KrbError::LegacyBadKey);

        let key = SessionKey::new(18, &[0x01; 32]);
        assert_eq!(key.legacy_des_key().unwrap_err(), KrbError::LegacyBadKey);
    }

    #[test]
    fn name_principal_name_round_trip_types() {
        let name = Name::service_hst("host", "server.example.com", "EXAMPLE.COM");
        let (princ, realm): (PrincipalName, Realm) = (&name).try_into().unwrap();
        assert_eq!(princ.name_type, PrincipalNameType::NtSrvHst as i32);
        assert_eq!(Name::try_from((princ, realm)).unwrap(), name);

        // Two components sent as NtPrincipal.
        let princ = PrincipalName {
            name_type: 1,
            name_string: vec![
                KerberosString::from_str("HOST").unwrap(),
                KerberosString::from_str("localhost").unwrap(),
            ],
        };
        let realm = KerberosString::from_str("EXAMPLE.COM").unwrap();
        assert_eq!(
            Name::try_from((princ, realm)).unwrap(),
            Name::service("HOST", "localhost", "EXAMPLE.COM")
        );

        let princ = PrincipalName {
            name_type: 1,
            name_string: vec![],
        };
        let realm = KerberosString::from_str("EXAMPLE.COM").unwrap();
        assert_eq!(
            Name::try_from((princ, realm)).unwrap_err(),
            KrbError::NameNumberOfComponents
        );

        let princ = PrincipalName {
            name_type: 10,
            name_string: vec![KerberosString::from_str("alice@example.com").unwrap()],
        };
        let realm = KerberosString::from_str("EXAMPLE.COM").unwrap();
        assert_eq!(
            Name::try_from((princ, realm)).unwrap_err(),
            KrbError::PrincipalNameInvalidType
        );
    }

    #[test]
    fn name_display() {
        assert_eq!(
            Name::principal("alice", "EXAMPLE.COM").to_string(),
            "alice@EXAMPLE.COM"
        );
        assert_eq!(
            String::from(&Name::service_inst("krbtgt", &["EXAMPLE.COM"], "EXAMPLE.COM")),
            "krbtgt/EXAMPLE.COM@EXAMPLE.COM"
        );
    }

    #[test]
    fn enc_ticket_der_round_trip() {
        let tkt = EncTicket::new(
            Name::service_hst("host", "server.example.com", "EXAMPLE.COM"),
            EncryptedData::Opaque {
                etype: 16,
                kvno: Some(3),
                data: vec![0xAB; 48],
            },
        );

        let der_bytes = tkt.to_der().unwrap();
        // [APPLICATION 1]
        assert_eq!(der_bytes[0], 0x61);

        let decoded = EncTicket::from_der(&der_bytes).unwrap();
        assert_eq!(decoded, tkt);
        assert_eq!(decoded.enc_part().etype(), 16);
        assert_eq!(decoded.enc_part().kvno(), Some(3));

        assert_eq!(
            EncTicket::from_der(&der_bytes[..der_bytes.len() - 1]).unwrap_err(),
            KrbError::DerDecodeTicket
        );
    }

    #[test]
    fn enc_ticket_general_string_wire_format() {
        // Realm and sname components are GeneralString (0x1b) on the wire.
        let der_bytes = hex::decode(
            "61533051a003020105a10d1b0b4558414d504c452e434f4da2253023a003020103a11c301a1b04686f73\
             741b127365727665722e6578616d706c652e636f6da3143012a003020112a103020102a2060404aabbccdd",
        )
        .unwrap();

        let tkt = EncTicket::from_der(&der_bytes).unwrap();
        assert_eq!(
            tkt.service(),
            &Name::service_hst("host", "server.example.com", "EXAMPLE.COM")
        );
        assert_eq!(
            tkt.enc_part(),
            &EncryptedData::Aes256CtsHmacSha196 {
                kvno: Some(2),
                data: vec![0xaa, 0xbb, 0xcc, 0xdd],
            }
        );

        assert_eq!(tkt.to_der().unwrap(), der_bytes);
    }

    #[test]
    fn ticket_address_permission() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let ticket = Ticket::new(
            Name::principal("alice", "EXAMPLE.COM"),
            Name::service("host", "server", "EXAMPLE.COM"),
            SessionKey::new(1, &[0x01; 8]),
            now,
            now + Duration::from_secs(3600),
        );
        assert!(ticket.permits_address(Ipv4Addr::new(10, 0, 0, 1)));

        let ticket = ticket.with_client_addresses(vec![
            HostAddress::Inet6(Ipv6Addr::LOCALHOST),
            HostAddress::Inet(Ipv4Addr::new(192, 0, 2, 7)),
        ]);
        assert!(ticket.permits_address(Ipv4Addr::new(192, 0, 2, 7)));
        assert!(!ticket.permits_address(Ipv4Addr::new(192, 0, 2, 8)));

        let ticket = ticket.with_client_addresses(Vec::new());
        assert!(!ticket.permits_address(Ipv4Addr::new(192, 0, 2, 7)));
    }

    #[test]
    fn host_address_from_der_types() {
        let addr = KdcHostAddress {
            addr_type: 2,
            address: OctetString::new(vec![192, 0, 2, 7]).unwrap(),
        };
        assert_eq!(
            HostAddress::from(&addr),
            HostAddress::Inet(Ipv4Addr::new(192, 0, 2, 7))
        );

        // Wrong length for an IPv4 address.
        let addr = KdcHostAddress {
            addr_type: 2,
            address: OctetString::new(vec![192, 0, 2]).unwrap(),
        };
        assert!(matches!(
            HostAddress::from(&addr),
            HostAddress::Other { addr_type: 2, .. }
        ));
    }
}
