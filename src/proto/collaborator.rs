use super::{EncTicket, EncryptedData, EncryptionType, ServiceKey, Ticket};
use crate::asn1::enc_ticket_part::TaggedEncTicketPart;
use crate::constants::KEY_USAGE_KDC_REP_TICKET;
use crate::crypto::{decrypt_aes256_cts_hmac_sha1_96, encrypt_des3_cbc_raw};
use crate::error::KrbError;
use der::Decode;
use tracing::{error, trace};

/// Opens a modern ticket with the key of the service it was issued to.
pub trait TicketDecryptor {
    fn decrypt_ticket(&self, ticket: &EncTicket, key: &ServiceKey) -> Result<Ticket, KrbError>;
}

/// The generic encryption primitive used to seal legacy tickets under keys that
/// are not single DES.
pub trait TicketEncryptor {
    fn encrypt(
        &self,
        key: &ServiceKey,
        key_usage: i32,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, KrbError>;
}

/// The ciphers this crate carries. Decrypts aes256-cts-hmac-sha1-96 tickets and
/// encrypts with des3-cbc-raw.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCrypto;

impl TicketDecryptor for LocalCrypto {
    fn decrypt_ticket(&self, ticket: &EncTicket, key: &ServiceKey) -> Result<Ticket, KrbError> {
        let enc_part = ticket.enc_part();

        if let (Some(ticket_kvno), Some(key_kvno)) = (enc_part.kvno(), key.kvno()) {
            if ticket_kvno != key_kvno {
                // Not fatal, the key may still be the right one.
                trace!(%ticket_kvno, %key_kvno, "ticket kvno differs from service key");
            }
        }

        let data = match enc_part {
            EncryptedData::Aes256CtsHmacSha196 { data, .. } => {
                let k = zeroize::Zeroizing::new(key.aes256_key()?);
                decrypt_aes256_cts_hmac_sha1_96(&k, data, KEY_USAGE_KDC_REP_TICKET)?
            }
            EncryptedData::Opaque { etype, .. } => {
                error!(%etype, "no cipher available for ticket enctype");
                return Err(KrbError::UnsupportedEncryption);
            }
        };

        let TaggedEncTicketPart(part) = TaggedEncTicketPart::from_der(&data).map_err(|err| {
            error!(?err, "DerDecodeEncTicketPart");
            KrbError::DerDecodeEncTicketPart
        })?;

        Ticket::from_enc_ticket_part(part, ticket.service().clone())
    }
}

impl TicketEncryptor for LocalCrypto {
    fn encrypt(
        &self,
        key: &ServiceKey,
        key_usage: i32,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, KrbError> {
        match key.etype() {
            // Raw enctypes have no key derivation, so the usage has no effect.
            EncryptionType::DES3_CBC_RAW => {
                trace!(%key_usage, "des3-cbc-raw encrypt");
                let k = zeroize::Zeroizing::new(key.des3_key()?);
                encrypt_des3_cbc_raw(&k, plaintext)
            }
            etype => {
                error!(?etype, "no generic cipher available");
                Err(KrbError::UnsupportedEncryption)
            }
        }
    }
}
