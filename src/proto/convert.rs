use super::collaborator::{LocalCrypto, TicketDecryptor, TicketEncryptor};
use super::legacy::{LegacyByteOrder, LegacyTicket, LegacyTicketPart};
use super::lifetime::LegacyTimeBound;
use super::principal::{PrincipalMapper, StandardPrincipalMapper};
use super::{EncTicket, ServiceKey};
use crate::constants::DEFAULT_CLOCK_SKEW_SECS;
use crate::error::KrbError;
use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, instrument};

/// Per call settings for a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    /// How far the local clock may disagree with the ticket's times.
    pub clock_skew: Duration,
    pub byte_order: LegacyByteOrder,
    /// Emit a debug event for each step. Never changes the outcome.
    pub debug: bool,
}

impl Default for ConversionContext {
    fn default() -> Self {
        ConversionContext {
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            byte_order: LegacyByteOrder::native(),
            debug: false,
        }
    }
}

/// Converts modern tickets into legacy tickets.
#[derive(Debug, Clone)]
pub struct TicketConverter<
    D = LocalCrypto,
    M = StandardPrincipalMapper,
    E = LocalCrypto,
> {
    ctx: ConversionContext,
    decryptor: D,
    mapper: M,
    encryptor: E,
}

impl TicketConverter {
    pub fn new(ctx: ConversionContext) -> Self {
        TicketConverter {
            ctx,
            decryptor: LocalCrypto,
            mapper: StandardPrincipalMapper,
            encryptor: LocalCrypto,
        }
    }
}

impl Default for TicketConverter {
    fn default() -> Self {
        TicketConverter::new(ConversionContext::default())
    }
}

impl<D, M, E> TicketConverter<D, M, E>
where
    D: TicketDecryptor,
    M: PrincipalMapper,
    E: TicketEncryptor,
{
    pub fn with_collaborators(ctx: ConversionContext, decryptor: D, mapper: M, encryptor: E) -> Self {
        TicketConverter {
            ctx,
            decryptor,
            mapper,
            encryptor,
        }
    }

    pub fn context(&self) -> &ConversionContext {
        &self.ctx
    }

    /// Convert `enc_ticket`, sealed under `source_key`, into a legacy ticket sealed
    /// under `dest_key` for a client presenting from `client_address`.
    pub fn convert_ticket(
        &self,
        enc_ticket: &EncTicket,
        dest_key: &ServiceKey,
        source_key: &ServiceKey,
        client_address: Ipv4Addr,
    ) -> Result<LegacyTicket, KrbError> {
        self.convert_ticket_at(
            enc_ticket,
            dest_key,
            source_key,
            client_address,
            SystemTime::now(),
        )
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(service = %enc_ticket.service(), %client_address)
    )]
    pub fn convert_ticket_at(
        &self,
        enc_ticket: &EncTicket,
        dest_key: &ServiceKey,
        source_key: &ServiceKey,
        client_address: Ipv4Addr,
        current_time: SystemTime,
    ) -> Result<LegacyTicket, KrbError> {
        // Dropping the decrypted ticket zeroises its session key on every path.
        let ticket = self.decryptor.decrypt_ticket(enc_ticket, source_key)?;
        if self.ctx.debug {
            debug!(flags = ?ticket.flags(), end = ?ticket.end_time(), "opened ticket");
        }

        let session_key = ticket.session_key().legacy_des_key()?;

        let names = self
            .mapper
            .map_principals(ticket.client_name(), ticket.service_name())?;
        if self.ctx.debug {
            debug!(
                client = %ticket.client_name(),
                name = %names.name,
                instance = %names.instance,
                realm = %names.realm,
                service_name = %names.service_name,
                service_instance = %names.service_instance,
                "mapped principals"
            );
        }

        let window = ticket.validity_window();
        let bound = LegacyTimeBound::evaluate(&window, current_time, self.ctx.clock_skew)
            .map_err(|err| {
                error!(?err, "ticket is outside of its validity window");
                KrbError::from(err)
            })?;
        if self.ctx.debug {
            debug!(
                start = ?window.effective_start(),
                end = ?window.end_time,
                remaining = bound.remaining().as_secs(),
                lifetime = bound.lifetime().as_byte(),
                "evaluated ticket window"
            );
        }

        if !ticket.permits_address(client_address) {
            error!(%client_address, "client address is not permitted by ticket");
            return Err(KrbError::LegacyBadAddress);
        }

        let part = LegacyTicketPart::new(
            &names,
            client_address,
            *session_key,
            bound.lifetime(),
            // Legacy issue times are 32 bit.
            bound.issue_time() as u32,
            self.ctx.byte_order,
        );

        let legacy_ticket = part.seal(dest_key, &self.encryptor).map_err(|err| {
            error!(?err, "unable to assemble legacy ticket");
            KrbError::LegacyConversionFailed
        })?;

        if self.ctx.debug {
            debug!(
                len = legacy_ticket.len(),
                kvno = ?legacy_ticket.kvno(),
                dest_etype = ?dest_key.etype(),
                "issued legacy ticket"
            );
        }

        Ok(legacy_ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{
        seal_ticket, EncryptionType, HostAddress, LegacyNames, LifetimeCode, Name, SessionKey,
        Ticket,
    };
    use std::time::UNIX_EPOCH;

    const SESSION: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    const CLIENT_ADDR: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 7);

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn source_key() -> ServiceKey {
        ServiceKey::new(EncryptionType::AES256_CTS_HMAC_SHA1_96, &[0x42; 32])
            .unwrap()
            .with_kvno(3)
    }

    fn des_dest_key() -> ServiceKey {
        ServiceKey::new(
            EncryptionType::DES_CBC_CRC,
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef],
        )
        .unwrap()
        .with_kvno(1)
    }

    fn ticket() -> Ticket {
        Ticket::new(
            Name::principal("alice", "EXAMPLE.COM"),
            Name::service_hst("host", "server.example.com", "EXAMPLE.COM"),
            SessionKey::new(1, &SESSION),
            now() - Duration::from_secs(600),
            now() + Duration::from_secs(36000),
        )
        .with_client_addresses(vec![HostAddress::Inet(CLIENT_ADDR)])
    }

    fn convert(ticket: &Ticket, addr: Ipv4Addr, at: SystemTime) -> Result<LegacyTicket, KrbError> {
        let enc_ticket = seal_ticket(ticket, &source_key()).unwrap();
        TicketConverter::default().convert_ticket_at(
            &enc_ticket,
            &des_dest_key(),
            &source_key(),
            addr,
            at,
        )
    }

    #[test]
    fn convert_ticket_des_dest() {
        let _ = tracing_subscriber::fmt::try_init();

        let legacy = convert(&ticket(), CLIENT_ADDR, now()).unwrap();
        assert_eq!(legacy.kvno(), Some(1));
        assert_eq!(legacy.len() % 8, 0);

        let part = legacy.decrypt(&des_dest_key()).unwrap();
        assert_eq!(part.byte_order, LegacyByteOrder::native());
        assert_eq!(part.client_name, "alice");
        assert_eq!(part.client_instance, "");
        assert_eq!(part.client_realm, "EXAMPLE.COM");
        assert_eq!(part.service_name, "rcmd");
        assert_eq!(part.service_instance, "server");
        assert_eq!(part.address, CLIENT_ADDR);
        assert_eq!(part.session_key(), &SESSION);
        // 36000s left plus 300s of skew, in five minute units.
        assert_eq!(part.lifetime, LifetimeCode::from_byte(121));
        assert_eq!(part.issue_time, 1_700_000_000);
    }

    #[test]
    fn convert_ticket_des3_dest_big_endian() {
        let _ = tracing_subscriber::fmt::try_init();

        let dest_key = ServiceKey::new(EncryptionType::DES3_CBC_SHA1_KD, &[0x5a; 24]).unwrap();
        let ctx = ConversionContext {
            byte_order: LegacyByteOrder::Big,
            debug: true,
            ..Default::default()
        };

        // A week long ticket lands in the table range.
        let ticket = Ticket::new(
            Name::principal("bob", "EXAMPLE.COM"),
            Name::service_hst("imap", "mail.example.com", "EXAMPLE.COM"),
            SessionKey::new(1, &SESSION),
            now(),
            now() + Duration::from_secs(7 * 24 * 3600),
        );
        let enc_ticket = seal_ticket(&ticket, &source_key()).unwrap();

        let legacy = TicketConverter::new(ctx)
            .convert_ticket_at(&enc_ticket, &dest_key, &source_key(), CLIENT_ADDR, now())
            .unwrap();

        let part = legacy.decrypt(&dest_key).unwrap();
        assert_eq!(part.byte_order, LegacyByteOrder::Big);
        assert_eq!(part.client_name, "bob");
        assert_eq!(part.service_name, "imap");
        assert_eq!(part.service_instance, "mail");
        assert!(!part.lifetime.is_linear());
        assert!(part.lifetime.duration() >= Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn convert_ticket_debug_has_no_effect() {
        let enc_ticket = seal_ticket(&ticket(), &source_key()).unwrap();

        let quiet = TicketConverter::default()
            .convert_ticket_at(&enc_ticket, &des_dest_key(), &source_key(), CLIENT_ADDR, now())
            .unwrap();
        let noisy = TicketConverter::new(ConversionContext {
            debug: true,
            ..Default::default()
        })
        .convert_ticket_at(&enc_ticket, &des_dest_key(), &source_key(), CLIENT_ADDR, now())
        .unwrap();

        assert_eq!(quiet, noisy);
    }

    #[test]
    fn convert_ticket_address_check() {
        assert_eq!(
            convert(&ticket(), Ipv4Addr::new(192, 0, 2, 8), now()).unwrap_err(),
            KrbError::LegacyBadAddress
        );

        // No address list, any address will do.
        let mut open_ticket = ticket();
        open_ticket.client_addresses = None;
        assert!(convert(&open_ticket, Ipv4Addr::new(198, 51, 100, 1), now()).is_ok());

        // An empty list permits nothing.
        let closed_ticket = ticket().with_client_addresses(Vec::new());
        assert_eq!(
            convert(&closed_ticket, CLIENT_ADDR, now()).unwrap_err(),
            KrbError::LegacyBadAddress
        );
    }

    #[test]
    fn convert_ticket_time_bounds() {
        let end = now() + Duration::from_secs(36000);

        // Expiry is only reached once the skew is used up.
        let legacy = convert(&ticket(), CLIENT_ADDR, end + Duration::from_secs(300)).unwrap();
        let part = legacy.decrypt(&des_dest_key()).unwrap();
        assert_eq!(part.lifetime, LifetimeCode::from_byte(0));

        assert_eq!(
            convert(&ticket(), CLIENT_ADDR, end + Duration::from_secs(301)).unwrap_err(),
            KrbError::TicketExpired
        );

        let postdated = ticket().with_start_time(now() + Duration::from_secs(300));
        assert!(convert(&postdated, CLIENT_ADDR, now()).is_ok());

        let postdated = ticket().with_start_time(now() + Duration::from_secs(301));
        assert_eq!(
            convert(&postdated, CLIENT_ADDR, now()).unwrap_err(),
            KrbError::TicketNotYetValid
        );
    }

    #[test]
    fn convert_ticket_checks_key_before_address() {
        let mut bad_key = ticket();
        bad_key.session_key = SessionKey::new(18, &[0x01; 32]);

        assert_eq!(
            convert(&bad_key, Ipv4Addr::new(192, 0, 2, 8), now()).unwrap_err(),
            KrbError::LegacyBadKey
        );

        // des-cbc-md5 session keys are not carried either.
        bad_key.session_key = SessionKey::new(3, &SESSION);
        assert_eq!(
            convert(&bad_key, CLIENT_ADDR, now()).unwrap_err(),
            KrbError::LegacyBadKey
        );
    }

    #[test]
    fn convert_ticket_decrypt_failure_propagates() {
        let enc_ticket = seal_ticket(&ticket(), &source_key()).unwrap();
        let wrong_key =
            ServiceKey::new(EncryptionType::AES256_CTS_HMAC_SHA1_96, &[0x24; 32]).unwrap();

        assert_eq!(
            TicketConverter::default()
                .convert_ticket_at(&enc_ticket, &des_dest_key(), &wrong_key, CLIENT_ADDR, now())
                .unwrap_err(),
            KrbError::MessageAuthenticationFailed
        );
    }

    struct FailingEncryptor;

    impl TicketEncryptor for FailingEncryptor {
        fn encrypt(&self, _: &ServiceKey, _: i32, _: &[u8]) -> Result<Vec<u8>, KrbError> {
            Err(KrbError::InvalidEncryptionKey)
        }
    }

    #[test]
    fn convert_ticket_assembler_failure() {
        let enc_ticket = seal_ticket(&ticket(), &source_key()).unwrap();
        let dest_key = ServiceKey::new(EncryptionType::DES3_CBC_RAW, &[0x5a; 24]).unwrap();

        let converter = TicketConverter::with_collaborators(
            ConversionContext::default(),
            LocalCrypto,
            StandardPrincipalMapper,
            FailingEncryptor,
        );

        assert_eq!(
            converter
                .convert_ticket_at(&enc_ticket, &dest_key, &source_key(), CLIENT_ADDR, now())
                .unwrap_err(),
            KrbError::LegacyConversionFailed
        );
    }

    // Hands back a fixed ticket without any cryptography.
    struct FixedDecryptor(Ticket);

    impl TicketDecryptor for FixedDecryptor {
        fn decrypt_ticket(&self, _: &EncTicket, _: &ServiceKey) -> Result<Ticket, KrbError> {
            Ok(self.0.clone())
        }
    }

    struct UpperCaseMapper;

    impl PrincipalMapper for UpperCaseMapper {
        fn map_principals(&self, client: &Name, service: &Name) -> Result<LegacyNames, KrbError> {
            Ok(LegacyNames {
                name: client.components().join(".").to_uppercase(),
                instance: "".to_string(),
                realm: client.realm().to_string(),
                service_name: service.components().join(".").to_uppercase(),
                service_instance: "".to_string(),
            })
        }
    }

    #[test]
    fn convert_ticket_custom_collaborators() {
        let converter = TicketConverter::with_collaborators(
            ConversionContext {
                byte_order: LegacyByteOrder::Little,
                ..Default::default()
            },
            FixedDecryptor(ticket()),
            UpperCaseMapper,
            LocalCrypto,
        );
        assert_eq!(converter.context().byte_order, LegacyByteOrder::Little);

        // The decryptor never looks at the ticket.
        let enc_ticket = EncTicket::new(
            Name::service_hst("host", "server.example.com", "EXAMPLE.COM"),
            crate::proto::EncryptedData::Opaque {
                etype: 23,
                kvno: None,
                data: vec![0x00; 32],
            },
        );

        let legacy = converter
            .convert_ticket_at(&enc_ticket, &des_dest_key(), &source_key(), CLIENT_ADDR, now())
            .unwrap();
        let part = legacy.decrypt(&des_dest_key()).unwrap();
        assert_eq!(part.client_name, "ALICE");
        assert_eq!(part.service_name, "HOST.SERVER.EXAMPLE.COM");
        assert_eq!(part.service_instance, "");
    }
}
