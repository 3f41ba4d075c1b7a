pub use crate::asn1::constants::KrbErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrbError {
    // =========================================================================================
    // IMPORTANT: Don't add variables to variants in this  enum - it's a potential security risk
    // as you can leak internal state in an error as these can end up in userfacing contexts!!!
    //
    // In other words, any extra information you add here is a potential CVE.
    //
    // If you want to debug the error, then use the error! macro at the error raise site to
    // report relevant information.
    //
    // Lastly, the whole reason we have so many error variants is so that just from the error
    // variant alone, we already have a large amount of anonymised detail about the potential
    // cause the error.
    // =========================================================================================
    InvalidHmacSha1Key,
    MessageAuthenticationFailed,
    MessageEmpty,
    InsufficientData,
    PlaintextEmpty,
    CtsCiphertextInvalid,
    BlockAlignment,
    InsecurePassphrase,
    UnsupportedEncryption,
    InvalidEncryptionKey,
    InvalidPvno,

    DerDecodeTicket,
    DerEncodeTicket,
    DerDecodeEncTicketPart,
    DerEncodeEncTicketPart,
    DerEncodeOctetString,
    DerEncodeKerberosString,
    DerEncodeKerberosTime,

    NameNumberOfComponents,
    PrincipalNameInvalidType,

    /// The session key in the modern ticket can not be carried by a legacy ticket.
    LegacyBadKey,
    /// The client address is not one the modern ticket was issued for.
    LegacyBadAddress,
    LegacyNameInvalid,
    LegacyNameTooLong,
    LegacyLengthExceeded,
    LegacyEncryptionFailed,
    LegacyConversionFailed,
    LegacyTicketInvalid,

    TicketNotYetValid,
    TicketExpired,

    BinRWError,

    /// No really, do you have a time machine? How did you go back to before 1970?
    DoYouHaveATimeMachine,
}

impl KrbError {
    /// The protocol error code a caller should report for this failure.
    pub fn krb_error_code(&self) -> KrbErrorCode {
        match self {
            KrbError::TicketNotYetValid => KrbErrorCode::KrbApErrTktNyv,
            KrbError::TicketExpired => KrbErrorCode::KrbApErrTktExpired,
            KrbError::LegacyBadAddress => KrbErrorCode::KrbApErrBadAddr,
            KrbError::MessageAuthenticationFailed
            | KrbError::CtsCiphertextInvalid
            | KrbError::InsufficientData
            | KrbError::MessageEmpty => KrbErrorCode::KrbApErrBadIntegrity,
            KrbError::UnsupportedEncryption => KrbErrorCode::KdcErrEtypeNosupp,
            KrbError::DerDecodeTicket | KrbError::DerDecodeEncTicketPart => {
                KrbErrorCode::KrbApErrMsgType
            }
            _ => KrbErrorCode::KrbErrGeneric,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KrbError;
    use crate::asn1::constants::errors::KrbErrorCode;

    #[test]
    fn time_errors_map_to_ticket_time_codes() {
        assert_eq!(
            KrbError::TicketNotYetValid.krb_error_code(),
            KrbErrorCode::KrbApErrTktNyv
        );
        assert_eq!(
            KrbError::TicketExpired.krb_error_code(),
            KrbErrorCode::KrbApErrTktExpired
        );
        assert_eq!(i32::from(KrbError::TicketExpired.krb_error_code()), 32);
        assert_eq!(
            KrbError::LegacyConversionFailed.krb_error_code(),
            KrbErrorCode::KrbErrGeneric
        );
    }
}
