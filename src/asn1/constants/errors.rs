use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The subset of RFC 4120 section 7.5.9 error codes a ticket conversion can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum KrbErrorCode {
    KdcErrNone = 0,
    KdcErrEtypeNosupp = 14,
    KrbApErrBadIntegrity = 31,
    KrbApErrTktExpired = 32,
    KrbApErrTktNyv = 33,
    KrbApErrBadAddr = 38,
    KrbApErrMsgType = 40,
    KrbErrGeneric = 60,
}
