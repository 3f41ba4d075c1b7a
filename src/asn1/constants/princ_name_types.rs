use num_enum::{IntoPrimitive, TryFromPrimitive};

/// RFC 4120 section 6.2. Only the first four are accepted on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum PrincipalNameType {
    NtUnknown = 0,
    /// Users, and services sent by MIT with two components.
    NtPrincipal = 1,
    /// Service with an instance, such as krbtgt.
    NtSrvInst = 2,
    /// Service with a host name as instance.
    NtSrvHst = 3,
    NtSrvXhst = 4,
    NtUid = 5,
    NtX500Principal = 6,
    NtSmtpName = 7,
    NtEnterprise = 10,
}
