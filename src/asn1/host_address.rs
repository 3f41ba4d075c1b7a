use der::asn1::OctetString;
use der::Sequence;

/// A network address a ticket may be used from. For `addr_type` 2 the address is
/// the four octets of an IPv4 address in network order.
///
/// ```text
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
///
/// HostAddresses   ::= SEQUENCE OF HostAddress
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub(crate) struct HostAddress {
    #[asn1(context_specific = "0")]
    pub(crate) addr_type: i32,
    #[asn1(context_specific = "1")]
    pub(crate) address: OctetString,
}

pub(crate) type HostAddresses = Vec<HostAddress>;
