pub mod authorization_data;
pub mod constants;
pub mod enc_ticket_part;
pub mod encrypted_data;
pub mod encryption_key;
pub mod host_address;
pub mod kerberos_string;
pub mod kerberos_time;
pub mod principal_name;
pub mod realm;
pub mod tagged_ticket;
pub mod ticket_flags;
pub mod transited_encoding;

pub use der::asn1::OctetString;
