pub mod address_types;
pub mod encryption_types;
pub mod errors;
pub mod princ_name_types;

pub use self::address_types::AddressType;
pub use self::encryption_types::EncryptionType;
pub use self::errors::KrbErrorCode;
pub use self::princ_name_types::PrincipalNameType;
