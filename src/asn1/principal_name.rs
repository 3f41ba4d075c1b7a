use super::kerberos_string::KerberosString;
use der::Sequence;

/// ```text
///   PrincipalName   ::= SEQUENCE {
///           name-type       [0] Int32,
///           name-string     [1] SEQUENCE OF KerberosString
///   }
/// ````
#[derive(Debug, Eq, PartialEq, Sequence)]
pub(crate) struct PrincipalName {
    // A hint only. The component count decides how a name is mapped.
    #[asn1(context_specific = "0")]
    pub(crate) name_type: i32,
    #[asn1(context_specific = "1")]
    pub(crate) name_string: Vec<KerberosString>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;
    use der::{Decode, Encode};
    use std::str::FromStr;

    #[test]
    fn principal_name_general_string_components() {
        let der_bytes = hex::decode("3010a003020101a10930071b05616c696365").unwrap();

        let name = PrincipalName::from_der(&der_bytes).unwrap();
        assert_eq!(name.name_type, 1);
        assert_eq!(name.name_string.len(), 1);
        assert_eq!(name.name_string[0].as_str(), "alice");

        let built = PrincipalName {
            name_type: 1,
            name_string: vec![KerberosString::from_str("alice").unwrap()],
        };
        assert_eq_hex!(built.to_der().unwrap(), der_bytes);
    }
}
