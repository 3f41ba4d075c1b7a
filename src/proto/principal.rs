use super::Name;
use crate::constants::LEGACY_NAME_SZ;
use crate::error::KrbError;
use tracing::{error, trace};

/// Client and service names split into the legacy name, instance and realm fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyNames {
    pub name: String,
    pub instance: String,
    pub realm: String,
    pub service_name: String,
    pub service_instance: String,
}

/// Maps the principals of a modern ticket onto legacy names.
pub trait PrincipalMapper {
    fn map_principals(&self, client: &Name, service: &Name) -> Result<LegacyNames, KrbError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostConversion {
    // Keep only the first label of the host as the instance.
    FirstLabel,
    Verbatim,
}

/// Service names that differ between the protocols, or whose instance is a host
/// name that must be shortened. Entries are (modern, legacy, conversion).
const SERVICE_TABLE: &[(&str, &str, HostConversion)] = &[
    ("host", "rcmd", HostConversion::FirstLabel),
    ("discuss", "discuss", HostConversion::FirstLabel),
    ("rvdsrv", "rvdsrv", HostConversion::FirstLabel),
    ("sample", "sample", HostConversion::FirstLabel),
    ("olc", "olc", HostConversion::FirstLabel),
    ("pop", "pop", HostConversion::FirstLabel),
    ("sis", "sis", HostConversion::FirstLabel),
    ("rfs", "rfs", HostConversion::FirstLabel),
    ("imap", "imap", HostConversion::FirstLabel),
    ("ftp", "ftp", HostConversion::FirstLabel),
    ("ecat", "ecat", HostConversion::FirstLabel),
    ("daemon", "daemon", HostConversion::FirstLabel),
    ("gnats", "gnats", HostConversion::FirstLabel),
    ("moira", "moira", HostConversion::FirstLabel),
    ("prms", "prms", HostConversion::FirstLabel),
    ("mandarin", "mandarin", HostConversion::FirstLabel),
    ("register", "register", HostConversion::FirstLabel),
    ("changepw", "changepw", HostConversion::FirstLabel),
    ("sms", "sms", HostConversion::FirstLabel),
    ("afpserver", "afpserver", HostConversion::FirstLabel),
    ("gdss", "gdss", HostConversion::FirstLabel),
    ("news", "news", HostConversion::FirstLabel),
    ("abs", "abs", HostConversion::FirstLabel),
    ("nfs", "nfs", HostConversion::FirstLabel),
    ("tftp", "tftp", HostConversion::FirstLabel),
    ("http", "http", HostConversion::FirstLabel),
    ("khttp", "khttp", HostConversion::FirstLabel),
    ("pgpsigner", "pgpsigner", HostConversion::FirstLabel),
    ("irc", "irc", HostConversion::FirstLabel),
    ("mandarin-agent", "mandarin-agent", HostConversion::FirstLabel),
    ("write", "write", HostConversion::FirstLabel),
    ("palladium", "palladium", HostConversion::FirstLabel),
    ("smtp", "smtp", HostConversion::FirstLabel),
    ("lmtp", "lmtp", HostConversion::FirstLabel),
    ("ldap", "ldap", HostConversion::FirstLabel),
    ("acap", "acap", HostConversion::FirstLabel),
    ("argus", "argus", HostConversion::FirstLabel),
    ("mupdate", "mupdate", HostConversion::FirstLabel),
    ("kadmin", "kadmin", HostConversion::Verbatim),
    ("zephyr", "zephyr", HostConversion::Verbatim),
];

/// The conventional mapping: realms carry over unchanged, known host based
/// services are renamed and their host shortened to its first label.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardPrincipalMapper;

impl StandardPrincipalMapper {
    /// Split one principal into (name, instance, realm).
    pub fn map_name(&self, name: &Name) -> Result<(String, String, String), KrbError> {
        let (legacy_name, instance) = match name.components().as_slice() {
            [single] => (single.to_string(), String::new()),
            [service, host] => match SERVICE_TABLE.iter().find(|(v5, _, _)| v5 == service) {
                Some((_, v4, HostConversion::FirstLabel)) => {
                    let label = host.split('.').next().unwrap_or_default();
                    (v4.to_string(), label.to_string())
                }
                Some((_, v4, HostConversion::Verbatim)) => (v4.to_string(), host.to_string()),
                None => (service.to_string(), host.to_string()),
            },
            components => {
                error!(
                    count = components.len(),
                    %name,
                    "principal has too many components for a legacy name"
                );
                return Err(KrbError::NameNumberOfComponents);
            }
        };
        let realm = name.realm().to_string();

        for field in [&legacy_name, &instance, &realm] {
            check_field(field)?;
        }

        trace!(%name, %legacy_name, %instance, %realm, "mapped principal");
        Ok((legacy_name, instance, realm))
    }
}

fn check_field(field: &str) -> Result<(), KrbError> {
    if field.as_bytes().contains(&0) {
        error!("legacy name field contains NUL");
        return Err(KrbError::LegacyNameInvalid);
    }
    // The limit includes the terminator.
    if field.len() >= LEGACY_NAME_SZ {
        error!(len = field.len(), max = LEGACY_NAME_SZ - 1, "legacy name field too long");
        return Err(KrbError::LegacyNameTooLong);
    }
    Ok(())
}

impl PrincipalMapper for StandardPrincipalMapper {
    fn map_principals(&self, client: &Name, service: &Name) -> Result<LegacyNames, KrbError> {
        let (name, instance, realm) = self.map_name(client)?;
        let (service_name, service_instance, _) = self.map_name(service)?;

        Ok(LegacyNames {
            name,
            instance,
            realm,
            service_name,
            service_instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mapper_user_and_host() {
        let names = StandardPrincipalMapper
            .map_principals(
                &Name::principal("alice", "REALM.EXAMPLE"),
                &Name::service_hst("host", "server.realm.example", "REALM.EXAMPLE"),
            )
            .unwrap();

        assert_eq!(
            names,
            LegacyNames {
                name: "alice".to_string(),
                instance: "".to_string(),
                realm: "REALM.EXAMPLE".to_string(),
                service_name: "rcmd".to_string(),
                service_instance: "server".to_string(),
            }
        );
    }

    #[test]
    fn standard_mapper_service_table() {
        let mapper = StandardPrincipalMapper;

        // Sent as NtPrincipal with two components.
        assert_eq!(
            mapper
                .map_name(&Name::service("imap", "mail.example.com", "EXAMPLE.COM"))
                .unwrap(),
            ("imap".to_string(), "mail".to_string(), "EXAMPLE.COM".to_string())
        );

        // Kept whole.
        assert_eq!(
            mapper
                .map_name(&Name::service_hst("zephyr", "zephyr.example.com", "EXAMPLE.COM"))
                .unwrap(),
            (
                "zephyr".to_string(),
                "zephyr.example.com".to_string(),
                "EXAMPLE.COM".to_string()
            )
        );

        // Not in the table, component for component.
        assert_eq!(
            mapper
                .map_name(&Name::service_inst("krbtgt", &["EXAMPLE.COM"], "EXAMPLE.COM"))
                .unwrap(),
            (
                "krbtgt".to_string(),
                "EXAMPLE.COM".to_string(),
                "EXAMPLE.COM".to_string()
            )
        );
        assert_eq!(
            mapper
                .map_name(&Name::service("alice", "admin", "EXAMPLE.COM"))
                .unwrap(),
            ("alice".to_string(), "admin".to_string(), "EXAMPLE.COM".to_string())
        );

        // Service names are case sensitive.
        assert_eq!(
            mapper
                .map_name(&Name::service("HOST", "server.example.com", "EXAMPLE.COM"))
                .unwrap()
                .0,
            "HOST"
        );
    }

    #[test]
    fn standard_mapper_rejects() {
        let mapper = StandardPrincipalMapper;

        assert_eq!(
            mapper
                .map_name(&Name::service_inst("a", &["b", "c"], "EXAMPLE.COM"))
                .unwrap_err(),
            KrbError::NameNumberOfComponents
        );

        let long = "a".repeat(LEGACY_NAME_SZ);
        assert_eq!(
            mapper
                .map_name(&Name::principal(&long, "EXAMPLE.COM"))
                .unwrap_err(),
            KrbError::LegacyNameTooLong
        );
        assert_eq!(
            mapper
                .map_name(&Name::principal("alice", &long))
                .unwrap_err(),
            KrbError::LegacyNameTooLong
        );
        // Exactly fits with the terminator.
        let fits = "a".repeat(LEGACY_NAME_SZ - 1);
        assert!(mapper.map_name(&Name::principal(&fits, "EXAMPLE.COM")).is_ok());

        assert_eq!(
            mapper
                .map_name(&Name::principal("ali\0ce", "EXAMPLE.COM"))
                .unwrap_err(),
            KrbError::LegacyNameInvalid
        );

        // The service side fails the whole mapping.
        assert_eq!(
            mapper
                .map_principals(
                    &Name::principal("alice", "EXAMPLE.COM"),
                    &Name::service_inst("a", &["b", "c"], "EXAMPLE.COM"),
                )
                .unwrap_err(),
            KrbError::NameNumberOfComponents
        );
    }
}
