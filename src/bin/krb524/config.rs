use krb524::error::KrbError;
use krb524::proto::{ConversionContext, EncryptionType, LegacyByteOrder, ServiceKey};
use serde::Deserialize;
use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::error;
use zeroize::Zeroize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Native,
    Little,
    Big,
}

impl From<ByteOrder> for LegacyByteOrder {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Native => LegacyByteOrder::native(),
            ByteOrder::Little => LegacyByteOrder::Little,
            ByteOrder::Big => LegacyByteOrder::Big,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyEnctype {
    DesCbcCrc,
    DesCbcMd5,
    Des3CbcRaw,
    Des3CbcSha1,
    Des3HmacSha1,
    #[serde(rename = "aes256-cts-hmac-sha1-96")]
    Aes256CtsHmacSha196,
}

impl From<KeyEnctype> for EncryptionType {
    fn from(enctype: KeyEnctype) -> Self {
        match enctype {
            KeyEnctype::DesCbcCrc => EncryptionType::DES_CBC_CRC,
            KeyEnctype::DesCbcMd5 => EncryptionType::DES_CBC_MD5,
            KeyEnctype::Des3CbcRaw => EncryptionType::DES3_CBC_RAW,
            KeyEnctype::Des3CbcSha1 => EncryptionType::DES3_CBC_SHA1_KD,
            KeyEnctype::Des3HmacSha1 => EncryptionType::LOCAL_DES3_HMAC_SHA1,
            KeyEnctype::Aes256CtsHmacSha196 => EncryptionType::AES256_CTS_HMAC_SHA1_96,
        }
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
pub struct HexKey(#[serde(deserialize_with = "hex::serde::deserialize")] Vec<u8>);

impl Drop for HexKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for HexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HexKey([redacted])")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    pub enctype: KeyEnctype,
    pub key: Option<HexKey>,
    pub password: Option<String>,
    pub salt: Option<String>,
    pub iterations: Option<u32>,
    pub kvno: Option<u32>,
}

impl KeyConfig {
    pub fn service_key(&self) -> Result<ServiceKey, KrbError> {
        let etype = EncryptionType::from(self.enctype);

        let key = match (&self.key, &self.password) {
            (Some(HexKey(k)), None) => ServiceKey::new(etype, k)?,
            (None, Some(password)) if etype == EncryptionType::AES256_CTS_HMAC_SHA1_96 => {
                let Some(salt) = &self.salt else {
                    error!("a password derived key requires a salt");
                    return Err(KrbError::InvalidEncryptionKey);
                };
                ServiceKey::new_aes256_cts_hmac_sha1_96(password, salt, self.iterations)?
            }
            (None, Some(_)) => {
                error!(?etype, "only aes256 keys can be derived from a password");
                return Err(KrbError::UnsupportedEncryption);
            }
            _ => {
                error!("exactly one of key or password must be set");
                return Err(KrbError::InvalidEncryptionKey);
            }
        };

        Ok(match self.kvno {
            Some(kvno) => key.with_kvno(kvno),
            None => key,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub debug: bool,
    /// Seconds.
    pub clock_skew: Option<u64>,
    #[serde(default)]
    pub byte_order: ByteOrder,
    pub source_key: KeyConfig,
    pub dest_key: KeyConfig,
}

impl Config {
    pub fn parse<P: AsRef<Path>>(path: P) -> io::Result<Config> {
        let mut contents = String::new();
        let mut f = fs::File::open(&path)?;
        f.read_to_string(&mut contents)?;

        toml::from_str(&contents).map_err(|err| {
            error!(?err);
            io::Error::other("toml parse failure")
        })
    }

    pub fn context(&self) -> ConversionContext {
        let defaults = ConversionContext::default();
        ConversionContext {
            clock_skew: self
                .clock_skew
                .map(Duration::from_secs)
                .unwrap_or(defaults.clock_skew),
            byte_order: self.byte_order.into(),
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_str(contents: &str) -> io::Result<Config> {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temporary file");
        file.write_all(contents.as_bytes())
            .expect("Failed to write config");
        Config::parse(file.path())
    }

    #[test]
    fn test_config_parse_full() {
        let cfg = parse_str(
            r#"
debug = true
clock_skew = 60
byte_order = "big"

[source_key]
enctype = "aes256-cts-hmac-sha1-96"
password = "a service password"
salt = "EXAMPLE.COMhostserver.example.com"
kvno = 3

[dest_key]
enctype = "des-cbc-crc"
key = "0123456789abcdef"
kvno = 1
"#,
        )
        .expect("Failed to parse config");

        let ctx = cfg.context();
        assert!(ctx.debug);
        assert_eq!(ctx.clock_skew, Duration::from_secs(60));
        assert_eq!(ctx.byte_order, LegacyByteOrder::Big);

        let source = cfg.source_key.service_key().expect("source key");
        assert_eq!(source.etype(), EncryptionType::AES256_CTS_HMAC_SHA1_96);
        assert_eq!(source.kvno(), Some(3));
        assert_eq!(source.key_bytes().len(), 32);

        let dest = cfg.dest_key.service_key().expect("dest key");
        assert_eq!(dest.etype(), EncryptionType::DES_CBC_CRC);
        assert_eq!(
            dest.key_bytes(),
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]
        );
    }

    #[test]
    fn test_config_parse_defaults() {
        let cfg = parse_str(
            r#"
[source_key]
enctype = "aes256-cts-hmac-sha1-96"
key = "0000000000000000000000000000000000000000000000000000000000000000"

[dest_key]
enctype = "des3-cbc-sha1"
key = "0123456789abcdef0123456789abcdef0123456789abcdef"
"#,
        )
        .expect("Failed to parse config");

        assert_eq!(cfg.context(), ConversionContext::default());
        assert_eq!(
            cfg.dest_key.service_key().expect("dest key").etype(),
            EncryptionType::DES3_CBC_SHA1_KD
        );
    }

    #[test]
    fn test_config_key_errors() {
        let cfg = parse_str(
            r#"
[source_key]
enctype = "des-cbc-md5"
password = "password"
salt = "salt"

[dest_key]
enctype = "des-cbc-crc"
key = "0123456789abcdef"
password = "password"
"#,
        )
        .expect("Failed to parse config");

        assert_eq!(
            cfg.source_key.service_key().unwrap_err(),
            KrbError::UnsupportedEncryption
        );
        assert_eq!(
            cfg.dest_key.service_key().unwrap_err(),
            KrbError::InvalidEncryptionKey
        );

        // A password without a salt, and a short key.
        let cfg = parse_str(
            r#"
[source_key]
enctype = "aes256-cts-hmac-sha1-96"
password = "password"

[dest_key]
enctype = "des-cbc-crc"
key = "0123456789ab"
"#,
        )
        .expect("Failed to parse config");

        assert_eq!(
            cfg.source_key.service_key().unwrap_err(),
            KrbError::InvalidEncryptionKey
        );
        assert_eq!(
            cfg.dest_key.service_key().unwrap_err(),
            KrbError::InvalidEncryptionKey
        );
    }

    #[test]
    fn test_config_parse_rejects() {
        // Not hex.
        assert!(parse_str(
            r#"
[source_key]
enctype = "des-cbc-crc"
key = "not hex"

[dest_key]
enctype = "des-cbc-crc"
key = "0123456789abcdef"
"#
        )
        .is_err());

        // Unknown enctype.
        assert!(parse_str(
            r#"
[source_key]
enctype = "rc4-hmac"
key = "0123456789abcdef"

[dest_key]
enctype = "des-cbc-crc"
key = "0123456789abcdef"
"#
        )
        .is_err());

        assert!(Config::parse("/nonexistent/krb524.toml").is_err());
    }
}
