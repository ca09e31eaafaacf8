use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::ops::Deref;

/// A [`SecretString`] that can be read from configuration sources.
///
/// The value is wrapped as soon as it is deserialized and is redacted in debug output. It is
/// never serialized back, so configuration dumps cannot leak it.
#[derive(Clone, Debug)]
pub struct ConfigSecret(SecretString);

impl Deref for ConfigSecret {
    type Target = SecretString;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for ConfigSecret {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<ConfigSecret> for SecretString {
    fn from(value: ConfigSecret) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for ConfigSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Ok(Self(string.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn debug_output_is_redacted() {
        let secret = ConfigSecret::from("hunter2".to_string());

        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.expose_secret(), "hunter2");
    }
}
