use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps a contact identifier (usually an email) so it never lands in logs verbatim.
///
/// Debug and Display print a masked form; serialization emits the real value
/// because API responses need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

fn mask(raw: &str) -> String {
    match raw.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "********".to_string(),
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(self.0.as_ref()))
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask(self.0.as_ref()))
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_masked_in_logs() {
        let contact = Masked("alice@example.com".to_string());
        assert_eq!(format!("{}", contact), "a***@example.com");
        assert_eq!(format!("{:?}", contact), "a***@example.com");
    }

    #[test]
    fn test_opaque_identifier_fully_masked() {
        let contact = Masked("session-1234");
        assert_eq!(contact.to_string(), "********");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let contact = Masked("bob@example.com".to_string());
        assert_eq!(serde_json::to_string(&contact).unwrap(), "\"bob@example.com\"");
    }
}
