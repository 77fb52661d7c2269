use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// Checks that `name` is a plain, unqualified SQL identifier.
///
/// Table and index names are interpolated into DDL (identifiers cannot be bound
/// as parameters), so anything other than `[A-Za-z_][A-Za-z0-9_]*` is rejected.
pub fn validate_identifier(name: &str) -> Result<(), CoreError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') || name.len() > 63 {
        return Err(CoreError::InvalidInput(
            "identifier".to_string(),
            format!("'{}' is not a plain SQL identifier", name),
        ));
    }
    Ok(())
}

/// Double-quotes an identifier for use in DDL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_identifier("events").is_ok());
        assert!(validate_identifier("_trigger_words2").is_ok());
    }

    #[test]
    fn rejects_anything_that_could_escape_ddl() {
        for bad in ["", "1events", "events;drop", "public.events", "ev\"ents", "ev ents"] {
            assert!(validate_identifier(bad).is_err(), "{bad} should be rejected");
        }
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("timestamp"), "\"timestamp\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
