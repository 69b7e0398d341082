//! Input validation for text entering a message
//!
//! Prevents injection attacks through edited headers: anything the facade
//! inserts into a message is checked here first.

use crate::error::{EditError, EditResult};

/// Validate a header name before it is written into a message
pub fn validate_header_name(name: &str) -> EditResult<()> {
    if name.is_empty() {
        return Err(EditError::fragment_error("Empty header name"));
    }
    for ch in name.chars() {
        match ch {
            ':' | '\r' | '\n' | '\0' | ' ' | '\t' => {
                return Err(EditError::fragment_error(format!(
                    "Invalid character in header name: {:?}",
                    ch
                )));
            }
            '\x01'..='\x1F' | '\x7F' => {
                return Err(EditError::fragment_error(format!(
                    "Control character in header name: {:?}",
                    ch
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Validate a header field value for injection attacks
pub fn validate_header_value(value: &str) -> EditResult<()> {
    // Check for CRLF injection
    if value.contains('\r') || value.contains('\n') {
        return Err(EditError::fragment_error(
            "CRLF injection attempt detected in header value",
        ));
    }

    // Check for null bytes
    if value.contains('\0') {
        return Err(EditError::fragment_error("Null byte in header value"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_and_values() {
        assert!(validate_header_name("Record-Route").is_ok());
        assert!(validate_header_name("P-Asserted-Identity").is_ok());
        assert!(validate_header_value("<sip:proxy.example.com;lr>").is_ok());
        assert!(validate_header_value("SIP/2.0/UDP host;branch=z9hG4bK1").is_ok());
    }

    #[test]
    fn test_crlf_injection_rejected() {
        assert!(validate_header_value("value\r\nEvil: injected").is_err());
        assert!(validate_header_value("value\n").is_err());
        assert!(validate_header_name("Via\r\n").is_err());
    }

    #[test]
    fn test_malformed_names_rejected() {
        assert!(validate_header_name("").is_err());
        assert!(validate_header_name("Via:").is_err());
        assert!(validate_header_name("Via Header").is_err());
        assert!(validate_header_name("Via\x01").is_err());
    }

    #[test]
    fn test_null_byte_rejected() {
        assert!(validate_header_value("val\0ue").is_err());
    }
}
