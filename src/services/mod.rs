// Tracking and shipment engine
pub mod tracking;

// Lots owned by producers
pub mod lots;

// Producer, transporter and administrator accounts
pub mod accounts;

// Analytics and Reporting
pub mod reports;

use sea_orm::TransactionError;

use crate::errors::ServiceError;

/// Flattens the error of a `TransactionTrait::transaction` call.
pub(crate) fn transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Presence check for a required input field.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::missing_field(field))
}

/// Presence check for a required text field; blank strings count as missing.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::missing_field(field)),
    }
}

/// Trims optional text, turning blank strings into `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_missing() {
        assert!(required_text(Some("   ".into()), "product").is_err());
        assert!(required_text(None, "product").is_err());
        assert_eq!(
            required_text(Some(" Coffee ".into()), "product").unwrap(),
            "Coffee"
        );
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" Farm A ".into())), Some("Farm A".into()));
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = required::<i32>(None, "producer_id").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: producer_id is required");
    }
}
