//! Database entities and the closed status vocabularies shared by the services.

pub mod administrator;
pub mod lot;
pub mod producer;
pub mod tracking_event;
pub mod transport;
pub mod transport_lot;
pub mod transporter;

pub use tracking_event::TrackingStatus;
pub use transport::TransportStatus;

/// Raised when a status label matches none of the known spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// Upper-cases a status label, folds Portuguese accents and collapses spaces and
/// hyphens into single underscores, so `"em transporte"` and `"EM_TRANSPORTE"` compare
/// equal.
pub(crate) fn normalize_label(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'Á' | 'À' | 'Â' | 'Ã' => 'A',
            'É' | 'Ê' => 'E',
            'Í' => 'I',
            'Ó' | 'Ô' | 'Õ' => 'O',
            'Ú' => 'U',
            'Ç' => 'C',
            ' ' | '-' => '_',
            other => other,
        })
        .collect();

    folded
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
