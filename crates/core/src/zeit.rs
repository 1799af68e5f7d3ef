//! Zeithilfen
//!
//! Token-Ablaufzeiten werden als Millisekunden seit der Unix-Epoche gespeichert.

use chrono::{DateTime, TimeZone, Utc};

/// Wandelt einen Millisekunden-Zeitstempel in ein Datum um
///
/// Gibt `None` zurueck wenn der Wert ausserhalb des darstellbaren Bereichs liegt.
pub fn ms_zu_datum(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
