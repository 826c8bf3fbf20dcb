//! Prozess-Abbruch bei nicht behebbaren Fehlern.
//!
//! Alle Schritte liefern `Result<_, ClError>`; erst hier wird formatiert
//! und beendet.

use crate::ClError;
use std::process;

/// Die Diagnosezeile, wie sie auf stderr landet.
pub fn render(err: &ClError) -> String {
    match err {
        // Ohne OS-Code bleibt nur die Beschreibung
        ClError::Io { source, .. } => match source.raw_os_error() {
            Some(code) => format!("{err} (errno = {code})"),
            None => err.to_string(),
        },
        ClError::BuildFailed { log } => format!("{err}\n{log}"),
        other => other.to_string(),
    }
}

/// Schreibt die Meldung nach stderr und beendet mit `EXIT_FAILURE`.
pub fn fail(err: &ClError) -> ! {
    log::debug!("fatal: {err:?}");
    eprintln!("{}", render(err));
    process::exit(1)
}
