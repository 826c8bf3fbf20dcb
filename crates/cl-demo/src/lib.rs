// ─── Module ───────────────────────────────────────────────────────────
pub mod buffer;
pub mod callbacks;
pub mod config;
pub mod info;
pub mod loader;
pub mod report;
pub mod session;
pub mod status;

pub use buffer::DeviceBuffer;
pub use config::{Config, DeviceKind, Retrieval};
pub use session::{Bound, Built, Executed, Session, State};
pub use status::{Status, StatusCode};

use std::path::PathBuf;

/// Feste Eingabedaten, einmal in den Device-Speicher kopiert.
pub const TEST_DATA: [f32; 8] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

// ─── Fehler‑Typ & cl_try! ─────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum ClError {
    #[error("{file}:{line}: {op} failed: {status}")]
    Api {
        op: &'static str,
        status: StatusCode,
        file: &'static str,
        line: u32,
    },

    #[error("{what} '{}': {source}", .path.display())]
    Io {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation error")]
    BuildFailed { log: String },

    #[error("Compilation failed: {status}")]
    Compile { status: StatusCode },

    #[error("Invalid buffer size: {0}")]
    InvalidSize(usize),

    #[error("no OpenCL platforms available")]
    NoPlatforms,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClError {
    /// Symbolischer Statusname, falls der Fehler einen OpenCL-Code trägt.
    pub fn status_name(&self) -> Option<&'static str> {
        match self {
            ClError::Api { status, .. } | ClError::Compile { status } => {
                Some(status.name())
            }
            ClError::BuildFailed { .. } => Some(Status::BuildProgramFailure.name()),
            _ => None,
        }
    }

    /// OS-Fehlercode, falls vorhanden.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            ClError::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Rohcode aus den Fehlertypen der Bindings.
pub(crate) trait RawStatus {
    fn raw(self) -> i32;
}

impl RawStatus for opencl3::error_codes::ClError {
    #[inline]
    fn raw(self) -> i32 {
        self.0
    }
}

impl RawStatus for i32 {
    #[inline]
    fn raw(self) -> i32 {
        self
    }
}

/// Makro: wandelt ein Binding-Result in `ClError::Api` mit Aufrufstelle
macro_rules! cl_try {
    ($op:literal, $expr:expr) => {
        ($expr).map_err(|e| crate::ClError::Api {
            op: $op,
            status: crate::StatusCode(crate::RawStatus::raw(e)),
            file: file!(),
            line: line!(),
        })?
    };
}
pub(crate) use cl_try;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_names_call_site_and_status() {
        let err = ClError::Api {
            op: "clCreateKernel",
            status: StatusCode(-46),
            file: "src/session.rs",
            line: 42,
        };
        assert_eq!(
            err.to_string(),
            "src/session.rs:42: clCreateKernel failed: CL_INVALID_KERNEL_NAME"
        );
        assert_eq!(err.status_name(), Some("CL_INVALID_KERNEL_NAME"));
    }

    #[test]
    fn unknown_status_uses_fallback_name() {
        let err = ClError::Compile { status: StatusCode(-777) };
        assert_eq!(err.to_string(), "Compilation failed: Unknown error");
    }

    #[test]
    fn build_failure_is_distinguished() {
        let err = ClError::BuildFailed { log: "1:1: error".into() };
        assert_eq!(err.to_string(), "Compilation error");
        assert_eq!(err.status_name(), Some("CL_BUILD_PROGRAM_FAILURE"));
    }

    #[test]
    fn io_error_carries_path_and_os_code() {
        let err = ClError::Io {
            what: "failed to open",
            path: PathBuf::from("missing.cl"),
            source: std::io::Error::from_raw_os_error(2),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("failed to open 'missing.cl': "), "{msg}");
        assert!(msg.contains("os error 2"), "{msg}");
        assert_eq!(err.os_code(), Some(2));
    }

    #[test]
    fn cl_try_records_operation() {
        fn failing() -> Result<(), ClError> {
            let r: Result<(), i32> = Err(-5);
            cl_try!("clEnqueueReadBuffer", r);
            Ok(())
        }
        match failing() {
            Err(ClError::Api { op, status, file, .. }) => {
                assert_eq!(op, "clEnqueueReadBuffer");
                assert_eq!(status, StatusCode(-5));
                assert!(file.ends_with("lib.rs"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
