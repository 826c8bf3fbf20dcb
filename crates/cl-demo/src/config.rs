//! Laufzeitkonfiguration: Kernel-Pfad, Gerätetyp, Rücklese-Strategie.

use crate::ClError;
use opencl3::{
    device::{CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU},
    types::cl_device_type,
};
use std::{fmt, path::PathBuf, str::FromStr};

/// Umgebungsvariable, die den Gerätetyp überschreibt.
pub const DEVICE_ENV: &str = "CL_DEMO_DEVICE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Gpu,
    Cpu,
    Accelerator,
    All,
}

impl DeviceKind {
    pub fn cl_type(self) -> cl_device_type {
        match self {
            DeviceKind::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceKind::Cpu => CL_DEVICE_TYPE_CPU,
            DeviceKind::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
            DeviceKind::All => CL_DEVICE_TYPE_ALL,
        }
    }
}

impl FromStr for DeviceKind {
    type Err = ClError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" => Ok(DeviceKind::Gpu),
            "cpu" => Ok(DeviceKind::Cpu),
            "accelerator" => Ok(DeviceKind::Accelerator),
            "all" => Ok(DeviceKind::All),
            other => Err(ClError::Config(format!(
                "{DEVICE_ENV}={other:?}, expected gpu, cpu, accelerator or all"
            ))),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Gpu => "gpu",
            DeviceKind::Cpu => "cpu",
            DeviceKind::Accelerator => "accelerator",
            DeviceKind::All => "all",
        })
    }
}

/// Wie das Ergebnis vom Device zurückkommt. Beide Wege blockieren, bis
/// die Queue den Kernel abgearbeitet hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
    /// `clEnqueueReadBuffer` in ein Host-Array
    Read,
    /// `clEnqueueMapBuffer`, lesen, `clEnqueueUnmapMemObject`
    Map,
}

impl Default for Retrieval {
    #[cfg(feature = "read-buffer")]
    fn default() -> Self {
        Retrieval::Read
    }

    #[cfg(not(feature = "read-buffer"))]
    fn default() -> Self {
        Retrieval::Map
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub kernel_path: PathBuf,
    pub entry_point: String,
    pub build_options: String,
    pub device_type: DeviceKind,
    pub retrieval: Retrieval,
}

impl Config {
    pub const DEFAULT_KERNEL: &'static str = "test.cl";
    pub const ENTRY_POINT: &'static str = "test_kernel";
    pub const BUILD_OPTIONS: &'static str = "-Werror";

    /// Aus `std::env::args()` und [`DEVICE_ENV`].
    pub fn from_env() -> Result<Self, ClError> {
        Self::from_parts(std::env::args().skip(1), std::env::var(DEVICE_ENV).ok())
    }

    /// Erstes Positionsargument ist der Kernel-Pfad, der Rest wird ignoriert.
    pub fn from_parts<I>(args: I, device: Option<String>) -> Result<Self, ClError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = Config::default();
        if let Some(path) = args.into_iter().next() {
            cfg.kernel_path = PathBuf::from(path);
        }
        if let Some(device) = device {
            cfg.device_type = device.parse()?;
        }
        Ok(cfg)
    }

    pub fn with_kernel(mut self, path: impl Into<PathBuf>) -> Self {
        self.kernel_path = path.into();
        self
    }

    pub fn with_device_type(mut self, kind: DeviceKind) -> Self {
        self.device_type = kind;
        self
    }

    pub fn with_retrieval(mut self, retrieval: Retrieval) -> Self {
        self.retrieval = retrieval;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kernel_path: PathBuf::from(Self::DEFAULT_KERNEL),
            entry_point: Self::ENTRY_POINT.to_owned(),
            build_options: Self::BUILD_OPTIONS.to_owned(),
            device_type: DeviceKind::default(),
            retrieval: Retrieval::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_match_the_demo_setup() {
        let cfg = Config::from_parts(args(&[]), None).unwrap();
        assert_eq!(cfg.kernel_path, PathBuf::from("test.cl"));
        assert_eq!(cfg.entry_point, "test_kernel");
        assert_eq!(cfg.build_options, "-Werror");
        assert_eq!(cfg.device_type, DeviceKind::Gpu);
    }

    #[test]
    fn first_positional_argument_is_the_kernel_path() {
        let cfg = Config::from_parts(args(&["kernels/copy.cl", "ignored"]), None).unwrap();
        assert_eq!(cfg.kernel_path, PathBuf::from("kernels/copy.cl"));
    }

    #[test]
    fn device_override_is_case_insensitive() {
        let cfg = Config::from_parts(args(&[]), Some(" CPU ".into())).unwrap();
        assert_eq!(cfg.device_type, DeviceKind::Cpu);
        assert_eq!(cfg.device_type.cl_type(), CL_DEVICE_TYPE_CPU);
    }

    #[test]
    fn unknown_device_kind_is_a_config_error() {
        let err = Config::from_parts(args(&[]), Some("fpga".into())).unwrap_err();
        assert!(matches!(err, ClError::Config(_)));
        assert!(err.to_string().contains("fpga"));
    }

    #[test]
    fn device_kind_display_parses_back() {
        for kind in [DeviceKind::Gpu, DeviceKind::Cpu, DeviceKind::Accelerator, DeviceKind::All] {
            assert_eq!(kind.to_string().parse::<DeviceKind>().unwrap(), kind);
        }
    }

    #[cfg(not(feature = "read-buffer"))]
    #[test]
    fn mapping_is_the_default_retrieval() {
        assert_eq!(Config::default().retrieval, Retrieval::Map);
    }

    #[cfg(feature = "read-buffer")]
    #[test]
    fn read_buffer_feature_switches_retrieval() {
        assert_eq!(Config::default().retrieval, Retrieval::Read);
    }
}
