#![allow(dead_code)]

use cl_demo::{session, Config, DeviceKind};
use std::path::PathBuf;

pub fn kernel(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("kernels").join(name)
}

/// Irgendein OpenCL-Gerät vorhanden? Sonst werden Gerätetests übersprungen.
pub fn device_available() -> bool {
    match session::select_device(DeviceKind::All) {
        Ok(_) => true,
        Err(e) => {
            eprintln!("no OpenCL device, skipping: {e}");
            false
        }
    }
}

pub fn config(kernel_name: &str) -> Config {
    Config::default()
        .with_kernel(kernel(kernel_name))
        .with_device_type(DeviceKind::All)
}
