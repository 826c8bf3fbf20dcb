//! Diagnoseausgaben: Plattformen, Geräte, Buffer, Kernel.

use crate::{cl_try, ClError, DeviceBuffer};
use opencl3::{
    device::{Device, CL_DEVICE_TYPE_ALL},
    kernel::Kernel,
    platform::{get_platforms, Platform},
    types::cl_device_id,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub index: usize,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub profile: String,
    pub extensions: String,
    pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    pub platform: usize,
    pub name: String,
    pub vendor: String,
    pub driver_version: String,
    pub profile: String,
    pub version: String,
    pub opencl_c_version: String,
    pub extensions: String,
    pub max_compute_units: u32,
    pub max_work_item_dimensions: u32,
    pub max_clock_frequency: u32,
}

impl PlatformInfo {
    fn query(index: usize, platform: &Platform) -> Result<Self, ClError> {
        let ids = cl_try!("clGetDeviceIDs", platform.get_devices(CL_DEVICE_TYPE_ALL));
        let devices = ids
            .into_iter()
            .enumerate()
            .map(|(d, id)| DeviceInfo::query(index, d, id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            index,
            name: cl_try!("clGetPlatformInfo", platform.name()),
            vendor: cl_try!("clGetPlatformInfo", platform.vendor()),
            version: cl_try!("clGetPlatformInfo", platform.version()),
            profile: cl_try!("clGetPlatformInfo", platform.profile()),
            extensions: cl_try!("clGetPlatformInfo", platform.extensions()),
            devices,
        })
    }
}

impl DeviceInfo {
    fn query(platform: usize, index: usize, id: cl_device_id) -> Result<Self, ClError> {
        let dev = Device::new(id);
        Ok(Self {
            index,
            platform,
            name: cl_try!("clGetDeviceInfo", dev.name()),
            vendor: cl_try!("clGetDeviceInfo", dev.vendor()),
            driver_version: cl_try!("clGetDeviceInfo", dev.driver_version()),
            profile: cl_try!("clGetDeviceInfo", dev.profile()),
            version: cl_try!("clGetDeviceInfo", dev.version()),
            opencl_c_version: cl_try!("clGetDeviceInfo", dev.opencl_c_version()),
            extensions: cl_try!("clGetDeviceInfo", dev.extensions()),
            max_compute_units: cl_try!("clGetDeviceInfo", dev.max_compute_units()),
            max_work_item_dimensions: cl_try!("clGetDeviceInfo", dev.max_work_item_dimensions()),
            max_clock_frequency: cl_try!("clGetDeviceInfo", dev.max_clock_frequency()),
        })
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Platform {} ==========", self.index)?;
        writeln!(f, "CL_PLATFORM_NAME: {}", self.name)?;
        writeln!(f, "CL_PLATFORM_VENDOR: {}", self.vendor)?;
        writeln!(f, "CL_PLATFORM_VERSION: {}", self.version)?;
        writeln!(f, "CL_PLATFORM_PROFILE: {}", self.profile)?;
        writeln!(f, "CL_PLATFORM_EXTENSIONS: {}", self.extensions)?;
        for dev in &self.devices {
            write!(f, "{dev}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Device {} of platform {} =====", self.index, self.platform)?;
        writeln!(f, "CL_DEVICE_NAME: {}", self.name)?;
        writeln!(f, "CL_DEVICE_VENDOR: {}", self.vendor)?;
        writeln!(f, "CL_DRIVER_VERSION: {}", self.driver_version)?;
        writeln!(f, "CL_DEVICE_PROFILE: {}", self.profile)?;
        writeln!(f, "CL_DEVICE_VERSION: {}", self.version)?;
        writeln!(f, "CL_DEVICE_OPENCL_C_VERSION: {}", self.opencl_c_version)?;
        writeln!(f, "CL_DEVICE_EXTENSIONS: {}", self.extensions)?;
        writeln!(f, "CL_DEVICE_MAX_COMPUTE_UNITS: {}", self.max_compute_units)?;
        writeln!(f, "CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS: {}", self.max_work_item_dimensions)?;
        writeln!(f, "CL_DEVICE_MAX_CLOCK_FREQUENCY: {}", self.max_clock_frequency)
    }
}

/// Alle Plattformen samt Geräten (jeden Typs). Null Plattformen ist ein
/// Fehler, eine Plattform ohne Geräte nicht.
pub fn enumerate() -> Result<Vec<PlatformInfo>, ClError> {
    let platforms = cl_try!("clGetPlatformIDs", get_platforms());
    if platforms.is_empty() {
        return Err(ClError::NoPlatforms);
    }
    platforms
        .iter()
        .enumerate()
        .map(|(p, platform)| PlatformInfo::query(p, platform))
        .collect()
}

pub fn print_platform_and_dev_info() -> Result<(), ClError> {
    for platform in enumerate()? {
        print!("{platform}");
    }
    Ok(())
}

/// Ressourcenbedarf eines Kernels auf einem Gerät.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelInfo {
    pub work_group_size: usize,
    pub preferred_work_group_size_multiple: usize,
    pub local_mem_size: u64,
    pub private_mem_size: u64,
}

impl KernelInfo {
    pub fn query(kernel: &Kernel, device: cl_device_id) -> Result<Self, ClError> {
        Ok(Self {
            work_group_size: cl_try!(
                "clGetKernelWorkGroupInfo",
                kernel.get_work_group_size(device)
            ),
            // Vielfaches davon bevorzugen, entspricht der Warp-/Wavefront-Breite
            preferred_work_group_size_multiple: cl_try!(
                "clGetKernelWorkGroupInfo",
                kernel.get_work_group_size_multiple(device)
            ),
            local_mem_size: cl_try!(
                "clGetKernelWorkGroupInfo",
                kernel.get_local_mem_size(device)
            ),
            private_mem_size: cl_try!(
                "clGetKernelWorkGroupInfo",
                kernel.get_private_mem_size(device)
            ),
        })
    }
}

impl fmt::Display for KernelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CL_KERNEL_WORK_GROUP_SIZE: {}", self.work_group_size)?;
        writeln!(
            f,
            "CL_KERNEL_PREFERRED_WORK_GROUP_SIZE_MULTIPLE: {}",
            self.preferred_work_group_size_multiple
        )?;
        writeln!(f, "CL_KERNEL_LOCAL_MEM_SIZE: {}", self.local_mem_size)?;
        writeln!(f, "CL_KERNEL_PRIVATE_MEM_SIZE: {}", self.private_mem_size)
    }
}

pub fn print_kernel_info(kernel: &Kernel, device: cl_device_id) -> Result<KernelInfo, ClError> {
    let info = KernelInfo::query(kernel, device)?;
    print!("{info}");
    Ok(info)
}

pub fn print_buf_info(buf: &DeviceBuffer) -> Result<usize, ClError> {
    let actual = buf.allocated_size()?;
    println!("Actual size of {}: {actual}", buf.tag());
    Ok(actual)
}
