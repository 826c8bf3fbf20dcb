//! Kompletter Lebenszyklus einer Rechen-Session:
//! Gerät wählen → Kontext → Buffer → Queue → Programm/Kernel → Argumente
//! → Ausführung → Rücklesen → Freigabe.
//!
//! Jeder Schritt ist fatal bei Fehlern; es gibt kein Rollback. Der Zustand
//! steckt im Typ, Rücklesen vor der Ausführung kompiliert nicht.

use crate::{
    callbacks, cl_try,
    config::{Config, DeviceKind, Retrieval},
    info::{self, KernelInfo},
    loader, ClError, DeviceBuffer, RawStatus, Status, StatusCode, TEST_DATA,
};
use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    device::Device,
    kernel::Kernel,
    memory::{ClMem, CL_MAP_READ},
    platform::{get_platforms, Platform},
    program::Program,
    types::{cl_mem, CL_BLOCKING},
};
use std::{ffi::c_void, marker::PhantomData, ptr, slice};

/// Kapazität des Build-Logs inkl. abschließendem NUL.
pub const BUILD_LOG_CAPACITY: usize = 2048;

// ─── Typ‑State‑Marker ────────────────────────────────────────────────
mod sealed {
    pub trait Sealed {}
}

pub trait State: sealed::Sealed {}

/// Kontext, Buffer, Queue, Programm und Kernel existieren.
pub struct Built;
impl sealed::Sealed for Built {}
impl State for Built {}

/// Kernel-Argumente gesetzt.
pub struct Bound;
impl sealed::Sealed for Bound {}
impl State for Bound {}

/// Kernel eingereiht, Ergebnis kann gelesen werden.
pub struct Executed;
impl sealed::Sealed for Executed {}
impl State for Executed {}

// ─── Session ─────────────────────────────────────────────────────────

/// Felder in Freigabereihenfolge: Kontext, in_buf, out_buf, Programm,
/// Kernel, Queue. Auch ein implizites Drop hält diese Reihenfolge ein.
struct Resources {
    context: Context,
    input: DeviceBuffer,
    output: DeviceBuffer,
    program: Program,
    kernel: Kernel,
    queue: CommandQueue,
    platform: Platform,
    device: Device,
    kernel_info: KernelInfo,
    retrieval: Retrieval,
}

/// Rücklesen geht erst nach `execute()`:
///
/// ```compile_fail
/// # use cl_demo::{Config, Session};
/// let session = Session::create(&Config::default()).unwrap();
/// let _ = session.retrieve();
/// ```
pub struct Session<S: State> {
    res: Resources,
    _state: PhantomData<S>,
}

impl<S: State> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &std::any::type_name::<S>())
            .field("input", &self.res.input)
            .field("output", &self.res.output)
            .field("retrieval", &self.res.retrieval)
            .finish()
    }
}

impl Session<Built> {
    /// Schritte 1–5: Gerät, Kontext, Buffer, Queue, Programm + Kernel.
    pub fn create(config: &Config) -> Result<Self, ClError> {
        let (platform, device) = select_device(config.device_type)?;
        let context = create_context(&device)?;
        let (input, output) = create_buffers(&context, &TEST_DATA)?;
        let queue = create_cmd_queue(&context, &device)?;
        let (program, kernel, kernel_info) = compile_program(&context, &device, config)?;

        Ok(Session {
            res: Resources {
                context,
                input,
                output,
                program,
                kernel,
                queue,
                platform,
                device,
                kernel_info,
                retrieval: config.retrieval,
            },
            _state: PhantomData,
        })
    }

    /// in_buf → Argument 0, out_buf → Argument 1.
    pub fn bind_arguments(self) -> Result<Session<Bound>, ClError> {
        let res = &self.res;
        cl_try!("clSetKernelArg", res.kernel.set_arg(0, res.input.raw()));
        cl_try!("clSetKernelArg", res.kernel.set_arg(1, res.output.raw()));
        log::debug!("kernel arguments bound");
        Ok(self.into_state())
    }
}

impl Session<Bound> {
    /// Eindimensionaler Launch über alle Eingabeelemente; Work-Group-Größe
    /// wählt der Treiber. Kehrt sofort zurück (in‑order Queue).
    pub fn execute(self) -> Result<Session<Executed>, ClError> {
        let res = &self.res;
        let global = [res.input.len(), 1, 1];
        let _evt = cl_try!(
            "clEnqueueNDRangeKernel",
            res.queue.enqueue_nd_range_kernel(
                res.kernel.get(),
                1,
                ptr::null(),
                global.as_ptr(),
                ptr::null(),
                &[],
            )
        );
        log::debug!("enqueued {} work-items", global[0]);
        Ok(self.into_state())
    }
}

impl Session<Executed> {
    /// Ergebnis mit der konfigurierten Strategie lesen.
    pub fn retrieve(&self) -> Result<Vec<f32>, ClError> {
        self.retrieve_with(self.res.retrieval)
    }

    /// Blockiert, bis der Kernel fertig ist; beide Strategien liefern
    /// denselben vollständigen Vektor.
    pub fn retrieve_with(&self, retrieval: Retrieval) -> Result<Vec<f32>, ClError> {
        let values = match retrieval {
            Retrieval::Read => self.read_output()?,
            Retrieval::Map => self.map_output()?,
        };
        log::debug!("retrieved {} values via {retrieval:?}", values.len());
        Ok(values)
    }

    fn read_output(&self) -> Result<Vec<f32>, ClError> {
        let res = &self.res;
        let mut host = vec![0.0_f32; res.output.len()];
        // host hat exakt die Länge des Buffers, Lesen blockiert
        let _evt = cl_try!(
            "clEnqueueReadBuffer",
            res.queue
                .enqueue_read_buffer(res.output.raw(), CL_BLOCKING, 0, &mut host, &[])
        );
        Ok(host)
    }

    fn map_output(&self) -> Result<Vec<f32>, ClError> {
        let res = &self.res;
        let bytes = res.output.size_bytes();
        let mut mapped: cl_mem = ptr::null_mut();

        // blockierendes Mapping über den ganzen Buffer
        let _evt = cl_try!(
            "clEnqueueMapBuffer",
            res.queue.enqueue_map_buffer(
                res.output.raw(),
                CL_BLOCKING,
                CL_MAP_READ,
                0,
                bytes,
                &mut mapped,
                &[],
            )
        );

        // Safety: nach dem blockierenden Map gültig für `bytes` Bytes bis zum Unmap
        let view = unsafe { slice::from_raw_parts(mapped as *const u8, bytes) };
        let values = view
            .chunks_exact(std::mem::size_of::<f32>())
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect();

        // `view` wird nach dem Unmap nicht mehr benutzt
        let _evt = cl_try!(
            "clEnqueueUnmapMemObject",
            res.queue
                .enqueue_unmap_mem_object(res.output.raw().get(), mapped as *mut c_void, &[])
        );
        cl_try!("clFinish", res.queue.finish());
        Ok(values)
    }
}

impl<S: State> Session<S> {
    fn into_state<T: State>(self) -> Session<T> {
        Session { res: self.res, _state: PhantomData }
    }

    pub fn platform(&self) -> &Platform {
        &self.res.platform
    }

    pub fn device(&self) -> &Device {
        &self.res.device
    }

    pub fn input(&self) -> &DeviceBuffer {
        &self.res.input
    }

    pub fn output(&self) -> &DeviceBuffer {
        &self.res.output
    }

    pub fn kernel_info(&self) -> &KernelInfo {
        &self.res.kernel_info
    }

    /// Gibt Kontext, in_buf, out_buf, Programm, Kernel und Queue in genau
    /// dieser Reihenfolge frei. Ein fehlschlagendes `clRelease*` bricht ab
    /// (die Drops der Bindings paniken), die restlichen werden nicht versucht.
    pub fn release(self) {
        let Resources {
            context,
            input,
            output,
            program,
            kernel,
            queue,
            ..
        } = self.res;

        drop(context);
        log::debug!("released context");
        drop(input);
        log::debug!("released in_buf");
        drop(output);
        log::debug!("released out_buf");
        drop(program);
        log::debug!("released program");
        drop(kernel);
        log::debug!("released kernel");
        drop(queue);
        log::debug!("released command queue");
    }
}

// ─── Einzelschritte ──────────────────────────────────────────────────

/// Erstes Gerät des gewünschten Typs auf der ersten Plattform.
pub fn select_device(kind: DeviceKind) -> Result<(Platform, Device), ClError> {
    let platform = cl_try!("clGetPlatformIDs", get_platforms())
        .into_iter()
        .next()
        .ok_or(ClError::NoPlatforms)?;

    let id = cl_try!("clGetDeviceIDs", platform.get_devices(kind.cl_type()))
        .into_iter()
        .next()
        .ok_or(ClError::Api {
            op: "clGetDeviceIDs",
            status: StatusCode(Status::DeviceNotFound.code()),
            file: file!(),
            line: line!(),
        })?;

    let device = Device::new(id);
    log::debug!(
        "selected {kind} device {:?} on platform {:?}",
        device.name().unwrap_or_default(),
        platform.name().unwrap_or_default()
    );
    Ok((platform, device))
}

/// Kontext für genau ein Gerät mit Fehler-Callback.
pub fn create_context(device: &Device) -> Result<Context, ClError> {
    // Plattform ergibt sich aus dem Gerät
    let ctx = cl_try!(
        "clCreateContext",
        Context::from_devices(
            &[device.id()],
            &[],
            Some(callbacks::context_error),
            ptr::null_mut(),
        )
    );
    log::debug!("context created");
    Ok(ctx)
}

/// in_buf (read‑only, mit `data` befüllt) und out_buf (write‑only, gleiche Länge).
pub fn create_buffers(
    ctx: &Context,
    data: &[f32],
) -> Result<(DeviceBuffer, DeviceBuffer), ClError> {
    let input = DeviceBuffer::from_slice(ctx, "in_buf", data)?;
    let output = DeviceBuffer::write_only(ctx, "out_buf", data.len())?;

    info::print_buf_info(&input)?;
    info::print_buf_info(&output)?;

    input.watch_release()?;
    output.watch_release()?;
    Ok((input, output))
}

/// In‑order Queue, keine Properties.
pub fn create_cmd_queue(ctx: &Context, device: &Device) -> Result<CommandQueue, ClError> {
    Ok(cl_try!("clCreateCommandQueue", CommandQueue::create(ctx, device.id(), 0)))
}

/// Quelltext laden, mit den Build-Optionen übersetzen, Log immer ausgeben,
/// Einsprungpunkt als Kernel holen.
pub fn compile_program(
    ctx: &Context,
    device: &Device,
    config: &Config,
) -> Result<(Program, Kernel, KernelInfo), ClError> {
    let source = loader::load(&config.kernel_path)?;

    let mut program = cl_try!(
        "clCreateProgramWithSource",
        Program::create_from_source(ctx, source.as_str()?)
    );
    let built = program.build(&[device.id()], &config.build_options);

    let log = cl_try!("clGetProgramBuildInfo", program.get_build_log(device.id()));
    let log = cap_build_log(log);
    println!("Build log:\n{log}");

    if let Err(e) = built {
        let status = StatusCode(e.raw());
        return Err(if status.is(Status::BuildProgramFailure) {
            ClError::BuildFailed { log }
        } else {
            ClError::Compile { status }
        });
    }

    let kernel = cl_try!("clCreateKernel", Kernel::create(&program, &config.entry_point));
    let kernel_info = info::print_kernel_info(&kernel, device.id())?;
    drop(source);

    log::debug!("built {} from {}", config.entry_point, config.kernel_path.display());
    Ok((program, kernel, kernel_info))
}

/// Kürzt auf die feste Log-Kapazität (ohne NUL) an einer Zeichengrenze.
pub fn cap_build_log(log: String) -> String {
    let mut log = log;
    let trimmed = log.trim_end_matches('\0').len();
    log.truncate(trimmed);

    let max = BUILD_LOG_CAPACITY - 1;
    if log.len() > max {
        let mut cut = max;
        while !log.is_char_boundary(cut) {
            cut -= 1;
        }
        log.truncate(cut);
    }
    log
}

/// Ergebniszeile: sechs Nachkommastellen, durch Leerzeichen getrennt.
pub fn format_results(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Der komplette Ablauf einer Session inkl. Ausgabe der Ergebniszeile.
pub fn run(config: &Config) -> Result<Vec<f32>, ClError> {
    let session = Session::create(config)?.bind_arguments()?.execute()?;
    let values = session.retrieve()?;
    println!("{}", format_results(&values));
    session.release();
    Ok(values)
}
