//! Device-Buffer für `f32`-Daten mit Freigabe-Tag.

use crate::{callbacks, cl_try, ClError};
use opencl3::{
    context::Context,
    memory::{
        set_mem_object_destructor_callback, Buffer, ClMem, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY,
        CL_MEM_WRITE_ONLY,
    },
    types::cl_float,
};
use std::{ffi::c_void, ptr};

/// Wrapper um `Buffer<cl_float>`. Das OpenCL-Objekt wird im `Drop` des
/// inneren Buffers freigegeben; der Tag taucht danach im Destruktor-Callback auf.
pub struct DeviceBuffer {
    buf: Buffer<cl_float>,
    len: usize,
    tag: &'static str,
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("tag", &self.tag)
            .field("len", &self.len)
            .finish()
    }
}

impl DeviceBuffer {
    /// Read‑only Buffer, beim Anlegen mit `data` befüllt.
    pub fn from_slice(ctx: &Context, tag: &'static str, data: &[f32]) -> Result<Self, ClError> {
        if data.is_empty() {
            return Err(ClError::InvalidSize(0));
        }
        // COPY_HOST_PTR: der Treiber kopiert, `data` wird nie beschrieben
        let buf = cl_try!(
            "clCreateBuffer",
            Buffer::<cl_float>::create(
                ctx,
                CL_MEM_READ_ONLY | CL_MEM_COPY_HOST_PTR,
                data.len(),
                data.as_ptr() as *mut c_void,
            )
        );
        log::debug!("created {tag}: {} elements, read-only", data.len());
        Ok(Self { buf, len: data.len(), tag })
    }

    /// Write‑only Buffer, uninitialisiert.
    pub fn write_only(ctx: &Context, tag: &'static str, len: usize) -> Result<Self, ClError> {
        if len == 0 {
            return Err(ClError::InvalidSize(len));
        }
        let buf = cl_try!(
            "clCreateBuffer",
            Buffer::<cl_float>::create(ctx, CL_MEM_WRITE_ONLY, len, ptr::null_mut())
        );
        log::debug!("created {tag}: {len} elements, write-only");
        Ok(Self { buf, len, tag })
    }

    /// Registriert den Destruktor-Callback, der beim echten Freigeben den Tag meldet.
    pub fn watch_release(&self) -> Result<(), ClError> {
        let user_data = callbacks::tag_ptr(self.tag);
        let res = set_mem_object_destructor_callback(
            self.buf.get(),
            callbacks::buffer_destroyed,
            user_data,
        );
        if res.is_err() {
            // Safety: Treiber hat den Zeiger nicht übernommen
            unsafe { callbacks::reclaim_tag(user_data) };
        }
        cl_try!("clSetMemObjectDestructorCallback", res);
        Ok(())
    }

    /// Tatsächlich allozierte Größe (`CL_MEM_SIZE`), kann wegen Alignment
    /// größer als angefordert sein.
    pub fn allocated_size(&self) -> Result<usize, ClError> {
        Ok(cl_try!("clGetMemObjectInfo", self.buf.size()))
    }

    #[inline(always)]
    pub fn raw(&self) -> &Buffer<cl_float> {
        &self.buf
    }

    /// Länge in Elementen
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Angeforderte Größe in Bytes
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<cl_float>()
    }

    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}
