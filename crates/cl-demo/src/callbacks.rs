//! Vom Treiber aufgerufene Callbacks. Reine Diagnose, keine Steuerlogik:
//! der Treiber darf sie aus beliebigen Threads und zu beliebiger Zeit rufen.

use once_cell::sync::Lazy;
use opencl3::types::cl_mem;
use std::{
    borrow::Cow,
    ffi::{c_char, c_void, CStr},
    sync::Mutex,
};

/// Tags freigegebener Buffer in Freigabereihenfolge.
static DESTROYED: Lazy<Mutex<Vec<&'static str>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fehler-Callback für `clCreateContext`.
pub extern "C" fn context_error(
    errinfo: *const c_char,
    _private_info: *const c_void,
    _cb: usize,
    _user_data: *mut c_void,
) {
    let msg: Cow<'_, str> = if errinfo.is_null() {
        "<no error info>".into()
    } else {
        // Safety: der Treiber übergibt einen NUL‑terminierten String
        unsafe { CStr::from_ptr(errinfo) }.to_string_lossy()
    };
    log::error!("OpenCL error callback: {msg}");
}

/// Destruktor-Callback für `clSetMemObjectDestructorCallback`.
/// `user_data` stammt aus [`tag_ptr`] und wird hier genau einmal freigegeben.
pub extern "C" fn buffer_destroyed(_memobj: cl_mem, user_data: *mut c_void) {
    if user_data.is_null() {
        return;
    }
    // Safety: stammt aus Box::into_raw in tag_ptr, Callback feuert einmal
    let tag: Box<&'static str> = unsafe { Box::from_raw(user_data.cast()) };
    println!("Object destroyed: {tag}");
    record_destroyed(*tag);
}

/// Verpackt `tag` für die Übergabe als `user_data`.
pub(crate) fn tag_ptr(tag: &'static str) -> *mut c_void {
    Box::into_raw(Box::new(tag)).cast()
}

/// Gibt einen nicht registrierten `user_data`-Zeiger wieder frei.
///
/// # Safety
/// `ptr` muss aus [`tag_ptr`] stammen und darf nicht beim Treiber liegen.
pub(crate) unsafe fn reclaim_tag(ptr: *mut c_void) {
    drop(unsafe { Box::<&'static str>::from_raw(ptr.cast()) });
}

fn record_destroyed(tag: &'static str) {
    // vergiftete Mutex: Diagnose trotzdem behalten
    let mut log = DESTROYED.lock().unwrap_or_else(|p| p.into_inner());
    log.push(tag);
}

/// Bisher gemeldete Buffer-Freigaben.
pub fn destroyed_buffers() -> Vec<&'static str> {
    DESTROYED
        .lock()
        .map(|log| log.clone())
        .unwrap_or_else(|p| p.into_inner().clone())
}
