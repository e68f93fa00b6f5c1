//! Runtime bindings for the NDI sending library.
//!
//! The library is loaded dynamically with `libloading` — there is no
//! compile-time SDK dependency, and a machine without the NDI runtime
//! simply leaves the transport inactive. Loading and `NDIlib_initialize`
//! happen exactly once per process through a [`OnceCell`]; the runtime is
//! a process-wide singleton shared by every tap instance and is never
//! torn down before process exit.

use std::ffi::{c_char, c_int, c_void};

use libloading::{Library, Symbol};
use once_cell::sync::OnceCell;

use crate::error::TapError;

// ── SDK types ────────────────────────────────────────────────────

/// FourCC for planar YUV 4:2:0 (I420) video frames.
pub const FOURCC_I420: i32 = 0x30323449;

/// Progressive frame format.
pub const FRAME_FORMAT_PROGRESSIVE: i32 = 1;

/// Matches `NDIlib_send_create_t`.
#[repr(C)]
pub struct SendCreate {
    pub p_ndi_name: *const c_char,
    pub p_groups: *const c_char,
    pub clock_video: bool,
    pub clock_audio: bool,
}

/// Matches `NDIlib_video_frame_v2_t`.
#[repr(C)]
pub struct VideoFrame {
    pub xres: c_int,
    pub yres: c_int,
    pub four_cc: c_int,
    pub frame_rate_n: c_int,
    pub frame_rate_d: c_int,
    pub picture_aspect_ratio: f32,
    pub frame_format_type: c_int,
    pub timecode: i64,
    pub p_data: *const u8,
    pub line_stride_in_bytes: c_int,
    pub p_metadata: *const c_char,
    pub timestamp: i64,
}

/// Opaque sender handle returned by `NDIlib_send_create`.
pub type SendInstance = *mut c_void;

type InitializeFn = unsafe extern "C" fn() -> bool;
type SendCreateFn = unsafe extern "C" fn(*const SendCreate) -> SendInstance;
type SendDestroyFn = unsafe extern "C" fn(SendInstance);
type SendVideoFn = unsafe extern "C" fn(SendInstance, *const VideoFrame);

// ── Runtime ──────────────────────────────────────────────────────

/// Resolved entry points of the loaded NDI library.
pub struct Runtime {
    // Keeps the shared object mapped for the lifetime of the symbols.
    _lib: Library,
    initialize: InitializeFn,
    send_create: SendCreateFn,
    send_destroy: SendDestroyFn,
    send_video: SendVideoFn,
}

/// Candidate library names, tried in order.
#[cfg(target_os = "linux")]
const LIB_CANDIDATES: &[&str] = &[
    "libndi.so.6",
    "libndi.so.5",
    "libndi.so",
    "/usr/lib/libndi.so",
    "/usr/local/lib/libndi.so",
    "/usr/lib/x86_64-linux-gnu/libndi.so",
];

#[cfg(target_os = "macos")]
const LIB_CANDIDATES: &[&str] = &[
    "/Library/NDI SDK for macOS/lib/macOS/libndi.dylib",
    "/usr/local/lib/libndi.dylib",
    "/opt/homebrew/lib/libndi.dylib",
    "libndi.dylib",
];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const LIB_CANDIDATES: &[&str] = &["Processing.NDI.Lib.x64.dll"];

impl Runtime {
    fn load() -> Result<Self, String> {
        let mut last_error = String::from("no candidate paths");

        for name in LIB_CANDIDATES {
            let lib = match unsafe { Library::new(name) } {
                Ok(lib) => lib,
                Err(e) => {
                    last_error = format!("{name}: {e}");
                    continue;
                }
            };

            // Resolve all entry points before keeping the library.
            let resolved = unsafe {
                let initialize: Symbol<'_, InitializeFn> = match lib.get(b"NDIlib_initialize\0") {
                    Ok(s) => s,
                    Err(e) => {
                        last_error = format!("{name}: NDIlib_initialize: {e}");
                        continue;
                    }
                };
                let send_create: Symbol<'_, SendCreateFn> = match lib.get(b"NDIlib_send_create\0")
                {
                    Ok(s) => s,
                    Err(e) => {
                        last_error = format!("{name}: NDIlib_send_create: {e}");
                        continue;
                    }
                };
                let send_destroy: Symbol<'_, SendDestroyFn> =
                    match lib.get(b"NDIlib_send_destroy\0") {
                        Ok(s) => s,
                        Err(e) => {
                            last_error = format!("{name}: NDIlib_send_destroy: {e}");
                            continue;
                        }
                    };
                let send_video: Symbol<'_, SendVideoFn> =
                    match lib.get(b"NDIlib_send_send_video_v2\0") {
                        Ok(s) => s,
                        Err(e) => {
                            last_error = format!("{name}: NDIlib_send_send_video_v2: {e}");
                            continue;
                        }
                    };
                (*initialize, *send_create, *send_destroy, *send_video)
            };

            return Ok(Self {
                _lib: lib,
                initialize: resolved.0,
                send_create: resolved.1,
                send_destroy: resolved.2,
                send_video: resolved.3,
            });
        }

        Err(format!("NDI library not found: {last_error}"))
    }

    /// Create a sender handle; null means the library refused.
    pub fn send_create(&self, settings: &SendCreate) -> SendInstance {
        unsafe { (self.send_create)(settings) }
    }

    /// Destroy a sender handle obtained from [`Self::send_create`].
    ///
    /// The caller must not use `sender` afterwards.
    pub fn send_destroy(&self, sender: SendInstance) {
        unsafe { (self.send_destroy)(sender) }
    }

    /// Submit one video frame. Synchronous from the caller's view; the
    /// library does not signal completion.
    ///
    /// `frame.p_data` must stay valid for the duration of the call.
    pub fn send_video(&self, sender: SendInstance, frame: &VideoFrame) {
        unsafe { (self.send_video)(sender, frame) }
    }
}

static RUNTIME: OnceCell<Result<Runtime, String>> = OnceCell::new();

/// Process-wide NDI runtime, loaded and initialized on first use.
///
/// The first caller pays for the dlopen and `NDIlib_initialize`; every
/// later caller gets the cached result. A load or initialize failure is
/// cached too — the process never retries.
pub fn runtime() -> Result<&'static Runtime, TapError> {
    RUNTIME
        .get_or_init(|| {
            let rt = Runtime::load()?;
            if !unsafe { (rt.initialize)() } {
                return Err("NDIlib_initialize returned false".to_string());
            }
            Ok(rt)
        })
        .as_ref()
        .map_err(|e| TapError::RuntimeUnavailable(e.clone()))
}

// ── Tests ────────────────────────────────────────────────────────
