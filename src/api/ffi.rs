//! C-compatible API for hosts that drive the engine from native code.
//!
//! Engines are handed out as owned raw pointers: create with
//! `matcat_engine_new`, release with `matcat_engine_free`. Every other call
//! borrows the engine for its duration and returns a [`StatusCode`].

use std::ffi::CStr;
use std::os::raw::c_char;
use std::slice;

use tracing::warn;

use crate::common::config::ConcatCfg;
use crate::common::error::{ConcatError, StatusCode};
use crate::common::log;
use crate::concat::{ConcatEngine, Mode};
use crate::matrix::{ElementType, Matrix, ShapeDescriptor};

/// ABI version to coordinate with host wrappers.
#[no_mangle]
pub extern "C" fn matcat_api_version() -> u32 {
    1
}

/// Create an engine. Returns null when `mode` or `max_size` is invalid.
#[no_mangle]
pub extern "C" fn matcat_engine_new(mode: i64, max_size: u64) -> *mut ConcatEngine {
    let engine = host_size(max_size, "max_size")
        .and_then(|max_size| ConcatEngine::new(Mode::try_from(mode)?, max_size));
    match engine {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(err) => {
            warn!(%err, "engine creation failed");
            std::ptr::null_mut()
        }
    }
}

/// Create an engine from a JSON config such as `{"mode": 2, "max_size": 64}`.
///
/// Installs a log subscriber at the configured `log_level` unless the host
/// already installed one. Returns null on a null pointer or invalid config.
///
/// # Safety
/// `cfg_json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_from_json(cfg_json: *const c_char) -> *mut ConcatEngine {
    if cfg_json.is_null() {
        return std::ptr::null_mut();
    }
    let raw = CStr::from_ptr(cfg_json).to_string_lossy();
    let engine = ConcatCfg::from_json(&raw).and_then(|cfg| {
        log::init(&cfg.log_level);
        ConcatEngine::from_cfg(&cfg)
    });
    match engine {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(err) => {
            warn!(%err, "engine creation from config failed");
            std::ptr::null_mut()
        }
    }
}

/// Release an engine created by `matcat_engine_new`.
///
/// # Safety
/// `engine` must come from `matcat_engine_new` and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_free(engine: *mut ConcatEngine) {
    if engine.is_null() {
        return;
    }
    drop(Box::from_raw(engine));
}

/// # Safety
/// `engine` must be a live pointer from `matcat_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_set_mode(engine: *mut ConcatEngine, mode: i64) -> u32 {
    let Some(engine) = engine.as_mut() else {
        return StatusCode::NullPointer as u32;
    };
    status(engine.set_mode_code(mode))
}

/// # Safety
/// `engine` must be a live pointer from `matcat_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_set_max_size(engine: *mut ConcatEngine, max_size: u64) -> u32 {
    let Some(engine) = engine.as_mut() else {
        return StatusCode::NullPointer as u32;
    };
    status(host_size(max_size, "max_size").and_then(|max_size| engine.set_max_size(max_size)))
}

/// # Safety
/// `engine` must be a live pointer from `matcat_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_reset(engine: *mut ConcatEngine) -> u32 {
    let Some(engine) = engine.as_mut() else {
        return StatusCode::NullPointer as u32;
    };
    engine.reset();
    StatusCode::Ok as u32
}

/// Append one matrix. On success the new overall dims are written to
/// `out_dims[0..2]`.
///
/// `element_type` uses the codes of [`ElementType`]; `data` holds
/// `data_len` native-endian bytes laid out plane-interleaved, row-major.
///
/// # Safety
/// `engine` must be live; `dims` must point to `dim_count` values; `data`
/// to `data_len` readable bytes; `out_dims` to two writable values.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_ingest(
    engine: *mut ConcatEngine,
    plane_count: u32,
    element_type: u32,
    dim_count: u32,
    dims: *const u64,
    data: *const u8,
    data_len: usize,
    out_dims: *mut u64,
) -> u32 {
    let Some(engine) = engine.as_mut() else {
        return StatusCode::NullPointer as u32;
    };
    if dims.is_null() || data.is_null() || out_dims.is_null() {
        return StatusCode::NullPointer as u32;
    }
    if dim_count == 0 || dim_count > 2 {
        return ConcatError::invalid_shape(format!("expected 1 or 2 dims, got {dim_count}")).code() as u32;
    }

    let dims: Result<Vec<usize>, _> = slice::from_raw_parts(dims, dim_count as usize)
        .iter()
        .map(|&d| host_size(d, "dim"))
        .collect();
    let bytes = slice::from_raw_parts(data, data_len);

    // capacity and plane checks run before the bytes are decoded
    let emission = dims
        .and_then(|dims| {
            let ty = ElementType::from_code(element_type)?;
            ShapeDescriptor::new(plane_count as usize, ty, dims)
        })
        .and_then(|shape| engine.admit(&shape).map(|_| shape))
        .and_then(|shape| Matrix::from_bytes(shape, bytes))
        .and_then(|matrix| engine.ingest(&matrix));

    match emission {
        Ok(emission) => {
            let out = slice::from_raw_parts_mut(out_dims, 2);
            out[0] = emission.dims[0] as u64;
            out[1] = emission.dims[1] as u64;
            StatusCode::Ok as u32
        }
        Err(err) => err.code() as u32,
    }
}

/// Borrow the accumulation buffer's bytes. Null while the engine is empty.
///
/// The pointer stays valid until the next mutating call on `engine`.
///
/// # Safety
/// `engine` must be live; `out_len` must be writable or null.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_output(
    engine: *const ConcatEngine,
    out_len: *mut usize,
) -> *const u8 {
    let Some(engine) = engine.as_ref() else {
        return std::ptr::null();
    };
    let bytes = engine.output().map(|m| m.as_bytes()).unwrap_or(&[]);
    if let Some(len) = out_len.as_mut() {
        *len = bytes.len();
    }
    if bytes.is_empty() {
        std::ptr::null()
    } else {
        bytes.as_ptr()
    }
}

/// Copy the NUL-terminated buffer name into `buf` (capacity `cap`).
///
/// # Safety
/// `engine` must be live; `buf` must have `cap` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn matcat_engine_handle(
    engine: *const ConcatEngine,
    buf: *mut c_char,
    cap: usize,
) -> u32 {
    let Some(engine) = engine.as_ref() else {
        return StatusCode::NullPointer as u32;
    };
    if buf.is_null() {
        return StatusCode::NullPointer as u32;
    }
    let Some(handle) = engine.handle() else {
        return StatusCode::InvalidInput as u32;
    };
    let name = handle.name();
    if name.len() + 1 > cap {
        return StatusCode::InvalidInput as u32;
    }
    let out = slice::from_raw_parts_mut(buf as *mut u8, cap);
    out[..name.len()].copy_from_slice(name.as_bytes());
    out[name.len()] = 0;
    StatusCode::Ok as u32
}

/// Host sizes arrive as `u64`; refuse what does not fit this target's `usize`.
fn host_size(value: u64, what: &str) -> Result<usize, ConcatError> {
    usize::try_from(value)
        .map_err(|_| ConcatError::invalid_shape(format!("{what} {value} exceeds the address space")))
}

fn status(result: Result<(), ConcatError>) -> u32 {
    match result {
        Ok(()) => StatusCode::Ok as u32,
        Err(err) => err.code() as u32,
    }
}
