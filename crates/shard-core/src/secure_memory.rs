//! Lock decrypted credential payloads in RAM so the OS never swaps them to disk.
//!
//! Uses `mlock`/`munlock` on Unix. Combined with zeroing on drop this keeps
//! decrypted secrets out of the page file for as long as they're held.

use std::ptr;

#[inline]
pub fn lock_region(ptr: *mut u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }
    #[cfg(unix)]
    {
        use std::ffi::c_void;
        unsafe { libc::mlock(ptr as *mut c_void, len) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

#[inline]
pub fn unlock_region(ptr: *mut u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }
    #[cfg(unix)]
    {
        use std::ffi::c_void;
        unsafe { libc::munlock(ptr as *mut c_void, len) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

#[inline]
pub fn zero_region(ptr: *mut u8, len: usize) {
    if len == 0 {
        return;
    }
    unsafe {
        ptr::write_bytes(ptr, 0, len);
    }
}

/// A buffer locked in RAM and zeroed on drop. Credential payloads are wrapped
/// in this the instant they're decrypted and never leave it in plaintext form.
pub struct LockedVec {
    inner: Vec<u8>,
    locked: bool,
}

impl LockedVec {
    pub fn new(mut data: Vec<u8>) -> Self {
        let is_empty = data.is_empty();
        let locked = if is_empty {
            true
        } else {
            lock_region(data.as_mut_ptr(), data.len())
        };
        if !locked && !is_empty {
            tracing::warn!(
                target: "shard_core::secure_memory",
                "mlock failed; decrypted credential payload may be swapped to disk"
            );
        }
        Self {
            inner: data,
            locked: locked || is_empty,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl AsRef<[u8]> for LockedVec {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for LockedVec {
    fn drop(&mut self) {
        if self.inner.is_empty() {
            return;
        }
        let ptr = self.inner.as_mut_ptr();
        let len = self.inner.len();
        zero_region(ptr, len);
        if self.locked {
            unlock_region(ptr, len);
        }
    }
}
