use std::ptr::NonNull;

use crate::{DeviceError, MapError};

/// Allocates host visible memory and maps it into the host address space.
///
/// # Safety
///
/// When [`MemoryGateway::map`] returns `Ok(ptr)`, `ptr` must be valid for reads and
/// writes of at least the `size` the allocation was created with, and must stay valid
/// and unaliased by the gateway until [`MemoryGateway::unmap`] or
/// [`MemoryGateway::free`] is called for that allocation.
pub unsafe trait MemoryGateway {
    type Allocation;

    fn allocate(&self, label: &str, size: u64) -> Result<Self::Allocation, DeviceError>;

    fn free(&self, allocation: Self::Allocation) -> Result<(), DeviceError>;

    /// With `coherent == false` the gateway makes host writes visible to the device on unmap.
    fn map(&self, allocation: &mut Self::Allocation, coherent: bool)
        -> Result<NonNull<u8>, MapError>;

    fn unmap(&self, allocation: &mut Self::Allocation) -> Result<(), MapError>;
}

/// A mapping of one allocation that lives for a single write.
///
/// Unmapped by [`MappedFrame::unmap`], or on drop when an early return or panic
/// skips the explicit call.
pub struct MappedFrame<'a, G: MemoryGateway> {
    gateway: &'a G,
    allocation: &'a mut G::Allocation,
    ptr: NonNull<u8>,
    len: usize,
    released: bool,
}

impl<'a, G: MemoryGateway> MappedFrame<'a, G> {
    /// `len` must not exceed the size `allocation` was created with.
    pub(crate) fn map(
        gateway: &'a G,
        allocation: &'a mut G::Allocation,
        len: usize,
        coherent: bool,
    ) -> Result<Self, MapError> {
        let ptr = gateway.map(allocation, coherent)?;
        Ok(Self {
            gateway,
            allocation,
            ptr,
            len,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // Safety: the gateway contract keeps `ptr` valid for `len` bytes until unmap,
        // and `&mut self` makes this the only live view.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.as_mut_slice()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn unmap(mut self) -> Result<(), MapError> {
        self.released = true;
        self.gateway.unmap(&mut *self.allocation)
    }
}

impl<'a, G: MemoryGateway> Drop for MappedFrame<'a, G> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.gateway.unmap(&mut *self.allocation) {
            log::error!("failed to unmap uniform buffer frame: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::host::HostMemory;

    #[test]
    fn explicit_unmap_releases_once() {
        let memory = HostMemory::new();
        let mut allocation = memory.allocate("frame", 16).unwrap();

        let mut mapped = MappedFrame::map(&memory, &mut allocation, 16, true).unwrap();
        mapped.write(4, &[1, 2, 3, 4]);
        mapped.unmap().unwrap();

        let stats = memory.stats();
        assert_eq!((stats.maps, stats.unmaps), (1, 1));
        assert_eq!(&allocation.bytes()[4..8], &[1, 2, 3, 4]);
        assert!(!allocation.is_mapped());
    }

    #[test]
    fn panicking_write_still_unmaps() {
        let memory = HostMemory::new();
        let mut allocation = memory.allocate("frame", 16).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut mapped = MappedFrame::map(&memory, &mut allocation, 16, true).unwrap();
            // past the end of the mapping
            mapped.write(12, &[0u8; 8]);
        }));
        assert!(result.is_err());

        let stats = memory.stats();
        assert_eq!((stats.maps, stats.unmaps), (1, 1));
        assert!(!allocation.is_mapped());
    }
}
