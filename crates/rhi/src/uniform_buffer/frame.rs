use crate::memory::MemoryGateway;
use crate::DeviceError;

/// One payload sized allocation backing a single swapchain image.
#[derive(Debug)]
pub struct UboFrame<A> {
    allocation: A,
    size: u64,
}

impl<A> UboFrame<A> {
    pub fn allocation(&self) -> &A {
        &self.allocation
    }

    pub(crate) fn allocation_mut(&mut self) -> &mut A {
        &mut self.allocation
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Frames indexed by swapchain image, `frames[i]` backs image `i`.
#[derive(Debug)]
pub struct UboFrameSet<A> {
    frames: Vec<UboFrame<A>>,
}

impl<A> Default for UboFrameSet<A> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<A> UboFrameSet<A> {
    /// Allocates `count` frames. Frames allocated before a failure are freed again.
    pub fn allocate<G>(
        gateway: &G,
        label: &str,
        count: usize,
        size: u64,
    ) -> Result<Self, DeviceError>
    where
        G: MemoryGateway<Allocation = A>,
    {
        profiling::scope!("UboFrameSet::allocate");

        let mut set = Self {
            frames: Vec::with_capacity(count),
        };
        for index in 0..count {
            match gateway.allocate(&format!("{label} #{index}"), size) {
                Ok(allocation) => set.frames.push(UboFrame { allocation, size }),
                Err(e) => {
                    if let Err(free_error) = set.release(gateway) {
                        log::error!("failed to release partial frame set: {free_error}");
                    }
                    return Err(e);
                }
            }
        }
        log::debug!("{label}: {count} frames of {size} bytes created.");
        Ok(set)
    }

    /// Frees every frame, leaving the set empty. All frames are freed even when
    /// one of them fails; the first error is returned.
    pub fn release<G>(&mut self, gateway: &G) -> Result<(), DeviceError>
    where
        G: MemoryGateway<Allocation = A>,
    {
        let mut result = Ok(());
        for frame in self.frames.drain(..) {
            let freed = gateway.free(frame.allocation);
            if result.is_ok() {
                result = freed;
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UboFrame<A>> {
        self.frames.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut UboFrame<A>> {
        self.frames.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UboFrame<A>> {
        self.frames.iter()
    }

    pub fn as_slice(&self) -> &[UboFrame<A>] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ptr::NonNull;

    use super::*;
    use crate::host::{HostAllocation, HostMemory};
    use crate::MapError;

    /// Fails the allocation with the given index.
    struct FlakyAllocator {
        inner: HostMemory,
        fail_at: usize,
        calls: Cell<usize>,
    }

    unsafe impl MemoryGateway for FlakyAllocator {
        type Allocation = HostAllocation;

        fn allocate(&self, label: &str, size: u64) -> Result<HostAllocation, DeviceError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_at {
                return Err(DeviceError::OutOfMemory);
            }
            self.inner.allocate(label, size)
        }

        fn free(&self, allocation: HostAllocation) -> Result<(), DeviceError> {
            self.inner.free(allocation)
        }

        fn map(&self, allocation: &mut HostAllocation, coherent: bool) -> Result<NonNull<u8>, MapError> {
            self.inner.map(allocation, coherent)
        }

        fn unmap(&self, allocation: &mut HostAllocation) -> Result<(), MapError> {
            self.inner.unmap(allocation)
        }
    }

    #[test]
    fn frames_are_labelled_by_image() {
        let memory = HostMemory::new();
        let mut set = UboFrameSet::allocate(&memory, "Camera", 3, 192).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2).unwrap().allocation().label(), "Camera #2");
        assert!(set.iter().all(|frame| frame.size() == 192));

        set.release(&memory).unwrap();
        assert!(set.is_empty());
        assert_eq!(memory.stats().live_allocations(), 0);
    }

    #[test]
    fn partial_allocation_is_rolled_back() {
        let gateway = FlakyAllocator {
            inner: HostMemory::new(),
            fail_at: 2,
            calls: Cell::new(0),
        };
        let result = UboFrameSet::allocate(&gateway, "Camera", 3, 64);
        assert_eq!(result.unwrap_err(), DeviceError::OutOfMemory);

        let stats = gateway.inner.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.live_allocations(), 0);
    }
}
