use std::ffi::CStr;

use ash::extensions::ext;
use ash::vk;

use crate::DeviceError;

pub struct Device {
    /// Loads device local functions.
    raw: ash::Device,
    debug_utils: Option<ext::DebugUtils>,
}

impl Device {
    pub fn raw(&self) -> &ash::Device {
        &self.raw
    }

    /// `debug_utils` has to be loaded from the instance `raw` was created from.
    pub fn new(raw: ash::Device, debug_utils: Option<ext::DebugUtils>) -> Self {
        Self { raw, debug_utils }
    }

    pub fn create_buffer(
        &self,
        create_info: &vk::BufferCreateInfo,
    ) -> Result<vk::Buffer, DeviceError> {
        Ok(unsafe { self.raw.create_buffer(create_info, None)? })
    }

    pub fn destroy_buffer(&self, buffer: vk::Buffer) {
        unsafe {
            self.raw.destroy_buffer(buffer, None);
        }
    }

    pub fn get_buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        unsafe { self.raw.get_buffer_memory_requirements(buffer) }
    }

    pub unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        device_memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> Result<(), DeviceError> {
        unsafe { self.raw.bind_buffer_memory(buffer, device_memory, offset)? };
        Ok(())
    }

    pub unsafe fn flush_mapped_memory_ranges(
        &self,
        ranges: &[vk::MappedMemoryRange],
    ) -> Result<(), DeviceError> {
        unsafe { self.raw.flush_mapped_memory_ranges(ranges)? };
        Ok(())
    }

    pub unsafe fn set_object_name(
        &self,
        object_type: vk::ObjectType,
        object: impl vk::Handle,
        name: &str,
    ) {
        let debug_utils = match &self.debug_utils {
            Some(utils) => utils,
            None => return,
        };

        // Append a null terminator to the string
        let name_bytes: Vec<u8> = name.bytes().chain(std::iter::once(0)).collect();
        let name = match CStr::from_bytes_with_nul(&name_bytes) {
            Ok(name) => name,
            Err(_) => {
                log::warn!("object name {name:?} contains a nul byte, skipped");
                return;
            }
        };
        let _result = debug_utils.set_debug_utils_object_name(
            self.raw.handle(),
            &vk::DebugUtilsObjectNameInfoEXT::builder()
                .object_type(object_type)
                .object_handle(object.as_raw())
                .object_name(name),
        );
    }
}
