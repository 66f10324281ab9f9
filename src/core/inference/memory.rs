//! The CPU memory-allocation descriptor shared by every session of an engine.

use crate::core::errors::{InpaintError, InpaintResult};
use ort::memory::{AllocationDevice, Allocator, AllocatorType, MemoryInfo, MemoryType};
use ort::session::Session;

/// Describes where input tensors are allocated.
///
/// ONNX Runtime memory-info handles cannot be sent between threads, so the descriptor
/// keeps the allocation parameters and materializes a [`MemoryInfo`] each time a session
/// needs an allocator. The engine validates it once against the runtime and every
/// session it builds reads the same value through the shared environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor {
    device: AllocationDevice,
    device_id: i32,
    allocator_type: AllocatorType,
    memory_type: MemoryType,
}

impl Default for MemoryDescriptor {
    fn default() -> Self {
        Self::cpu()
    }
}

impl MemoryDescriptor {
    /// Plain device allocator on the CPU with the default memory type.
    pub fn cpu() -> Self {
        Self {
            device: AllocationDevice::CPU,
            device_id: 0,
            allocator_type: AllocatorType::Device,
            memory_type: MemoryType::Default,
        }
    }

    /// Allocation device name as reported by the runtime.
    pub fn device_name(&self) -> &'static str {
        self.device.as_str()
    }

    /// Allocator kind.
    pub fn allocator_type(&self) -> AllocatorType {
        self.allocator_type
    }

    /// Memory type.
    pub fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    /// Creates the runtime memory info once to make sure the runtime accepts it.
    pub fn validated(self) -> InpaintResult<Self> {
        self.memory_info().map(|_| self).map_err(|e| {
            InpaintError::backend_init_error(
                "onnxruntime",
                format!("failed to create {} memory info", self.device_name()),
                Some(e),
            )
        })
    }

    /// Builds the runtime memory info for this descriptor.
    pub fn memory_info(&self) -> Result<MemoryInfo, ort::Error> {
        MemoryInfo::new(
            self.device,
            self.device_id,
            self.allocator_type,
            self.memory_type,
        )
    }

    /// Creates an allocator bound to `session` for this descriptor.
    pub fn allocator(&self, session: &Session) -> Result<Allocator, ort::Error> {
        Allocator::new(session, self.memory_info()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor_is_cpu_device_allocator() {
        let descriptor = MemoryDescriptor::default();
        assert_eq!(descriptor, MemoryDescriptor::cpu());
        assert_eq!(descriptor.device_name(), "Cpu");
        assert_eq!(descriptor.allocator_type(), AllocatorType::Device);
        assert_eq!(descriptor.memory_type(), MemoryType::Default);
    }

    #[test]
    fn test_validated_descriptor_matches_runtime_memory_info() {
        let descriptor = MemoryDescriptor::cpu().validated().unwrap();
        let info = descriptor.memory_info().unwrap();
        assert_eq!(info.allocation_device(), AllocationDevice::CPU);
        assert_eq!(info.allocator_type(), AllocatorType::Device);
        assert_eq!(info.memory_type(), MemoryType::Default);
        assert!(info.is_cpu_accessible());
    }
}
