use crate::error::ImageError;

/// A trait for allocating the byte storage of owned images.
///
/// Filters receive an allocator for their scratch buffers so that a failed
/// allocation surfaces as [`ImageError::AllocationFailed`] instead of aborting.
pub trait ImageAllocator: Send + Sync {
    /// Allocate a zero-filled buffer of `len` bytes.
    fn allocate(&self, len: usize) -> Result<Vec<u8>, ImageError>;
}

impl<A: ImageAllocator + ?Sized> ImageAllocator for &A {
    fn allocate(&self, len: usize) -> Result<Vec<u8>, ImageError> {
        (**self).allocate(len)
    }
}

/// Allocator backed by the global heap with fallible reservation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuAllocator;

impl ImageAllocator for CpuAllocator {
    fn allocate(&self, len: usize) -> Result<Vec<u8>, ImageError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| ImageError::AllocationFailed(len))?;
        buf.resize(len, 0);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_allocator_zeroed() -> Result<(), ImageError> {
        let buf = CpuAllocator.allocate(16)?;
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn cpu_allocator_overflow() {
        let res = CpuAllocator.allocate(usize::MAX);
        assert_eq!(res, Err(ImageError::AllocationFailed(usize::MAX)));
    }
}
