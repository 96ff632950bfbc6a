use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use thiserror::Error;

use bgrafx_image::{Bgra, BgraView, BgraViewMut, BYTES_PER_PIXEL};

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the rows of an image are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, one row per unit of work.
    #[default]
    ParallelRows,

    /// Run every row sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Map the `openMP` style flag to a strategy.
    pub fn from_flag(parallel: bool) -> Self {
        if parallel {
            ExecutionStrategy::ParallelRows
        } else {
            ExecutionStrategy::Serial
        }
    }

    /// The number of workers that may run rows concurrently under this strategy.
    pub fn num_workers(&self) -> usize {
        match self {
            ExecutionStrategy::ParallelRows => rayon::current_num_threads(),
            ExecutionStrategy::Serial => 1,
            ExecutionStrategy::Fixed(n) => (*n).max(1),
        }
    }
}

/// Run `f(worker, y, row)` over every row of `dst`.
///
/// `row` holds the `width * 4` pixel bytes of row `y`; the padding up to the
/// stride is never handed out. `worker` is the index of the executing thread
/// within the pool, always below [`ExecutionStrategy::num_workers`].
pub fn for_each_row<F>(
    dst: &mut BgraViewMut<'_>,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<(), ParallelError>
where
    F: Fn(usize, usize, &mut [u8]) + Send + Sync,
{
    let stride = dst.stride();
    let row_bytes = dst.layout().row_bytes();
    let data = dst.as_bytes_mut();

    let par_rows = |data: &mut [u8]| {
        data.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                let worker = rayon::current_thread_index().unwrap_or(0);
                f(worker, y, &mut row[..row_bytes]);
            });
    };

    match strategy {
        ExecutionStrategy::Serial => {
            data.chunks_mut(stride)
                .enumerate()
                .for_each(|(y, row)| f(0, y, &mut row[..row_bytes]));
        }
        ExecutionStrategy::ParallelRows => par_rows(data),
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| par_rows(data));
        }
    }
    Ok(())
}

/// Apply a function to each pixel of the image, dispatching rows with `strategy`.
///
/// PRECONDITION: `src` and `dst` have the same layout.
pub fn par_iter_pixels(
    src: &BgraView<'_>,
    dst: &mut BgraViewMut<'_>,
    strategy: ExecutionStrategy,
    f: impl Fn(Bgra) -> Bgra + Send + Sync,
) -> Result<(), ParallelError> {
    for_each_row(dst, strategy, |_, y, dst_row| {
        src.row(y)
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(dst_row.chunks_exact_mut(BYTES_PER_PIXEL))
            .for_each(|(src_pixel, dst_pixel)| {
                f(Bgra::from_bytes(src_pixel)).write_to(dst_pixel);
            });
    })
}

/// Mutable state with one slot per worker.
///
/// Slots are created before the rows are dispatched and dropped after they
/// rejoin. A worker only ever locks its own slot, so the locks are uncontended.
pub struct WorkerLocal<T> {
    slots: Vec<Mutex<T>>,
}

impl<T> WorkerLocal<T> {
    /// Allocate `workers` slots, each built by `init`.
    pub fn new(workers: usize, mut init: impl FnMut() -> T) -> Self {
        let slots = (0..workers.max(1)).map(|_| Mutex::new(init())).collect();
        Self { slots }
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false, there is at least one slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run `f` with exclusive access to the slot of `worker`.
    pub fn with<R>(&self, worker: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let slot = &self.slots[worker % self.slots.len()];
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgrafx_image::{BgraImage, CpuAllocator, ImageError, ImageLayout};

    fn ramp(layout: ImageLayout) -> Result<BgraImage, ImageError> {
        let mut image = BgraImage::zeros(layout, &CpuAllocator)?;
        let mut view = image.view_mut();
        for y in 0..layout.height() {
            for x in 0..layout.width() {
                view.set(x, y, Bgra::opaque(x as u8, y as u8, (x * y) as u8));
            }
        }
        Ok(image)
    }

    #[test]
    fn test_for_each_row_serial() -> Result<(), Box<dyn std::error::Error>> {
        let layout = ImageLayout::new([3, 4].into(), 16)?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        for_each_row(&mut dst.view_mut(), ExecutionStrategy::Serial, |worker, y, row| {
            assert_eq!(worker, 0);
            assert_eq!(row.len(), 12);
            row.fill(y as u8);
        })?;
        assert_eq!(dst.pixel(2, 3), Bgra::new(3, 3, 3, 3));
        // padding is never written
        assert_eq!(&dst.as_slice()[12..16], &[0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_par_iter_pixels_strategies() -> Result<(), Box<dyn std::error::Error>> {
        let layout = ImageLayout::new([7, 5].into(), 32)?;
        let src = ramp(layout)?;
        let invert = |px: Bgra| Bgra::new(255 - px.b, 255 - px.g, 255 - px.r, px.a);

        let mut serial = BgraImage::zeros(layout, &CpuAllocator)?;
        par_iter_pixels(
            &src.view(),
            &mut serial.view_mut(),
            ExecutionStrategy::Serial,
            invert,
        )?;

        for strategy in [ExecutionStrategy::ParallelRows, ExecutionStrategy::Fixed(3)] {
            let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
            par_iter_pixels(&src.view(), &mut dst.view_mut(), strategy, invert)?;
            assert_eq!(dst, serial);
        }
        assert_eq!(serial.pixel(1, 2), Bgra::opaque(254, 253, 253));
        Ok(())
    }

    #[test]
    fn test_fixed_worker_index_in_range() -> Result<(), Box<dyn std::error::Error>> {
        let layout = ImageLayout::packed([2, 64].into())?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        let strategy = ExecutionStrategy::Fixed(2);
        let workers = strategy.num_workers();
        for_each_row(&mut dst.view_mut(), strategy, |worker, _, row| {
            assert!(worker < workers);
            row.fill(1);
        })?;
        assert!(dst.as_slice().iter().all(|&b| b == 1));
        Ok(())
    }

    #[test]
    fn test_fixed_zero_threads() -> Result<(), ImageError> {
        let layout = ImageLayout::packed([1, 1].into())?;
        let mut dst = BgraImage::zeros(layout, &CpuAllocator)?;
        let res = for_each_row(&mut dst.view_mut(), ExecutionStrategy::Fixed(0), |_, _, _| {});
        assert_eq!(res, Err(ParallelError::InvalidThreadCount(0)));
        Ok(())
    }

    #[test]
    fn test_worker_local_slots() {
        let local = WorkerLocal::new(0, Vec::<usize>::new);
        assert_eq!(local.len(), 1);

        let local = WorkerLocal::new(3, Vec::<usize>::new);
        local.with(4, |v| v.push(4));
        assert_eq!(local.with(1, |v| v.clone()), vec![4]);
        assert!(local.with(0, |v| v.is_empty()));
    }
}
