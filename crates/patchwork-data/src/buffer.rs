// PatchBuffer — rotating pool of whole samples served as random crops
//
// Loading a full volume is expensive, cropping one is cheap. The buffer
// keeps `capacity` samples resident and answers every request with a random
// crop of a randomly chosen resident. Every `rotation_frequency` requests the
// oldest resident is evicted and the next index from the traversal order is
// admitted in its place.
//
// Residents live in a ring: `head` is the slot of the oldest sample, and
// logical position `i` (0 = oldest) is slot `(head + i) % capacity`. A
// rotation overwrites slot `head` and advances it by one.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use patchwork_core::NdArray;

use crate::dataset::{Dataset, Sample};
use crate::error::{BufferError, Result};
use crate::traversal::{Traversal, TraversalOrder};

/// Configuration for a [`PatchBuffer`].
#[derive(Debug, Clone)]
pub struct PatchBufferConfig {
    /// Patch extent for each spatial dimension. The leading dimension of the
    /// first array is not listed here and is always taken whole.
    pub patch_size: Vec<usize>,
    /// Number of resident samples (clamped to the dataset length).
    pub buffer_size: usize,
    /// Rotate after every `rotation_frequency` requests; `<= 0` never rotates.
    pub rotation_frequency: i64,
    /// Nominal number of patches, reported as the buffer's length.
    pub npatches: usize,
    /// Admit samples in shuffled order (true) or in index order (false).
    pub shuffle: bool,
    /// Dimension removed from every output array; it must have extent 1.
    pub squeeze_dim: Option<usize>,
    /// Optional random seed for reproducible sampling.
    pub seed: Option<u64>,
    /// Number of parallel workers for the initial fill (0 = sequential).
    pub num_workers: usize,
    /// Log buffer rotations at info level instead of debug.
    pub verbose: bool,
}

impl Default for PatchBufferConfig {
    fn default() -> Self {
        Self {
            patch_size: vec![32, 64, 64],
            buffer_size: 1,
            rotation_frequency: -1,
            npatches: 100_000,
            shuffle: true,
            squeeze_dim: None,
            seed: None,
            num_workers: 0,
            verbose: false,
        }
    }
}

impl PatchBufferConfig {
    pub fn patch_size(mut self, p: impl Into<Vec<usize>>) -> Self {
        self.patch_size = p.into();
        self
    }

    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    pub fn rotation_frequency(mut self, f: i64) -> Self {
        self.rotation_frequency = f;
        self
    }

    pub fn npatches(mut self, n: usize) -> Self {
        self.npatches = n;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn squeeze_dim(mut self, d: usize) -> Self {
        self.squeeze_dim = Some(d);
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    /// Rotation period, or `None` when rotation is disabled.
    pub fn rotation_period(&self) -> Option<u64> {
        u64::try_from(self.rotation_frequency)
            .ok()
            .filter(|&f| f > 0)
    }
}

/// A random crop of one resident sample.
#[derive(Debug, Clone)]
pub struct Patch {
    arrays: Vec<NdArray>,
    origin: Vec<usize>,
    source_index: usize,
}

impl Patch {
    /// Cropped arrays, in the same order as the sample's arrays.
    ///
    /// Only the trailing spatial dimensions are cropped; every array keeps
    /// all of its leading dimensions, however many it has.
    pub fn arrays(&self) -> &[NdArray] {
        &self.arrays
    }

    pub fn into_arrays(self) -> Vec<NdArray> {
        self.arrays
    }

    /// Start offset of the crop along each spatial dimension. The same
    /// offsets were applied to every array of the sample.
    pub fn origin(&self) -> &[usize] {
        &self.origin
    }

    /// Dataset index of the sample the patch was cut from.
    pub fn source_index(&self) -> usize {
        self.source_index
    }
}

#[derive(Debug, Clone)]
struct Resident {
    index: usize,
    sample: Sample,
}

/// Fixed-capacity pool of dataset samples that serves random patches.
///
/// Single consumer: every request takes `&mut self`.
pub struct PatchBuffer<'a, D: Dataset + ?Sized, R: Rng = StdRng> {
    dataset: &'a D,
    config: PatchBufferConfig,
    patch_shape: Vec<usize>,
    slots: Vec<Resident>,
    head: usize,
    traversal: Traversal,
    history: Vec<usize>,
    requests: u64,
    rng: R,
}

impl<'a, D: Dataset + ?Sized> PatchBuffer<'a, D, StdRng> {
    /// Fill a buffer from `dataset`, seeding from `config.seed` or entropy.
    pub fn new(dataset: &'a D, config: PatchBufferConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(dataset, config, rng)
    }
}

impl<'a, D: Dataset + ?Sized, R: Rng> PatchBuffer<'a, D, R> {
    /// Fill a buffer from `dataset`, drawing all randomness from `rng`.
    pub fn with_rng(dataset: &'a D, config: PatchBufferConfig, mut rng: R) -> Result<Self> {
        if dataset.is_empty() {
            return Err(BufferError::EmptyDataset);
        }
        if config.buffer_size == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let capacity = config.buffer_size.min(dataset.len());
        let order = TraversalOrder::from_shuffle(config.shuffle);
        let mut traversal = Traversal::new(order, dataset.len(), &mut rng);

        let indices: Vec<usize> = (0..capacity)
            .filter_map(|_| traversal.advance(&mut rng))
            .collect();
        for &index in &indices {
            debug!("buffering sample {} from '{}'", index, dataset.name());
        }

        let samples: Vec<Sample> = if config.num_workers > 0 && indices.len() > 1 {
            indices.par_iter().map(|&i| dataset.get(i)).collect()
        } else {
            indices.iter().map(|&i| dataset.get(i)).collect()
        };

        let spatial_rank = config.patch_size.len();
        let mut lead = 0;
        for (&index, sample) in indices.iter().zip(&samples) {
            lead = validate_sample(index, sample, spatial_rank)?;
        }
        let mut patch_shape = Vec::with_capacity(spatial_rank + 1);
        patch_shape.push(lead);
        patch_shape.extend_from_slice(&config.patch_size);

        info!(
            "patch buffer filled: {} of {} samples resident, {:?} order, patch shape {:?}",
            capacity,
            dataset.len(),
            order,
            patch_shape
        );

        let slots = indices
            .iter()
            .zip(samples)
            .map(|(&index, sample)| Resident { index, sample })
            .collect();

        Ok(Self {
            dataset,
            config,
            patch_shape,
            slots,
            head: 0,
            traversal,
            history: indices,
            requests: 0,
            rng,
        })
    }

    /// Nominal number of patches; independent of what is resident.
    pub fn len(&self) -> usize {
        self.config.npatches
    }

    pub fn is_empty(&self) -> bool {
        self.config.npatches == 0
    }

    /// Number of resident samples. Fixed for the buffer's lifetime.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &PatchBufferConfig {
        &self.config
    }

    pub fn dataset(&self) -> &'a D {
        self.dataset
    }

    /// Full patch shape of the first array: leading extent, then `patch_size`.
    pub fn patch_shape(&self) -> &[usize] {
        &self.patch_shape
    }

    /// Every dataset index ever admitted, initial fill included, oldest first.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Dataset indices currently resident, oldest first.
    pub fn resident_indices(&self) -> Vec<usize> {
        let cap = self.slots.len();
        (0..cap)
            .map(|i| self.slots[(self.head + i) % cap].index)
            .collect()
    }

    /// Number of requests served so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Serve one patch. `index` does not influence which patch is returned.
    ///
    /// Counts the request, rotates the buffer when the count reaches a
    /// multiple of the rotation period, then crops a random resident.
    pub fn get(&mut self, _index: usize) -> Result<Patch> {
        self.requests += 1;
        if let Some(period) = self.config.rotation_period() {
            if self.requests % period == 0 {
                self.rotate()?;
            }
        }
        self.random_patch()
    }

    /// Lazy sequence of `len()` patches. Calling `iter` again starts a new
    /// sequence; buffer state carries over.
    pub fn iter(&mut self) -> PatchIter<'_, 'a, D, R> {
        PatchIter {
            buffer: self,
            served: 0,
        }
    }

    /// Evict the oldest resident and admit the next index of the traversal.
    ///
    /// The new sample is fetched and validated before anything is mutated,
    /// so a failed admission leaves the buffer as it was.
    pub fn rotate(&mut self) -> Result<()> {
        let index = match self.traversal.peek(&mut self.rng) {
            Some(index) => index,
            None => return Err(BufferError::EmptyDataset),
        };
        self.log_rotation(format_args!("Inserting new item into buffer"));

        let sample = self.dataset.get(index);
        validate_sample(index, &sample, self.config.patch_size.len())?;

        self.traversal.commit(index);
        let cap = self.slots.len();
        self.slots[self.head] = Resident { index, sample };
        self.head = (self.head + 1) % cap;
        self.history.push(index);

        self.log_rotation(format_args!("Added item {}", index));
        Ok(())
    }

    fn log_rotation(&self, msg: std::fmt::Arguments<'_>) {
        if self.config.verbose {
            info!("{}", msg);
        } else {
            debug!("{}", msg);
        }
    }

    /// Crop a random window out of a uniformly chosen resident.
    ///
    /// Along each spatial dimension with extent `d` and patch extent `p` the
    /// start is uniform in `[0, d - p]`, or 0 when `p >= d`; in the latter
    /// case the crop is clipped to `d`. The same window is applied to the
    /// trailing dimensions of every array in the sample.
    pub fn random_patch(&mut self) -> Result<Patch> {
        let cap = self.slots.len();
        let pos = self.rng.gen_range(0..cap);
        let resident = &self.slots[(self.head + pos) % cap];

        let spatial_rank = self.config.patch_size.len();
        let spatial = resident
            .sample
            .spatial_dims(spatial_rank)
            .ok_or(BufferError::EmptySample {
                index: resident.index,
            })?;

        let mut origin = Vec::with_capacity(spatial_rank);
        let mut window = Vec::with_capacity(spatial_rank);
        for (&d, &p) in spatial.iter().zip(&self.config.patch_size) {
            let start = if d >= p {
                self.rng.gen_range(0..=d - p)
            } else {
                0
            };
            origin.push(start);
            window.push(start..start + p);
        }

        let squeeze_dim = self.config.squeeze_dim;
        let arrays = resident
            .sample
            .arrays()
            .iter()
            .map(|a| {
                let cropped = a.crop(&window)?;
                match squeeze_dim {
                    Some(dim) => cropped.squeeze(dim),
                    None => Ok(cropped),
                }
            })
            .collect::<patchwork_core::Result<Vec<_>>>()?;

        Ok(Patch {
            arrays,
            origin,
            source_index: resident.index,
        })
    }
}

/// Check a sample against the patch dimensionality and return the extent of
/// its first array's leading dimension.
fn validate_sample(index: usize, sample: &Sample, spatial_rank: usize) -> Result<usize> {
    let first = sample.first().ok_or(BufferError::EmptySample { index })?;
    if first.rank() != spatial_rank + 1 {
        return Err(BufferError::PatchRank {
            index,
            patch_dims: spatial_rank,
            sample_rank: first.rank(),
        });
    }
    let expected = &first.dims()[1..];
    for (array, a) in sample.arrays().iter().enumerate().skip(1) {
        let dims = a.dims();
        let matches = dims.len() >= spatial_rank && &dims[dims.len() - spatial_rank..] == expected;
        if !matches {
            return Err(BufferError::SpatialMismatch {
                index,
                array,
                expected: expected.to_vec(),
                got: dims.to_vec(),
            });
        }
    }
    Ok(first.dims()[0])
}

/// Iterator returned by [`PatchBuffer::iter`].
pub struct PatchIter<'b, 'a, D: Dataset + ?Sized, R: Rng> {
    buffer: &'b mut PatchBuffer<'a, D, R>,
    served: usize,
}

impl<'b, 'a, D: Dataset + ?Sized, R: Rng> Iterator for PatchIter<'b, 'a, D, R> {
    type Item = Result<Patch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.served >= self.buffer.len() {
            return None;
        }
        let index = self.served;
        self.served += 1;
        Some(self.buffer.get(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.buffer.len().saturating_sub(self.served);
        (left, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::VecDataset;

    fn volumes(n: usize, dims: &[usize]) -> VecDataset {
        let samples = (0..n)
            .map(|_| Sample::pair(NdArray::arange(dims), NdArray::arange(dims)))
            .collect();
        VecDataset::new(samples, "volumes")
    }

    #[test]
    fn default_config() {
        let c = PatchBufferConfig::default();
        assert_eq!(c.patch_size, vec![32, 64, 64]);
        assert_eq!(c.buffer_size, 1);
        assert_eq!(c.npatches, 100_000);
        assert!(c.shuffle);
        assert_eq!(c.rotation_period(), None);
    }

    #[test]
    fn rotation_period_ignores_non_positive() {
        let c = PatchBufferConfig::default();
        assert_eq!(c.clone().rotation_frequency(0).rotation_period(), None);
        assert_eq!(c.clone().rotation_frequency(-5).rotation_period(), None);
        assert_eq!(c.rotation_frequency(4).rotation_period(), Some(4));
    }

    #[test]
    fn ring_order_after_rotations() {
        let ds = volumes(5, &[1, 4, 4]);
        let config = PatchBufferConfig::default()
            .patch_size(vec![2, 2])
            .buffer_size(3)
            .shuffle(false)
            .seed(3);
        let mut buf = PatchBuffer::new(&ds, config).unwrap();
        assert_eq!(buf.resident_indices(), vec![0, 1, 2]);
        buf.rotate().unwrap();
        assert_eq!(buf.resident_indices(), vec![1, 2, 3]);
        buf.rotate().unwrap();
        buf.rotate().unwrap();
        assert_eq!(buf.resident_indices(), vec![3, 4, 0]);
        assert_eq!(buf.history(), &[0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn validate_rejects_short_secondary_array() {
        let s = Sample::pair(NdArray::zeros((1, 4, 4)), NdArray::zeros(4usize));
        assert!(matches!(
            validate_sample(0, &s, 2),
            Err(BufferError::SpatialMismatch { array: 1, .. })
        ));
    }

    #[test]
    fn validate_accepts_extra_leading_dims() {
        let s = Sample::pair(NdArray::zeros((1, 4, 4)), NdArray::zeros((2, 3, 4, 4)));
        assert_eq!(validate_sample(0, &s, 2).unwrap(), 1);
    }
}
