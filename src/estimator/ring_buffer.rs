//! fixed capacity circular buffer holding the most recent samples

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct RingBuffer {
    data: Vec<f32>,
    /// next position that gets written
    cursor: usize,
    /// total number of samples pushed since creation or last `clear()`
    seen: u64,
}

impl RingBuffer {
    /// panics on `capacity == 0`, only used with constant capacities
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer needs a capacity of at least 1");
        Self {
            data: vec![0.0; capacity],
            cursor: 0,
            seen: 0,
        }
    }

    /// allocates a zeroed buffer, failure to allocate is reported instead of aborting
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidWindowSize(capacity));
        }
        let mut data: Vec<f32> = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|source| Error::Allocation { size: capacity, source })?;
        data.resize(capacity, 0.0);

        Ok(Self {
            data,
            cursor: 0,
            seen: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// number of valid samples, never more than `capacity()`
    pub fn len(&self) -> usize {
        self.seen.min(self.data.len() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.seen == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    pub fn samples_seen(&self) -> u64 {
        self.seen
    }

    /// overwrites the oldest sample
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.data[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == self.data.len() {
            self.cursor = 0;
        }
        self.seen += 1;
    }

    /// valid samples in the order they were pushed, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &f32> + '_ {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer.iter())
    }

    /// valid samples as two contiguous slices, oldest first
    ///
    /// before the buffer is filled for the first time, only the pushed part is returned
    pub fn as_slices(&self) -> (&[f32], &[f32]) {
        if self.is_full() {
            let (newer, older) = self.data.split_at(self.cursor);
            (older, newer)
        } else {
            (&self.data[..self.cursor], &[])
        }
    }

    /// forgets all samples, capacity stays the same
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
        self.cursor = 0;
        self.seen = 0;
    }
}
