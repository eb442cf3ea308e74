/// Flat `f32` buffer of `count` rows, each `stride` elements wide.
///
/// Rows are windows into the single backing allocation, so writes through
/// [`row_mut`](Self::row_mut) land directly in the bytes later uploaded with
/// [`as_bytes`](Self::as_bytes). Two distinct rows never overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageBuffer {
    data: Vec<f32>,
    stride: usize,
    count: usize,
}

impl StorageBuffer {
    /// Allocates a zeroed buffer of `stride * count` elements.
    pub fn new(stride: usize, count: usize) -> Self {
        Self {
            data: vec![0.0; stride * count],
            stride,
            count,
        }
    }

    /// Elements per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of rows.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Size of one element in bytes.
    #[inline]
    pub const fn bytes_per_element(&self) -> usize {
        std::mem::size_of::<f32>()
    }

    /// Size of the whole backing allocation in bytes.
    #[inline]
    pub fn byte_length(&self) -> usize {
        self.data.len() * self.bytes_per_element()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Raw bytes for `Queue::write_buffer`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Returns row `index`: `stride` elements starting at `index * stride`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Mutable access to row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn row_mut(&mut self, index: usize) -> &mut [f32] {
        let start = index * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Iterates every row mutably, in index order.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        // chunks_exact_mut rejects a zero chunk size.
        self.data.chunks_exact_mut(self.stride.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_stride_and_count() {
        let buf = StorageBuffer::new(16, 3);
        assert_eq!(buf.as_slice().len(), 48);
        assert_eq!(buf.bytes_per_element(), 4);
        assert_eq!(buf.byte_length(), 192);
        assert_eq!(buf.as_bytes().len(), 192);
    }

    #[test]
    fn row_write_leaves_neighbours_untouched() {
        let mut buf = StorageBuffer::new(16, 3);
        buf.row_mut(1)[0] = 1.0;

        assert_eq!(buf.row(0)[0], 0.0);
        assert_eq!(buf.row(1)[0], 1.0);
        assert_eq!(buf.row(2)[0], 0.0);
    }

    #[test]
    fn row_write_is_visible_in_backing_store() {
        let mut buf = StorageBuffer::new(4, 5);
        buf.row_mut(3).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(&buf.as_slice()[12..16], &[1.0, 2.0, 3.0, 4.0]);

        let bytes = &buf.as_bytes()[12 * 4..13 * 4];
        assert_eq!(bytes, &1.0f32.to_ne_bytes());
    }

    #[test]
    fn rows_are_disjoint() {
        let buf = StorageBuffer::new(8, 4);
        for i in 0..4 {
            for j in 0..4 {
                if i == j {
                    continue;
                }
                let a = buf.row(i).as_ptr_range();
                let b = buf.row(j).as_ptr_range();
                assert!(a.end <= b.start || b.end <= a.start, "rows {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn rows_mut_visits_every_row_in_order() {
        let mut buf = StorageBuffer::new(2, 3);
        for (i, row) in buf.rows_mut().enumerate() {
            row[0] = i as f32;
        }
        assert_eq!(buf.as_slice(), &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    #[should_panic]
    fn row_past_the_end_panics() {
        let buf = StorageBuffer::new(4, 2);
        let _ = buf.row(2);
    }
}
