use crate::error::{Result, ViewerError};
use crate::zarr::metadata::{ArrayMetadata, Order};
/// Per-dimension selector: a single index collapses the dimension, `All` keeps it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexSpec {
    Index(usize),
    All,
}
/// Resolved selection: half-open `[start, start + len)` per dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlicePlan {
    starts: Vec<usize>,
    lens: Vec<usize>,
    kept: Vec<bool>,
    chunks: Vec<usize>,
    order: Order,
}
impl SlicePlan {
    pub fn new(meta: &ArrayMetadata, spec: &[IndexSpec]) -> Result<Self> {
        if spec.len() != meta.ndim() {
            return Err(ViewerError::InvalidInput(format!(
                "index spec has {} entries for a {}-dimensional array",
                spec.len(),
                meta.ndim()
            )));
        }
        let mut starts = Vec::with_capacity(spec.len());
        let mut lens = Vec::with_capacity(spec.len());
        let mut kept = Vec::with_capacity(spec.len());
        for (&dim_len, selector) in meta.shape.iter().zip(spec) {
            match *selector {
                IndexSpec::Index(index) if index >= dim_len => {
                    return Err(ViewerError::IndexOutOfRange {
                        index,
                        len: dim_len,
                    })
                }
                IndexSpec::Index(index) => {
                    starts.push(index);
                    lens.push(1);
                    kept.push(false);
                }
                IndexSpec::All => {
                    starts.push(0);
                    lens.push(dim_len);
                    kept.push(true);
                }
            }
        }
        Ok(Self {
            starts,
            lens,
            kept,
            chunks: meta.chunks.clone(),
            order: meta.order,
        })
    }
    /// Shape of the result once collapsed dimensions are dropped.
    pub fn output_shape(&self) -> Vec<usize> {
        self.lens
            .iter()
            .zip(&self.kept)
            .filter(|(_, keep)| **keep)
            .map(|(&len, _)| len)
            .collect()
    }
    pub fn output_len(&self) -> usize {
        self.lens.iter().product()
    }
    /// Grid coordinates of every chunk that intersects the selection.
    pub fn chunk_coords(&self) -> Vec<Vec<usize>> {
        let ranges: Vec<(usize, usize)> = self
            .starts
            .iter()
            .zip(&self.lens)
            .zip(&self.chunks)
            .map(|((&start, &len), &chunk)| {
                if len == 0 {
                    (0, 0)
                } else {
                    (start / chunk, (start + len - 1) / chunk + 1)
                }
            })
            .collect();
        let mut coords = Vec::new();
        for_each_index(&ranges, |index| coords.push(index.to_vec()));
        coords
    }
    /// Copy the selected part of one decoded chunk into `out` (C order over the selection).
    pub fn scatter_chunk(&self, coords: &[usize], chunk: &[f64], out: &mut [f64]) {
        let ndim = self.chunks.len();
        let chunk_strides = strides(&self.chunks, self.order);
        let out_strides = strides(&self.lens, Order::C);
        let ranges: Vec<(usize, usize)> = (0..ndim)
            .map(|d| {
                let origin = coords[d] * self.chunks[d];
                let lo = self.starts[d].max(origin);
                let hi = (self.starts[d] + self.lens[d]).min(origin + self.chunks[d]);
                (lo, hi.max(lo))
            })
            .collect();
        for_each_index(&ranges, |global| {
            let mut src = 0;
            let mut dst = 0;
            for d in 0..ndim {
                src += (global[d] - coords[d] * self.chunks[d]) * chunk_strides[d];
                dst += (global[d] - self.starts[d]) * out_strides[d];
            }
            out[dst] = chunk[src];
        });
    }
}
fn strides(dims: &[usize], order: Order) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    match order {
        Order::C => {
            for d in (0..dims.len().saturating_sub(1)).rev() {
                strides[d] = strides[d + 1] * dims[d + 1];
            }
        }
        Order::F => {
            for d in 1..dims.len() {
                strides[d] = strides[d - 1] * dims[d - 1];
            }
        }
    }
    strides
}
/// Visit every multi-index in the half-open box `ranges`, last dimension fastest.
fn for_each_index(ranges: &[(usize, usize)], mut visit: impl FnMut(&[usize])) {
    if ranges.iter().any(|&(lo, hi)| lo >= hi) {
        return;
    }
    let mut index: Vec<usize> = ranges.iter().map(|&(lo, _)| lo).collect();
    'outer: loop {
        visit(&index);
        for d in (0..ranges.len()).rev() {
            index[d] += 1;
            if index[d] < ranges[d].1 {
                continue 'outer;
            }
            index[d] = ranges[d].0;
        }
        break;
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::zarr::metadata::{DataType, Order};
    fn meta(shape: &[usize], chunks: &[usize], order: Order) -> ArrayMetadata {
        ArrayMetadata {
            shape: shape.to_vec(),
            chunks: chunks.to_vec(),
            dtype: DataType::parse("<f8").unwrap(),
            compressor: None,
            fill_value: 0.0,
            order,
            dimension_separator: '.',
        }
    }
    #[test]
    fn only_intersecting_chunks_are_planned() {
        let m = meta(&[10, 6, 4], &[3, 6, 2], Order::C);
        let plan = SlicePlan::new(&m, &[IndexSpec::Index(7), IndexSpec::All, IndexSpec::All]).unwrap();
        assert_eq!(plan.output_shape(), vec![6, 4]);
        assert_eq!(plan.chunk_coords(), vec![vec![2, 0, 0], vec![2, 0, 1]]);
    }
    #[test]
    fn rejects_bad_specs() {
        let m = meta(&[4, 2], &[2, 2], Order::C);
        let err = SlicePlan::new(&m, &[IndexSpec::Index(4), IndexSpec::All]).unwrap_err();
        assert!(matches!(err, ViewerError::IndexOutOfRange { index: 4, len: 4 }));
        assert!(SlicePlan::new(&m, &[IndexSpec::All]).is_err());
    }
    #[test]
    fn scatters_edge_chunk_in_fortran_order() {
        // 3x3 array in 2x2 chunks; the bottom-right chunk only holds element (2, 2).
        let m = meta(&[3, 3], &[2, 2], Order::F);
        let plan = SlicePlan::new(&m, &[IndexSpec::All, IndexSpec::All]).unwrap();
        let mut out = vec![0.0; plan.output_len()];
        // F order chunk layout: (0,0), (1,0), (0,1), (1,1).
        plan.scatter_chunk(&[1, 1], &[9.0, -1.0, -1.0, -1.0], &mut out);
        plan.scatter_chunk(&[0, 1], &[2.0, 5.0, -1.0, -1.0], &mut out);
        assert_eq!(out, vec![0.0, 0.0, 2.0, 0.0, 0.0, 5.0, 0.0, 0.0, 9.0]);
    }
    #[test]
    fn visits_boxes_in_c_order() {
        let mut seen = Vec::new();
        for_each_index(&[(0, 2), (1, 3)], |i| seen.push(i.to_vec()));
        assert_eq!(seen, vec![vec![0, 1], vec![0, 2], vec![1, 1], vec![1, 2]]);
        let mut count = 0;
        for_each_index(&[], |_| count += 1);
        assert_eq!(count, 1);
    }
}
