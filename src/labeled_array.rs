//! The generic labeled-array collaborator: an N-dimensional dense
//! array of `T` together with named dimensions and, per dimension, an
//! ordered index of unique coordinate keys.
//!
//! This module is deliberately small: it implements exactly the operations
//! linear-expression arithmetic is expressed through (construction, broadcast/align,
//! elementwise combination, selection, shift-with-fill, and the handful of
//! axis-reshaping primitives `LinearExpression` needs to fold a dimension
//! into `term`). It is not a general-purpose "xarray for Rust."

use crate::error::{Error, Result};
use indexmap::IndexSet;
use ndarray::{Array, ArrayD, ArrayViewD, Axis, IxDyn};
use std::fmt;

/// A coordinate value along one dimension: either an integer or a string key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoordKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordKey::Int(i) => write!(f, "{i}"),
            CoordKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for CoordKey {
    fn from(v: i64) -> Self {
        CoordKey::Int(v)
    }
}

impl From<&str> for CoordKey {
    fn from(v: &str) -> Self {
        CoordKey::Str(v.to_string())
    }
}

impl From<String> for CoordKey {
    fn from(v: String) -> Self {
        CoordKey::Str(v)
    }
}

/// The ordered, unique set of coordinate values along one dimension.
pub type CoordIndex = IndexSet<CoordKey>;

/// Coordinate index built from a plain integer range `0..n`, used for the
/// anonymous `term` axis and other positional (unnamed-key) axes.
pub fn range_index(n: usize) -> CoordIndex {
    (0..n as i64).map(CoordKey::Int).collect()
}

pub fn is_anonymous_name(name: &str) -> bool {
    name.strip_prefix("dim_").is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

pub fn default_dim_name(position: usize) -> String {
    format!("dim_{position}")
}

/// N-dimensional dense array with named dimensions and a per-dimension
/// coordinate index.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray<T> {
    dims: Vec<String>,
    coords: Vec<CoordIndex>,
    data: ArrayD<T>,
}

impl<T> LabeledArray<T> {
    /// Build directly from already-consistent parts. Only used internally;
    /// callers that might hand us inconsistent shapes go through
    /// [`LabeledArray::dense`] instead.
    pub(crate) fn new_unchecked(dims: Vec<String>, coords: Vec<CoordIndex>, data: ArrayD<T>) -> Self {
        debug_assert_eq!(dims.len(), coords.len());
        debug_assert_eq!(dims.len(), data.ndim());
        for (c, &len) in coords.iter().zip(data.shape()) {
            debug_assert_eq!(c.len(), len);
        }
        LabeledArray { dims, coords, data }
    }

    pub fn scalar(value: T) -> Self
    where
        T: Clone,
    {
        LabeledArray { dims: vec![], coords: vec![], data: Array::from_elem(IxDyn(&[]), value) }
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn dim_names(&self) -> &[String] {
        &self.dims
    }

    pub fn coords(&self) -> &[CoordIndex] {
        &self.coords
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn coords_of(&self, dim: &str) -> Option<&CoordIndex> {
        self.axis_of(dim).map(|i| &self.coords[i])
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<T> {
        self.data
    }

    /// Build a labeled array from dense data with named coordinates.
    /// Any `None` dimension name is replaced by its positional default
    /// (`dim_0`, `dim_1`, ...).
    pub fn dense(data: ArrayD<T>, named_coords: Vec<(Option<String>, Vec<CoordKey>)>) -> Result<Self> {
        let mut dims = Vec::with_capacity(named_coords.len());
        let mut coords = Vec::with_capacity(named_coords.len());
        for (position, (name, keys)) in named_coords.into_iter().enumerate() {
            dims.push(name.unwrap_or_else(|| default_dim_name(position)));
            let idx: CoordIndex = keys.into_iter().collect();
            coords.push(idx);
        }
        if data.shape().len() != dims.len() || data.shape().iter().zip(coords.iter()).any(|(&s, c)| s != c.len()) {
            return Err(Error::MissingCoordinates { shape: data.shape().to_vec() });
        }
        Ok(LabeledArray { dims, coords, data })
    }

    pub fn rename_dims(mut self, names: Vec<String>) -> Self {
        assert_eq!(names.len(), self.dims.len());
        self.dims = names;
        self
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> LabeledArray<U> {
        LabeledArray { dims: self.dims.clone(), coords: self.coords.clone(), data: self.data.map(f) }
    }

    /// Move the named axis to the last position, leaving the relative order
    /// of the remaining axes unchanged.
    pub fn move_axis_to_end(&self, dim: &str) -> Self
    where
        T: Clone,
    {
        let p = self.axis_of(dim).expect("dim must be present");
        if p == self.dims.len() - 1 {
            return self.clone();
        }
        let mut perm: Vec<usize> = (0..self.ndim()).filter(|&i| i != p).collect();
        perm.push(p);
        let dims: Vec<String> = perm.iter().map(|&i| self.dims[i].clone()).collect();
        let coords: Vec<CoordIndex> = perm.iter().map(|&i| self.coords[i].clone()).collect();
        let data = self.data.view().permuted_axes(perm).to_owned();
        LabeledArray::new_unchecked(dims, coords, data)
    }

    /// Append a fresh length-1 axis at the end with the given name and the
    /// single coordinate key `key`.
    pub fn insert_axis_at_end(&self, name: impl Into<String>, key: CoordKey) -> Self
    where
        T: Clone,
    {
        let data = self.data.view().insert_axis(Axis(self.ndim())).to_owned();
        let mut dims = self.dims.clone();
        dims.push(name.into());
        let mut coords = self.coords.clone();
        let mut idx = CoordIndex::new();
        idx.insert(key);
        coords.push(idx);
        LabeledArray::new_unchecked(dims, coords, data)
    }

    /// Fold the last two axes (which must be adjacent and at the end) into
    /// one axis of length `len(a)*len(b)`, named `new_name`, indexed `0..n`.
    /// Used to fold a reduced dimension into `term` when summing a
    /// `LinearExpression` over a named dimension.
    pub fn merge_last_two_axes(&self, new_name: impl Into<String>) -> Self
    where
        T: Clone,
    {
        assert!(self.ndim() >= 2);
        let n = self.ndim();
        let a = self.data.shape()[n - 2];
        let b = self.data.shape()[n - 1];
        let mut new_shape: Vec<usize> = self.data.shape()[..n - 2].to_vec();
        new_shape.push(a * b);
        let standard = self.data.as_standard_layout().into_owned();
        let data = standard.into_shape_with_order(IxDyn(&new_shape)).expect("contiguous reshape");
        let mut dims = self.dims[..n - 2].to_vec();
        dims.push(new_name.into());
        let mut coords = self.coords[..n - 2].to_vec();
        coords.push(range_index(a * b));
        LabeledArray::new_unchecked(dims, coords, data)
    }

    /// Select by coordinate key along `dim`, preserving the given order.
    pub fn select(&self, dim: &str, keys: &[CoordKey]) -> Result<Self>
    where
        T: Clone,
    {
        let axis = self.axis_of(dim).ok_or_else(|| Error::DimensionMismatch { dim: dim.to_string() })?;
        let idx: Vec<usize> = keys
            .iter()
            .map(|k| {
                self.coords[axis]
                    .get_index_of(k)
                    .ok_or_else(|| Error::DimensionMismatch { dim: dim.to_string() })
            })
            .collect::<Result<_>>()?;
        self.iselect(dim, &idx)
    }

    /// Select by positional index along `dim`.
    pub fn iselect(&self, dim: &str, idx: &[usize]) -> Result<Self>
    where
        T: Clone,
    {
        let axis = self.axis_of(dim).ok_or_else(|| Error::DimensionMismatch { dim: dim.to_string() })?;
        let data = self.data.select(Axis(axis), idx);
        let mut coords = self.coords.clone();
        coords[axis] = idx.iter().map(|&i| self.coords[axis][i].clone()).collect();
        Ok(LabeledArray::new_unchecked(self.dims.clone(), coords, data))
    }

    /// Roll `dim` by `k` positions, filling vacated positions with `fill`.
    /// The coordinate index of `dim` is unchanged (this is a *label*-space
    /// shift: it moves which value sits at which coordinate, it does not
    /// relabel the coordinates themselves).
    pub fn shift(&self, dim: &str, k: i64, fill: T) -> Result<Self>
    where
        T: Clone,
    {
        let axis = self.axis_of(dim).ok_or_else(|| Error::DimensionMismatch { dim: dim.to_string() })?;
        let len = self.data.shape()[axis] as i64;
        let mut out = ArrayD::from_elem(self.data.shape(), fill.clone());
        for i in 0..len {
            let src = i - k;
            if src >= 0 && src < len {
                let mut dst_view = out.index_axis_mut(Axis(axis), i as usize);
                let src_view = self.data.index_axis(Axis(axis), src as usize);
                dst_view.assign(&src_view);
            }
        }
        Ok(LabeledArray::new_unchecked(self.dims.clone(), self.coords.clone(), out))
    }

    /// Compute the merged (dims, coords) two arrays broadcast to, sorted by
    /// first appearance: `a`'s dims first, then `b`'s dims not already in `a`.
    pub fn broadcast_plan(
        a_dims: &[String],
        a_coords: &[CoordIndex],
        b_dims: &[String],
        b_coords: &[CoordIndex],
    ) -> Result<(Vec<String>, Vec<CoordIndex>)> {
        let mut dims = a_dims.to_vec();
        let mut coords = a_coords.to_vec();
        for (bd, bc) in b_dims.iter().zip(b_coords) {
            match dims.iter().position(|d| d == bd) {
                Some(p) => {
                    if &coords[p] != bc {
                        return Err(Error::DimensionMismatch { dim: bd.clone() });
                    }
                }
                None => {
                    dims.push(bd.clone());
                    coords.push(bc.clone());
                }
            }
        }
        Ok((dims, coords))
    }

    /// Broadcast `self` (whose dims must be a subset of `target_dims`, with
    /// matching coordinate indexes on shared dims) to `target_dims`.
    pub fn broadcast_to(&self, target_dims: &[String], target_coords: &[CoordIndex]) -> Self
    where
        T: Clone,
    {
        let data = broadcast_prefix_data(self.data.view(), &self.dims, target_dims, target_coords);
        LabeledArray::new_unchecked(target_dims.to_vec(), target_coords.to_vec(), data)
    }

    /// Like [`Self::broadcast_to`], but `self`'s trailing `k` axes (not
    /// named in `target_dims`) are preserved unchanged after the leading
    /// `self.ndim() - k` axes are broadcast against `target_dims`.
    pub fn broadcast_prefix(&self, target_dims: &[String], target_coords: &[CoordIndex], keep_trailing: usize) -> ArrayD<T>
    where
        T: Clone,
    {
        let prefix_len = self.ndim() - keep_trailing;
        broadcast_prefix_data(self.data.view(), &self.dims[..prefix_len], target_dims, target_coords)
    }

    /// Numerically reduce `dim` away by summation (used to fold a dropped
    /// dimension's *constant* contribution, as opposed to folding it into
    /// `term`, which is what happens to the coefficient/variable arrays).
    pub fn sum_dim(&self, dim: &str) -> Self
    where
        T: Clone + num::Zero,
    {
        let axis = self.axis_of(dim).expect("dim must be present");
        let data = self.data.sum_axis(Axis(axis));
        let mut dims = self.dims.clone();
        dims.remove(axis);
        let mut coords = self.coords.clone();
        coords.remove(axis);
        LabeledArray::new_unchecked(dims, coords, data)
    }

    /// Elementwise combination of two arrays after broadcasting both to
    /// their union of dimensions.
    pub fn zip_with<U, V>(&self, other: &LabeledArray<U>, f: impl Fn(&T, &U) -> V) -> Result<LabeledArray<V>>
    where
        T: Clone,
        U: Clone,
    {
        let (dims, coords) = Self::broadcast_plan(&self.dims, &self.coords, &other.dims, &other.coords)?;
        let a = self.broadcast_to(&dims, &coords);
        let b = other.broadcast_to(&dims, &coords);
        let data = ndarray::Zip::from(&a.data).and(&b.data).map_collect(|x, y| f(x, y));
        Ok(LabeledArray::new_unchecked(dims, coords, data))
    }
}

/// Broadcast `data` (whose leading axes are named by `self_prefix_dims`,
/// possibly followed by untouched trailing axes) so that its leading axes
/// match `target_prefix_dims`/`target_prefix_coords`; any axis in
/// `target_prefix_dims` absent from `self_prefix_dims` is inserted with
/// length 1 and then broadcast to the target length.
pub fn broadcast_prefix_data<T: Clone>(
    data: ArrayViewD<T>,
    self_prefix_dims: &[String],
    target_prefix_dims: &[String],
    target_prefix_coords: &[CoordIndex],
) -> ArrayD<T> {
    let trailing = data.ndim() - self_prefix_dims.len();
    let source_axis_for_target: Vec<Option<usize>> =
        target_prefix_dims.iter().map(|d| self_prefix_dims.iter().position(|sd| sd == d)).collect();
    let mut perm: Vec<usize> = source_axis_for_target.iter().filter_map(|o| *o).collect();
    debug_assert_eq!(perm.len(), self_prefix_dims.len(), "self's dims must be a subset of target dims");
    for i in 0..trailing {
        perm.push(self_prefix_dims.len() + i);
    }
    let reordered = data.permuted_axes(perm);
    let mut cur = reordered.to_owned();
    for (j, o) in source_axis_for_target.iter().enumerate() {
        if o.is_none() {
            cur = cur.insert_axis(Axis(j));
        }
    }
    let mut target_shape: Vec<usize> = target_prefix_coords.iter().map(|c| c.len()).collect();
    for i in 0..trailing {
        target_shape.push(cur.shape()[target_prefix_dims.len() + i]);
    }
    cur.broadcast(IxDyn(&target_shape)).expect("broadcast-compatible by construction").to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(xs: &[i64]) -> Vec<CoordKey> {
        xs.iter().map(|&x| CoordKey::Int(x)).collect()
    }

    #[test]
    fn scalar_has_no_dims() {
        let a = LabeledArray::scalar(3.0);
        assert_eq!(a.ndim(), 0);
        assert_eq!(a.shape(), &[] as &[usize]);
    }

    #[test]
    fn dense_assigns_default_names() {
        let data = ndarray::arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let a = LabeledArray::dense(data, vec![(None, keys(&[0, 1, 2]))]).unwrap();
        assert_eq!(a.dim_names(), &["dim_0".to_string()]);
        assert!(is_anonymous_name(&a.dim_names()[0]));
    }

    #[test]
    fn broadcast_plan_unions_by_first_appearance() {
        let a_dims = vec!["time".to_string()];
        let a_coords = vec![range_index(3)];
        let b_dims = vec!["region".to_string()];
        let b_coords = vec![range_index(2)];
        let (dims, coords) = LabeledArray::<f64>::broadcast_plan(&a_dims, &a_coords, &b_dims, &b_coords).unwrap();
        assert_eq!(dims, vec!["time".to_string(), "region".to_string()]);
        assert_eq!(coords[0].len(), 3);
        assert_eq!(coords[1].len(), 2);
    }

    #[test]
    fn broadcast_plan_rejects_conflicting_coords() {
        let dims = vec!["time".to_string()];
        let a_coords = vec![range_index(3)];
        let b_coords = vec![range_index(4)];
        let err = LabeledArray::<f64>::broadcast_plan(&dims, &a_coords, &dims, &b_coords).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn zip_with_broadcasts_outer_product() {
        let a = LabeledArray::dense(ndarray::arr1(&[1.0, 2.0]).into_dyn(), vec![(Some("a".into()), keys(&[0, 1]))]).unwrap();
        let b = LabeledArray::dense(ndarray::arr1(&[10.0, 20.0, 30.0]).into_dyn(), vec![(Some("b".into()), keys(&[0, 1, 2]))]).unwrap();
        let c = a.zip_with(&b, |x, y| x + y).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.data()[[0, 0]], 11.0);
        assert_eq!(c.data()[[1, 2]], 32.0);
    }

    #[test]
    fn shift_fills_out_of_range_with_sentinel() {
        let a = LabeledArray::dense(ndarray::arr1(&[10, 11, 12, 13]).into_dyn(), vec![(Some("time".into()), keys(&[0, 1, 2, 3]))]).unwrap();
        let shifted = a.shift("time", 1, -1).unwrap();
        assert_eq!(shifted.data().as_slice().unwrap(), &[-1, 10, 11, 12]);
    }

    #[test]
    fn shift_by_k_then_negative_k_restores_interior() {
        let a = LabeledArray::dense(ndarray::arr1(&[10, 11, 12, 13]).into_dyn(), vec![(Some("time".into()), keys(&[0, 1, 2, 3]))]).unwrap();
        let round_trip = a.shift("time", 2, -1).unwrap().shift("time", -2, -1).unwrap();
        assert_eq!(round_trip.data().as_slice().unwrap(), &[10, 11, -1, -1]);
    }

    #[test]
    fn select_preserves_requested_order() {
        let a = LabeledArray::dense(ndarray::arr1(&[10, 11, 12]).into_dyn(), vec![(Some("time".into()), keys(&[0, 1, 2]))]).unwrap();
        let s = a.select("time", &[CoordKey::Int(2), CoordKey::Int(0)]).unwrap();
        assert_eq!(s.data().as_slice().unwrap(), &[12, 10]);
    }

    #[test]
    fn merge_last_two_axes_multiplies_length() {
        let data = ndarray::Array::from_shape_fn((2, 3), |(i, j)| (i * 10 + j) as i64).into_dyn();
        let a = LabeledArray::new_unchecked(
            vec!["outer".into(), "term".into()],
            vec![range_index(2), range_index(3)],
            data,
        );
        let merged = a.merge_last_two_axes("term");
        assert_eq!(merged.shape(), &[6]);
        assert_eq!(merged.dim_names(), &["term".to_string()]);
    }
}
