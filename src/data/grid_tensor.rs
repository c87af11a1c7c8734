use ndarray::{ArrayView4, ArrayViewD, Ix4};
use serde::{Deserialize, Serialize};
use crate::error::DecodeError;
use crate::Result;

/// Read-only access to a detector output grid, batch index fixed at 0.
///
/// Coordinates are `(x, y, channel)` with `x` the grid row, `y` the grid column.
pub trait GridTensorView {
    /// Reads one value, failing with [`DecodeError::IndexOutOfRange`] outside [`Self::dims`].
    fn get(&self, x: usize, y: usize, channel: usize) -> Result<f32>;

    /// `(rows, cols, channels)` of the grid.
    fn dims(&self) -> (usize, usize, usize);
}

impl<V: GridTensorView + ?Sized> GridTensorView for &V {
    fn get(&self, x: usize, y: usize, channel: usize) -> Result<f32> {
        (**self).get(x, y, channel)
    }

    fn dims(&self) -> (usize, usize, usize) {
        (**self).dims()
    }
}

/// Axis order of a 4-D output tensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorLayout {
    /// `[batch, rows, cols, channels]`
    #[default]
    Nhwc,
    /// `[batch, channels, rows, cols]`
    Nchw,
}

/// Output grid of a half-precision model.
pub type GridTensorF16<'a> = GridTensor<'a, half::f16>;

/// [`GridTensorView`] over an `ndarray` view, for any element convertible to `f32` (`f32`, `half::f16`).
#[derive(Debug, Clone)]
pub struct GridTensor<'a, T> {
    view: ArrayView4<'a, T>,
    layout: TensorLayout,
}

impl<'a, T> GridTensor<'a, T> {
    pub fn new(view: ArrayView4<'a, T>, layout: TensorLayout) -> Result<Self> {
        if view.shape()[0] == 0 {
            return Err(DecodeError::configuration("tensor has an empty batch axis"));
        }
        Ok(Self { view, layout })
    }

    pub fn nhwc(view: ArrayView4<'a, T>) -> Result<Self> {
        Self::new(view, TensorLayout::Nhwc)
    }

    pub fn nchw(view: ArrayView4<'a, T>) -> Result<Self> {
        Self::new(view, TensorLayout::Nchw)
    }

    pub fn from_dyn(view: ArrayViewD<'a, T>, layout: TensorLayout) -> Result<Self> {
        let ndim = view.ndim();
        let view = view.into_dimensionality::<Ix4>().map_err(|_| {
            DecodeError::configuration(format!("expected a 4-D tensor, got {} dimensions", ndim))
        })?;
        Self::new(view, layout)
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }
}

impl<T: Copy + Into<f32>> GridTensorView for GridTensor<'_, T> {
    fn get(&self, x: usize, y: usize, channel: usize) -> Result<f32> {
        let (rows, cols, channels) = self.dims();
        let out_of_range = DecodeError::IndexOutOfRange { x, y, channel, rows, cols, channels };
        if x >= rows || y >= cols || channel >= channels {
            return Err(out_of_range);
        }

        let index = match self.layout {
            TensorLayout::Nhwc => [0, x, y, channel],
            TensorLayout::Nchw => [0, channel, x, y],
        };
        self.view.get(index).map(|&v| v.into()).ok_or(out_of_range)
    }

    fn dims(&self) -> (usize, usize, usize) {
        let shape = self.view.shape();
        match self.layout {
            TensorLayout::Nhwc => (shape[1], shape[2], shape[3]),
            TensorLayout::Nchw => (shape[2], shape[3], shape[1]),
        }
    }
}
