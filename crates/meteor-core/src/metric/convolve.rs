use ndarray::{s, Array2, ArrayView2, Zip};

/// 2-D convolution in *valid* mode: the output only covers positions where
/// the kernel fully overlaps the input, so each dimension shrinks by
/// `kernel_size - 1`. The kernel is flipped as in a true convolution.
///
/// An input smaller than the kernel yields an empty array.
pub fn convolve_valid(input: ArrayView2<f64>, kernel: ArrayView2<f64>) -> Array2<f64> {
    let (ih, iw) = input.dim();
    let (kh, kw) = kernel.dim();
    if ih < kh || iw < kw {
        return Array2::zeros((0, 0));
    }

    let flipped = flip(kernel);
    Zip::from(input.windows((kh, kw)))
        .map_collect(|window| {
            Zip::from(&window)
                .and(&flipped)
                .fold(0.0, |acc, &a, &b| acc + a * b)
        })
}

/// Reverse a kernel along both axes.
pub fn flip(kernel: ArrayView2<f64>) -> Array2<f64> {
    kernel.slice(s![..;-1, ..;-1]).to_owned()
}

/// Build an owned kernel from a literal square table.
pub fn kernel_from<const N: usize>(table: &[[f64; N]; N]) -> Array2<f64> {
    Array2::from_shape_fn((N, N), |(r, c)| table[r][c])
}
