//! Savitzky-Golay smoothing.
//!
//! - [`design`]: least-squares polynomial weights for any evaluation
//!   position inside the window, matching `scipy.signal.savgol_coeffs`.
//! - [`apply`]: overlap-add FFT correlation for the interior plus
//!   polynomial-fit edges, matching `scipy.signal.savgol_filter(mode='interp')`.

pub mod apply;
pub mod design;

pub use apply::{convolve_full, correlate_valid, savgol_filter};
pub use design::savgol_coeffs;
