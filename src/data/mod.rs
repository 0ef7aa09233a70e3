//! Raw market data handling
//!
//! - `series`: the chronological close/volume rows fed into the pipeline
//! - `frame`: provider-shaped tables and their normalization
//! - `source`: the seam to whatever retrieves data for a ticker

mod frame;
mod series;
mod source;

pub use frame::*;
pub use series::*;
pub use source::*;
