pub use frame::*;
pub use layout::*;
pub use manager::*;
pub use matrix::MatrixUbo;

mod frame;
mod layout;
mod manager;
pub mod matrix;
