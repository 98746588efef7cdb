pub mod codec;
pub mod error;
pub mod farm;
pub mod image;
pub mod kernel;

pub use codec::{decode_image, encode_image};
pub use error::FilterError;
pub use farm::{FarmConfig, FarmOutput, FilterFarm};
pub use image::{GrayImage, ImageHeader};
