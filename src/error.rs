use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChrError {
    /// Malformed plane map descriptor
    #[error("bad plane map: {0}")]
    Format(String),
    /// A block or pixel buffer does not have the expected size
    #[error("bad dimensions: {0}")]
    Dimension(String),
    /// Tile layout or sheet settings that can't be honored
    #[error("bad configuration: {0}")]
    Config(String),
    /// Value out of the representable range (bit index, color index)
    #[error("value out of range: {0}")]
    Value(String),
    /// Pixel color that can't be turned into a color index
    #[error("{0}")]
    Color(String),
    #[error("corrupt packbits stream: {0}")]
    Packbits(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("can't decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("can't decode PNG: {0}")]
    Png(#[from] png::DecodingError),
}

pub type Result<T> = std::result::Result<T, ChrError>;
