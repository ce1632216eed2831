pub mod chroma;
pub mod compositor;
