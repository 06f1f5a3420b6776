pub mod aggregate;
pub mod cluster;
pub mod color;
pub mod config;
pub mod data;
pub mod density;
pub mod draw;
pub mod image_cache;
pub mod layer;
pub mod parser;
pub mod scale;
pub mod style;

pub use aggregate::{Bin, Bins, GridAggregator, HexBinAggregator, Offset};
pub use cluster::{ClusterIndex, ClusterNode, ClusterOptions};
pub use color::{Gradient, GradientRamp, Rgba};
pub use config::RenderConfig;
pub use data::{Coord, DataPoint, DataSet, Geometry, PointSource, Projector, Viewport};
pub use density::{AlphaField, ColorField, ColorizeOptions, DensityFieldAccumulator};
pub use image_cache::{Bitmap, ImageCache, ImageFetcher, ImageState};
pub use layer::{DrawMode, LayerConfig, Renderer};
pub use scale::{CategoryMap, ChoroplethMap, IntensityConfig, IntensityMap};
pub use style::{PaintStyle, StyleOverrides};
