pub mod product_source;

pub use product_source::ProductSource;
