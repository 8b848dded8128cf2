//! Synthetic hospital dataset generator.
//!
//! Generates deterministic, FK-consistent hospital data (providers, patients,
//! encounters with diagnosis/procedure fan-out, billing) and renders it as
//! batched INSERT statements plus the operational DDL.
//!
//! # Example
//!
//! ```rust
//! use hospital_data_gen::{Generator, GeneratorConfig, RenderConfig, Renderer};
//!
//! // Small dataset with a fixed seed for reproducibility
//! let config = GeneratorConfig::default().with_seed(42).with_encounters(100);
//! let data = Generator::new(config).unwrap().generate();
//!
//! let renderer = Renderer::new(RenderConfig::new());
//! let sql = renderer.render_to_string(&data).unwrap();
//!
//! assert!(sql.contains("INSERT INTO encounters"));
//! ```

pub mod fake;
pub mod generator;
pub mod model;
pub mod renderer;
pub mod schema;
pub mod value;

pub use generator::{generate, GenerateError, Generator, GeneratorConfig, IdBlock, IdSpace};
pub use model::{DatasetBundle, Record};
pub use renderer::{emit, write_insert_batches, RenderConfig, RenderStats, Renderer};
pub use schema::{hospital_schema, Column, ForeignKey, Schema, SqlType, Table};
pub use value::{Row, SqlValue, TableData};
