// Configuration loading and local persistence

pub mod error;
pub mod layout;
pub mod presets;
pub mod settings;
pub mod store;

pub use error::{ConfigError, StoreError};
pub use layout::{CategoryDef, FilterDef, ModuleLayout, SubCategoryDef};
pub use settings::{ModifierStyle, RankingWeights, Settings};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
