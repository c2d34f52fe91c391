pub mod config;
pub mod gateway;
pub mod panels;
pub mod presets;

// Re-exports for convenience
pub use config::{AppConfig, ConfigError};
pub use gateway::{CatalogSource, FetchGateway, GatewayError, HttpGateway};
pub use panels::{
    FetchOutcome, PanelBoard, PanelDescriptor, PanelDriver, PanelKind, PanelOrchestrator,
    PanelState, SliceView, derive_panels,
};
pub use presets::{PresetError, PresetStore};
