pub mod app;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod generation;
pub mod logging;
pub mod model;
pub mod view;

pub use app::ReelsCopyApp;
pub use config::{Config, ConfigManager};
pub use controller::{CaptionController, CopyOutcome, SubmitError};
pub use generation::{CaptionGenerator, GeminiClient, GenerationError};
pub use model::{CopyInputs, Field, GeneratedCopy, Status};
