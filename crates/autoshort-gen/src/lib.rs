//! Clients for the external generation services.
//!
//! The pipeline consumes these collaborators through narrow trait
//! contracts: trend discovery, script generation, voice and image
//! synthesis, and publishing. Every HTTP client enforces its own
//! timeout so a hung call cannot pin the pipeline mid-run.

pub mod contract;
pub mod error;
pub mod image;
pub mod publisher;
pub mod script;
pub mod trends;
pub mod voice;

pub use contract::{ImageSynthesizer, Publisher, ScriptGenerator, TrendScout, VoiceSynthesizer};
pub use error::{GenError, GenResult};
pub use image::HttpImageSynthesizer;
pub use publisher::HttpPublisher;
pub use script::{build_script_prompt, parse_script_json, HttpScriptGenerator};
pub use trends::HttpTrendScout;
pub use voice::HttpVoiceSynthesizer;
