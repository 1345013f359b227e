//! Text generation backends for Iqraa.
//!
//! All backends implement `iqraa_core::TextGenerator`. `build_from_config`
//! selects one from configuration.

pub mod mock;
pub mod openai_compat;
pub mod router;

pub use mock::MockGenerator;
pub use openai_compat::OpenAiCompatGenerator;
pub use router::{build_from_config, default_base_url};
