//! Rig bridge for structured extraction.
//!
//! [`RigModel`] wraps any Rig [`CompletionModel`](rig::completion::CompletionModel)
//! so it can drive a [`StructuredExtractor`](structured_extractor::extraction::StructuredExtractor).
//!
//! ```ignore
//! use rig::client::{CompletionClient, ProviderClient};
//! use rig::providers::openai;
//! use structured_extractor::prelude::*;
//! use structured_rig::RigModel;
//!
//! let client = openai::Client::from_env();
//! let model = RigModel::new(client.completion_model("gpt-4o-mini"));
//! let extractor = StructuredExtractor::new(model);
//! ```

pub mod model;
pub mod request;

pub use model::RigModel;
pub use request::{first_output, json_mode_params, to_rig_request, RigRequest};
