//! 多供应商 LLM 响应统一抽取库

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod json;
pub mod provider;
pub mod stream;
pub mod types;

pub use client::AiClient;
pub use config::{Credential, ModelConfig, build_registry};
pub use error::AiError;
pub use provider::{DynAdapter, ProviderAdapter, ProviderKind};
pub use types::*;
