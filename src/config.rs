use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::AiClient;
use crate::error::AiError;
use crate::http::DynHttpTransport;
use crate::provider::ProviderKind;

/// 模型配置 描述一个可调用后端
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 自定义句柄 例如 `default-openai`
    pub handle: String,
    pub provider: ProviderKind,
    pub credential: Credential,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
}

/// 鉴权信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// 直接给出的 API Key
    ApiKey { key: String },
    /// 从环境变量读取 例如 `OPENAI_API_KEY`
    Env { var: String },
}

impl Credential {
    fn resolve(&self, handle: &str) -> Result<String, AiError> {
        match self {
            Credential::ApiKey { key } => Ok(key.clone()),
            Credential::Env { var } => std::env::var(var).map_err(|_| {
                AiError::invalid_argument(format!(
                    "handle {handle}: environment variable {var} is not set"
                ))
            }),
        }
    }
}

/// 按配置一次性构建全部客户端 句柄重复立即报错
///
/// 启动时整表构建 运行期不再有动态注册
pub fn build_registry(
    configs: &[ModelConfig],
    transport: DynHttpTransport,
) -> Result<HashMap<String, AiClient>, AiError> {
    let mut registry = HashMap::with_capacity(configs.len());
    for config in configs {
        let api_key = config.credential.resolve(&config.handle)?;
        let mut client = AiClient::with_transport(config.provider, api_key, transport.clone())?;
        if let Some(base_url) = &config.base_url {
            client = client.with_base_url(base_url.clone());
        }
        if let Some(model) = &config.default_model {
            client.set("model", Value::String(model.clone()))?;
        }
        if registry.insert(config.handle.clone(), client).is_some() {
            return Err(AiError::invalid_argument(format!(
                "duplicate handle: {}",
                config.handle
            )));
        }
    }
    Ok(registry)
}
