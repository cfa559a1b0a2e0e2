use serde_json::Value;

use crate::error::AiError;
use crate::http::{self, DynHttpTransport, reqwest::default_dyn_transport};
use crate::provider::{DynAdapter, ProviderKind};
use crate::stream::{collect_body_text, reassemble};
use crate::types::{ExtractedResult, Prompt, RequestConfig};

// 未配置 system_prompt 时的缺省指令
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// 单个供应商的调用入口 持有最近一次原始响应
///
/// `query` 发送请求并缓存原始响应 `first_result` / `all_results` 在其上做抽取
/// 因此同一响应可以抽取多次 而下一次 `query` 会覆盖它
pub struct AiClient {
    adapter: DynAdapter,
    transport: DynHttpTransport,
    api_key: String,
    base_url: String,
    config: RequestConfig,
    last_response: Option<Value>,
}

// api_key 不进入 Debug 输出
impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("provider", &self.adapter.name())
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("has_response", &self.last_response.is_some())
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// 创建指定家族的客户端 空密钥直接拒绝
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Result<Self, AiError> {
        let transport = default_dyn_transport()?;
        Self::with_transport(kind, api_key, transport)
    }

    /// 注入自定义 Transport 测试与代理场景使用
    pub fn with_transport(
        kind: ProviderKind,
        api_key: impl Into<String>,
        transport: DynHttpTransport,
    ) -> Result<Self, AiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::invalid_argument("api key cannot be empty"));
        }
        let adapter = kind.adapter();
        let base_url = adapter.default_base_url().to_string();
        Ok(Self {
            adapter,
            transport,
            api_key,
            base_url,
            config: RequestConfig::default(),
            last_response: None,
        })
    }

    /// 自定义 base_url 兼容 Mistral/Groq/xAI 等同方言端点
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 按名字设置一个请求选项 未知名字立即报错
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AiError> {
        self.config.set(name, value)
    }

    /// 直接访问请求配置
    pub fn config_mut(&mut self) -> &mut RequestConfig {
        &mut self.config
    }

    /// 发送一次请求并缓存原始响应
    ///
    /// 流式请求在此完成重组 缓存的形状与阻塞响应一致
    pub async fn query(&mut self, prompt: impl Into<Prompt>) -> Result<&Value, AiError> {
        let system = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let messages = prompt.into().into_messages(Some(&system))?;

        let stream = self.config.wants_stream();
        let endpoint =
            self.adapter
                .chat_endpoint(&self.base_url, &self.config, &self.api_key, stream)?;
        let body = self.adapter.build_body(&messages, &self.config, stream)?;
        let headers = self.adapter.headers(&self.api_key);

        let raw = if stream {
            let response =
                http::post_json_stream(self.transport.as_ref(), endpoint, headers, &body).await?;
            if !(200..300).contains(&response.status) {
                let text = collect_body_text(response.body, self.adapter.name()).await?;
                return Err(self.adapter.parse_error(response.status, &text));
            }
            let text = reassemble(response.body, self.adapter.delta()).await?;
            self.adapter.wrap_stream_text(&text)
        } else {
            let response =
                http::post_json(self.transport.as_ref(), endpoint, headers, &body).await?;
            let status = response.status;
            let ok = response.is_success();
            let text = response.into_string()?;
            if !ok {
                return Err(self.adapter.parse_error(status, &text));
            }
            serde_json::from_str(&text).map_err(|err| {
                AiError::signaled(
                    self.adapter.name(),
                    format!("failed to parse response body: {err}"),
                )
            })?
        };

        Ok(self.last_response.insert(raw))
    }

    /// 抽取最近一次响应的首个结果
    pub fn first_result(&self) -> Result<ExtractedResult, AiError> {
        let raw = self.require_response()?;
        self.adapter.first_result(raw, self.config.wants_json())
    }

    /// 抽取最近一次响应的全部结果
    pub fn all_results(&self) -> Result<Vec<ExtractedResult>, AiError> {
        let raw = self.require_response()?;
        self.adapter.all_results(raw, self.config.wants_json())
    }

    /// 最近一次的原始响应
    pub fn last_response(&self) -> Option<&Value> {
        self.last_response.as_ref()
    }

    /// 列出该端点可用的模型
    pub async fn models(&self) -> Result<Vec<String>, AiError> {
        let url = self.adapter.models_endpoint(&self.base_url, &self.api_key);
        let headers = self.adapter.headers(&self.api_key);
        let raw = http::get_json(self.transport.as_ref(), url, headers).await?;
        Ok(self.adapter.parse_models(&raw))
    }

    fn require_response(&self) -> Result<&Value, AiError> {
        self.last_response
            .as_ref()
            .ok_or_else(|| AiError::invalid_argument("no response available, call query() first"))
    }
}
