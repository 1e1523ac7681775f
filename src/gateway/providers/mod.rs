//! One module per provider wire protocol (spec §4.A, §6).

pub mod anthropic;
pub mod baidu;
pub mod openai_compatible;
pub mod qwen;
pub mod spark;
pub mod zhipu;

pub use anthropic::AnthropicAdapter;
pub use baidu::BaiduAdapter;
pub use openai_compatible::{OpenAiCompatibleAdapter, Pricing};
pub use qwen::QwenAdapter;
pub use spark::SparkAdapter;
pub use zhipu::ZhipuAdapter;
