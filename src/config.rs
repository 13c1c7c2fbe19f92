/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 管理后台 API 地址
    pub api_base_url: String,
    /// 访问令牌
    pub api_token: String,
    /// 题库每页条数
    pub page_size: u32,
    /// 网络失败时的最大重试次数
    pub max_retries: usize,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n 倍
    pub retry_backoff_ms: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 选题计划文件
    pub plan_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            api_token: String::new(),
            page_size: 10,
            max_retries: 3,
            retry_backoff_ms: 500,
            request_timeout_secs: 30,
            verbose_logging: false,
            plan_file: "composition.toml".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("COMPOSER_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("COMPOSER_API_TOKEN").unwrap_or(default.api_token),
            page_size: std::env::var("COMPOSER_PAGE_SIZE").ok().and_then(|v| v.parse().ok()).filter(|v| *v > 0).unwrap_or(default.page_size),
            max_retries: std::env::var("COMPOSER_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            retry_backoff_ms: std::env::var("COMPOSER_RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_ms),
            request_timeout_secs: std::env::var("COMPOSER_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("COMPOSER_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            plan_file: std::env::var("COMPOSER_PLAN_FILE").unwrap_or(default.plan_file),
        }
    }
}
