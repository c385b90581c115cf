use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use zuvia_chat::{DEFAULT_STORAGE_KEY, DEFAULT_WHATSAPP_NUMBER};

#[derive(Debug, Parser)]
#[command(
    name = "zuvia",
    about = "Zuvia chat assistant: terminal widget host and completion proxy",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "state-dir",
        env = "ZUVIA_STATE_DIR",
        default_value = ".zuvia",
        global = true,
        help = "Directory holding the persisted conversation record"
    )]
    pub(crate) state_dir: PathBuf,

    #[arg(
        long = "storage-key",
        env = "ZUVIA_STORAGE_KEY",
        default_value = DEFAULT_STORAGE_KEY,
        global = true,
        help = "Key the conversation is stored under inside --state-dir"
    )]
    pub(crate) storage_key: String,

    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Chat with the assistant in the terminal.
    Chat(ChatArgs),
    /// Serve the completion proxy (`POST /api/chat`, `GET /api/health`).
    Proxy(ProxyArgs),
    /// Print the persisted conversation.
    History,
    /// Delete the persisted conversation.
    Reset,
}

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    #[arg(
        long = "chat-endpoint",
        env = "ZUVIA_CHAT_ENDPOINT",
        help = "Completion proxy URL, e.g. http://127.0.0.1:8787/api/chat. Without it only scripted replies are used"
    )]
    pub(crate) chat_endpoint: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "ZUVIA_REQUEST_TIMEOUT_MS",
        default_value_t = 15_000,
        help = "Timeout for one call to the completion proxy"
    )]
    pub(crate) request_timeout_ms: u64,

    #[arg(
        long = "max-retries",
        env = "ZUVIA_MAX_RETRIES",
        default_value_t = 0,
        help = "Extra attempts for retryable proxy failures (429, 5xx, timeouts)"
    )]
    pub(crate) max_retries: usize,

    #[arg(
        long = "whatsapp-number",
        env = "ZUVIA_WHATSAPP_NUMBER",
        default_value = DEFAULT_WHATSAPP_NUMBER,
        help = "Sales contact offered when no answer is available"
    )]
    pub(crate) whatsapp_number: String,
}

#[derive(Debug, Args)]
pub(crate) struct ProxyArgs {
    #[arg(
        long,
        env = "ZUVIA_PROXY_BIND",
        default_value = "127.0.0.1:8787",
        help = "Socket address to listen on"
    )]
    pub(crate) bind: String,

    #[arg(
        long = "upstream-base-url",
        env = "ZUVIA_UPSTREAM_BASE_URL",
        default_value = "https://api.openai.com/v1",
        help = "Base URL of the OpenAI-compatible provider"
    )]
    pub(crate) upstream_base_url: String,

    #[arg(
        long = "openai-api-key",
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        help = "Provider credential. When unset, /api/chat answers 500"
    )]
    pub(crate) openai_api_key: Option<String>,

    #[arg(
        long,
        env = "ZUVIA_MODEL",
        default_value = "gpt-3.5-turbo",
        help = "Model requested from the provider"
    )]
    pub(crate) model: String,

    #[arg(long = "max-tokens", default_value_t = 800)]
    pub(crate) max_tokens: u32,

    #[arg(long, default_value_t = 0.2)]
    pub(crate) temperature: f32,

    #[arg(
        long = "upstream-timeout-ms",
        env = "ZUVIA_UPSTREAM_TIMEOUT_MS",
        default_value_t = 30_000,
        help = "Timeout for one provider call"
    )]
    pub(crate) upstream_timeout_ms: u64,
}
