use reqwest::Url;

pub const DEFAULT_WHATSAPP_NUMBER: &str = "919220632019";
pub const DEFAULT_WHATSAPP_MESSAGE: &str = "Hi Zuvia, I need help with an order / distributorship";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Human hand-off channel offered when no reply can be produced.
pub struct EscalationConfig {
    /// International format without the leading `+`.
    pub whatsapp_number: String,
    pub prefilled_message: String,
    pub prompt: String,
    pub label: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
            prefilled_message: DEFAULT_WHATSAPP_MESSAGE.to_string(),
            prompt: "Contact via WhatsApp:".to_string(),
            label: "Open WhatsApp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationLink {
    pub prompt: String,
    pub label: String,
    pub url: String,
}

impl EscalationConfig {
    pub fn link(&self) -> EscalationLink {
        EscalationLink {
            prompt: self.prompt.clone(),
            label: self.label.clone(),
            url: whatsapp_deep_link(&self.whatsapp_number, &self.prefilled_message),
        }
    }
}

/// `https://wa.me/<number>?text=<message>` with the message query-encoded.
pub fn whatsapp_deep_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    let base = format!("https://wa.me/{digits}");
    match Url::parse_with_params(&base, &[("text", message)]) {
        Ok(url) => url.to_string(),
        Err(error) => {
            tracing::warn!(error = %error, "failed to build escalation link; omitting message");
            base
        }
    }
}
