//! Keyword-matched scripted replies used when remote completion is unavailable.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedCategory {
    Greeting,
    Distributor,
    Order,
    Pricing,
    Contact,
    Event,
}

impl CannedCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedCategory::Greeting => "greeting",
            CannedCategory::Distributor => "distributor",
            CannedCategory::Order => "order",
            CannedCategory::Pricing => "pricing",
            CannedCategory::Contact => "contact",
            CannedCategory::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedRule {
    pub category: CannedCategory,
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

impl CannedRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedReply {
    pub category: CannedCategory,
    pub text: &'static str,
}

// Order matters: categories overlap and the first hit wins.
pub const CANNED_RULES: &[CannedRule] = &[
    CannedRule {
        category: CannedCategory::Greeting,
        keywords: &[
            "hi",
            "hello",
            "hey",
            "good morning",
            "good afternoon",
            "good evening",
            "namaste",
            "hii",
            "hiii",
        ],
        reply: "🌟 Welcome to Zuvia!  \nI’m here to help you with orders, distributorship, pricing, or any questions you have.  \nHow may I assist you today? 😊",
    },
    CannedRule {
        category: CannedCategory::Distributor,
        keywords: &["distributor", "dealership", "dealer"],
        reply: "Thanks — we have distributorship programs for city-level partners. Could you share your city and expected monthly volume? Or press \"Apply Dealership\" to open the application form.",
    },
    CannedRule {
        category: CannedCategory::Order,
        keywords: &["order", "buy", "bulk"],
        reply: "Great — tell me the pack sizes and quantities you need (e.g., \"20 x 1L and 10 x 20L\"). Our sales team will follow up on WhatsApp or phone. Want me to open WhatsApp?",
    },
    CannedRule {
        category: CannedCategory::Pricing,
        keywords: &["price", "cost", "sizes", "pack"],
        reply: "Zuvia is available in 250 ml, 500 ml, 750 ml, 1.5 L and 20 L. For pricing we handle bulk/region-based quotes. Share your city and volume and we'll provide rates.",
    },
    CannedRule {
        category: CannedCategory::Contact,
        keywords: &["contact", "phone", "whatsapp", "email"],
        reply: "You can reach us on WhatsApp at +91-9220632019 or email zuviawater@gmail.com. Would you like me to open WhatsApp for you?",
    },
    CannedRule {
        category: CannedCategory::Event,
        keywords: &["event", "catering", "wedding"],
        reply: "For events we offer collection & return incentives for large orders. Please share date, guest count and location so we can suggest a delivery plan.",
    },
];

/// Returns the first matching rule's reply; `None` means escalate.
pub fn resolve(text: &str) -> Option<CannedReply> {
    let lowered = text.to_lowercase();
    CANNED_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| CannedReply {
            category: rule.category,
            text: rule.reply,
        })
}
