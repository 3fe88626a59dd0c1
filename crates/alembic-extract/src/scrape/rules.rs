//! Per-platform scraping rules
//!
//! Share pages of the big chat products differ in where the conversation
//! lives, which sign-in overlays cover it and which boilerplate leaks into the
//! visible text. Rules are plain data; the session turns them into page
//! scripts and the harvest step applies the noise patterns.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Chat product a share URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// chatgpt.com
    ChatGpt,
    /// gemini.google.com
    Gemini,
    /// claude.ai
    Claude,
    /// perplexity.ai
    Perplexity,
    /// Anything else
    Generic,
}

impl Platform {
    /// Detect the platform from the URL host.
    pub fn detect(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("chatgpt.com") || matches("chat.openai.com") {
            Platform::ChatGpt
        } else if matches("gemini.google.com") {
            Platform::Gemini
        } else if matches("claude.ai") {
            Platform::Claude
        } else if matches("perplexity.ai") {
            Platform::Perplexity
        } else {
            Platform::Generic
        }
    }

    /// Lowercase name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Gemini => "gemini",
            Platform::Claude => "claude",
            Platform::Perplexity => "perplexity",
            Platform::Generic => "generic",
        }
    }
}

/// How to scrape one platform.
#[derive(Debug, Clone)]
pub struct ScrapingRules {
    /// Platform these rules apply to
    pub platform: Platform,
    /// Elements removed before scrolling (modals, sign-in gates)
    pub overlay_selectors: &'static [&'static str],
    /// Conversation containers, most specific first
    pub content_selectors: &'static [&'static str],
    /// Boilerplate stripped from harvested text
    pub noise_patterns: &'static [&'static str],
    /// Shortest text accepted from a selector-based harvest
    pub min_content_length: usize,
    /// Harvest every `<article>` joined by separators before trying selectors
    pub join_articles: bool,
}

/// Separator placed between joined elements
pub const ELEMENT_SEPARATOR: &str = "\n---\n";

static CHATGPT: ScrapingRules = ScrapingRules {
    platform: Platform::ChatGpt,
    overlay_selectors: &[
        r#"div[class*="modal"]"#,
        r#"div[class*="Modal"]"#,
        "div[data-headlessui-state]",
        r#"a[href*="/auth/login"]"#,
        r#"a[href*="/signup"]"#,
    ],
    content_selectors: &[
        "article",
        r#"main[class*="react-scroll"]"#,
        r#"div[class*="conversation"]"#,
        "main",
    ],
    noise_patterns: &[
        r"Skip to content",
        r"ChatGPT\s*Log in\s*Sign up",
        r"(?s)Get smarter responses.*?Log in.*?Sign up for free",
        r"ChatGPT is AI and can make mistakes\.?(?: Check important info\.)?",
    ],
    min_content_length: 500,
    join_articles: true,
};

static GEMINI: ScrapingRules = ScrapingRules {
    platform: Platform::Gemini,
    overlay_selectors: &[
        r#"div[role="dialog"]"#,
        r#"div[role="presentation"]"#,
        ".mS787c",
        ".idpc",
        r#"iframe[src*="google.com/gsi"]"#,
        "#credential_picker_container",
    ],
    content_selectors: &[".conversation-container", "main", ".chat-history", "article"],
    noise_patterns: &[r"(?s)Sign in.*?Google", r"Use Gemini at work\?"],
    min_content_length: 500,
    join_articles: false,
};

static CLAUDE: ScrapingRules = ScrapingRules {
    platform: Platform::Claude,
    overlay_selectors: &[
        r#"div[role="dialog"]"#,
        r#"div[class*="modal"]"#,
        r#"button[aria-label*="close"]"#,
    ],
    content_selectors: &[r#"[data-testid="conversation"]"#, "main", "article"],
    noise_patterns: &[r"(?s)Sign up.*?Claude", r"Log in to Claude"],
    min_content_length: 500,
    join_articles: false,
};

static PERPLEXITY: ScrapingRules = ScrapingRules {
    platform: Platform::Perplexity,
    overlay_selectors: &[r#"div[role="dialog"]"#, r#"div[class*="modal"]"#],
    content_selectors: &[r#"[class*="thread"]"#, "main", "article"],
    noise_patterns: &[r"(?s)Sign up.*?Perplexity"],
    min_content_length: 500,
    join_articles: false,
};

static GENERIC: ScrapingRules = ScrapingRules {
    platform: Platform::Generic,
    overlay_selectors: &[r#"div[role="dialog"]"#, r#"div[role="presentation"]"#],
    content_selectors: &[".conversation-container", "main", ".chat-content", "article"],
    noise_patterns: &[],
    min_content_length: 100,
    join_articles: false,
};

impl ScrapingRules {
    /// Rules for the platform serving `url`.
    pub fn for_url(url: &Url) -> &'static ScrapingRules {
        Self::for_platform(Platform::detect(url))
    }

    /// Rules for a known platform.
    pub fn for_platform(platform: Platform) -> &'static ScrapingRules {
        match platform {
            Platform::ChatGpt => &CHATGPT,
            Platform::Gemini => &GEMINI,
            Platform::Claude => &CLAUDE,
            Platform::Perplexity => &PERPLEXITY,
            Platform::Generic => &GENERIC,
        }
    }

    /// Strip this platform's boilerplate from harvested text.
    pub fn strip_noise(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for pattern in compiled_patterns(self.platform) {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        cleaned.trim().to_string()
    }

    /// Script that deletes overlays and re-enables scrolling on the page.
    pub fn overlay_removal_script(&self) -> String {
        format!(
            r#"(() => {{
    const selectors = {selectors};
    let removed = 0;
    for (const sel of selectors) {{
        document.querySelectorAll(sel).forEach(el => {{ el.remove(); removed += 1; }});
    }}
    if (document.body) document.body.style.overflow = 'auto';
    document.documentElement.style.overflow = 'auto';
    return removed;
}})()"#,
            selectors = js_string_array(self.overlay_selectors),
        )
    }

    /// Script returning the conversation text, falling back to the whole body.
    pub fn harvest_script(&self) -> String {
        format!(
            r#"(() => {{
    const minLength = {min};
    const separator = {separator};
    const textOf = els => Array.from(els).map(el => el.innerText || '').join(separator).trim();
    if ({join_articles}) {{
        const joined = textOf(document.querySelectorAll('article'));
        if (joined.length >= minLength) return joined;
    }}
    for (const sel of {selectors}) {{
        const found = document.querySelectorAll(sel);
        if (found.length === 0) continue;
        const text = textOf(found);
        if (text.length >= minLength) return text;
    }}
    return document.body ? document.body.innerText : '';
}})()"#,
            min = self.min_content_length,
            separator = js_string(ELEMENT_SEPARATOR),
            join_articles = self.join_articles,
            selectors = js_string_array(self.content_selectors),
        )
    }
}

fn compiled_patterns(platform: Platform) -> &'static [Regex] {
    static CACHE: OnceLock<[Vec<Regex>; 5]> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        [
            Platform::ChatGpt,
            Platform::Gemini,
            Platform::Claude,
            Platform::Perplexity,
            Platform::Generic,
        ]
        .map(|platform| {
            ScrapingRules::for_platform(platform)
                .noise_patterns
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect()
        })
    });

    let index = match platform {
        Platform::ChatGpt => 0,
        Platform::Gemini => 1,
        Platform::Claude => 2,
        Platform::Perplexity => 3,
        Platform::Generic => 4,
    };
    &cache[index]
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn js_string_array(values: &[&str]) -> String {
    serde_json::Value::Array(
        values
            .iter()
            .map(|v| serde_json::Value::String((*v).to_string()))
            .collect(),
    )
    .to_string()
}
