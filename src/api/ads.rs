#[derive(Debug, Clone, Default)]
pub struct AdScriptConfig {
    script_url: Option<String>,
}

impl AdScriptConfig {
    pub fn new(script_url: Option<String>) -> Self {
        let script_url = script_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Self { script_url }
    }

    pub fn script_url(&self) -> Option<&str> {
        self.script_url.as_deref()
    }
}

pub fn inject_ad_script(html: &str, config: &AdScriptConfig) -> String {
    let Some(url) = config.script_url() else {
        return html.to_string();
    };

    let snippet = loader_snippet(url);
    // ASCII lowercasing keeps byte offsets stable.
    match html.to_ascii_lowercase().find("</head>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + snippet.len());
            out.push_str(&html[..idx]);
            out.push_str(&snippet);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{snippet}{html}"),
    }
}

fn loader_snippet(url: &str) -> String {
    format!(
        "<script>(function(){{var s=document.createElement('script');s.src='{}';s.crossOrigin='anonymous';s.async=true;document.head.appendChild(s);}})();</script>\n",
        escape_js_single_quoted(url)
    )
}

fn escape_js_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\x3c"),
            '>' => out.push_str("\\x3e"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}
