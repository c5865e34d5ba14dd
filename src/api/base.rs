use axum::{extract::State, response::Html};
use serde::{Deserialize, Serialize};
use tracing::{event, instrument, Level};

use crate::directory::DirectoryStore;
use crate::settings::{APP_NAME, APP_VERSION};

/// Status page listing the connected peers; refreshes itself every second
pub async fn root(State(store): State<DirectoryStore>) -> Html<String> {
    let peers = store.list().unwrap_or_else(|err| {
        event!(
            Level::ERROR,
            message = "Failed reading peers",
            err = format!("{:?}", err)
        );
        Vec::new()
    });
    Html(render_status_page(&peers))
}

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Serialize, Deserialize)]
pub struct AboutResponse {
    pub name: String,
    pub version: String,
}

impl Default for AboutResponse {
    fn default() -> Self {
        Self {
            name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
        }
    }
}

#[instrument]
pub async fn about() -> axum::Json<AboutResponse> {
    axum::Json(AboutResponse::default())
}

pub fn render_status_page(peers: &[String]) -> String {
    let items: String = peers
        .iter()
        .map(|peer| format!("\t\t<li>{}</li>\n", escape_html(peer)))
        .collect();
    format!(
        "<!DOCTYPE html>
<html>
\t<head>
\t\t<meta http-equiv=\"refresh\" content=\"1\">
\t</head>
\t<body>
\t\t<h3>Connected peers:</h3>
\t\t<ul>
{}\t\t</ul>
\t</body>
</html>
",
        items
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_page_lists_peers() {
        let page = render_status_page(&["10.0.0.1:9000".to_string(), "10.0.0.2:9000".to_string()]);

        assert!(page.contains("<li>10.0.0.1:9000</li>"));
        assert!(page.contains("<li>10.0.0.2:9000</li>"));
        assert!(page.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_status_page_escapes_addresses() {
        let page = render_status_page(&["<script>alert('x')</script>".to_string()]);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }
}
