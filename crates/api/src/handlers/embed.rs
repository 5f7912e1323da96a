//! `/embed.js`: the loader a host page includes to boot the annotation client.

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;

use crate::config::EmbedConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const LOADER_TEMPLATE: &str = r#"(function () {
  var styles = __STYLES__;
  var scripts = __SCRIPTS__;
  var head = document.head || document.getElementsByTagName('head')[0];
  styles.forEach(function (href) {
    var link = document.createElement('link');
    link.rel = 'stylesheet';
    link.type = 'text/css';
    link.href = href;
    head.appendChild(link);
  });
  (function next() {
    var src = scripts.shift();
    if (!src) { return; }
    var script = document.createElement('script');
    script.type = 'text/javascript';
    script.src = src;
    script.onload = next;
    head.appendChild(script);
  })();
})();
"#;

/// GET /embed.js
pub async fn embed_js(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = render_loader(&state.config.embed)?;
    Ok((
        [
            (CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (CACHE_CONTROL, "must-revalidate"),
        ],
        body,
    ))
}

/// Render the loader with the configured asset URLs. Scripts load in order.
pub fn render_loader(config: &EmbedConfig) -> AppResult<String> {
    let styles = serde_json::to_string(&config.style_urls)
        .map_err(|e| AppError::InternalError(format!("Embed serialization error: {e}")))?;
    let scripts = serde_json::to_string(&config.script_urls)
        .map_err(|e| AppError::InternalError(format!("Embed serialization error: {e}")))?;
    Ok(LOADER_TEMPLATE
        .replace("__STYLES__", &escape_script(&styles))
        .replace("__SCRIPTS__", &escape_script(&scripts)))
}

/// Keep a URL from closing an enclosing `<script>` block.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_embeds_urls_as_json_arrays() {
        let js = render_loader(&EmbedConfig {
            script_urls: vec!["/a.js".into(), "https://cdn.example/b.js".into()],
            style_urls: vec!["/c.css".into()],
        })
        .unwrap();
        assert!(js.contains(r#"var scripts = ["/a.js","https://cdn.example/b.js"];"#));
        assert!(js.contains(r#"var styles = ["/c.css"];"#));
        assert!(!js.contains("__SCRIPTS__"));
    }

    #[test]
    fn loader_escapes_closing_tags() {
        let js = render_loader(&EmbedConfig {
            script_urls: vec!["/x.js?</script>".into()],
            style_urls: vec![],
        })
        .unwrap();
        assert!(!js.contains("</script>"));
        assert!(js.contains("var styles = [];"));
    }
}
