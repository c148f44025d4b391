//! HTML shells for the front-end entries.

use axum::response::Html;

/// Where a page's script comes from.
#[derive(Debug, Clone)]
pub enum ScriptSource {
    /// Compiled bundle served from `/build/`.
    Bundle(String),
    /// Module served by the front-end dev server.
    DevServer(String),
}

#[derive(Debug, Clone)]
pub struct LogoutLink {
    pub href: String,
    pub label: String,
}

/// Page data handed to the front-end entry.
#[derive(Debug, Clone)]
pub struct Page {
    pub app_name: &'static str,
    pub title: &'static str,
    pub script: ScriptSource,
    pub user: Option<String>,
    pub logout_links: Vec<LogoutLink>,
}

impl Page {
    pub fn render(&self) -> Html<String> {
        let scripts = match &self.script {
            ScriptSource::Bundle(asset_path) => format!(
                r#"<script type="module" src="/build/{}"></script>"#,
                escape(asset_path)
            ),
            ScriptSource::DevServer(origin) => {
                let origin = escape(origin.trim_end_matches('/'));
                format!(
                    r#"<script type="module" src="{origin}/@vite/client"></script>
    <script type="module" src="{origin}/src/{app}/main.jsx"></script>"#,
                    origin = origin,
                    app = self.app_name
                )
            }
        };

        let user = self
            .user
            .as_deref()
            .map(|name| {
                format!(
                    r#"<p class="user">Signed in as <strong>{}</strong></p>"#,
                    escape(name)
                )
            })
            .unwrap_or_default();

        let links: String = self
            .logout_links
            .iter()
            .map(|link| {
                format!(
                    r#"<a href="{}">{}</a>"#,
                    escape(&link.href),
                    escape(&link.label)
                )
            })
            .collect::<Vec<_>>()
            .join("\n      ");

        Html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{title}</title>
  </head>
  <body>
    <div id="root" data-app="{app}">
      {user}
      {links}
    </div>
    {scripts}
  </body>
</html>
"#,
            title = self.title,
            app = self.app_name,
            user = user,
            links = links,
            scripts = scripts
        ))
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
