//! Embedded HTML forms.

use crate::config::MirrorConfig;

const CONFIG_FORM: &str = include_str!("../../assets/config_form.html");
const AUTH_FORM: &str = include_str!("../../assets/auth_form.html");

/// The mirror form, pre-filled from `config`. `auth_url` is opened by the
/// page's script when the server reports a login wall.
pub(crate) fn config_form(config: &MirrorConfig, auth_url: &str) -> String {
    CONFIG_FORM
        .replace("{{MAX_DEPTH}}", &escape_attr(&config.max_depth.to_string()))
        .replace(
            "{{MAX_EXTERNAL_DEPTH}}",
            &escape_attr(&config.max_external_depth.to_string()),
        )
        .replace("{{MAX_SIZE}}", &escape_attr(&config.max_size.to_string()))
        .replace("{{ROBOTS}}", checked(config.robots))
        .replace("{{COOKIES}}", checked(config.cookies))
        .replace("{{UPDATE}}", checked(config.update))
        .replace("{{CONTINUE}}", checked(config.continue_interrupted))
        .replace("{{AUTH_URL}}", &escape_attr(auth_url))
}

pub(crate) fn auth_form() -> String {
    AUTH_FORM.to_string()
}

fn checked(on: bool) -> &'static str {
    if on {
        "checked"
    } else {
        ""
    }
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_form_reflects_config() {
        let cfg = MirrorConfig {
            max_depth: 3.into(),
            max_external_depth: "".into(),
            max_size: "5M\"x".into(),
            robots: false,
            update: true,
            ..MirrorConfig::default()
        };
        let page = config_form(&cfg, "http://127.0.0.1:10070");
        assert!(page.contains(r#"id="max_depth" value="3""#));
        assert!(page.contains(r#"id="max_external_depth" value="""#));
        assert!(page.contains(r#"id="max_size" value="5M&quot;x""#));
        assert!(page.contains(r#"id="robots" >"#));
        assert!(page.contains(r#"id="update" checked>"#));
        assert!(page.contains("window.open('http://127.0.0.1:10070'"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn auth_form_has_credential_fields() {
        let page = auth_form();
        for id in ["username", "password", "tfa"] {
            assert!(page.contains(&format!(r#"id="{id}""#)));
        }
    }
}
