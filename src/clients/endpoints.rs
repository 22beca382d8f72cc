use reqwest::Url;

pub const ALERTS: &str = "/alertas";

pub const ALERT_BY_ID: &str = "/alertas/{id}";

pub const ALERT_UPDATE: &str = "/alertas/atualizar/{id}";

pub const ALERT_DELETE: &str = "/alertas/deletar/{id}";

pub const USERS: &str = "/usuarios";

pub const USER_BY_ID: &str = "/usuarios/{id}";

pub const USER_BY_EMAIL: &str = "/usuarios/email/{email}";

/// Resolves a path template against `base`, substituting `{name}` segments.
/// Substituted values are percent-encoded as single path segments.
pub fn resolve(base: &Url, template: &str, params: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        for segment in template.split('/').filter(|s| !s.is_empty()) {
            let value = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .and_then(|name| params.iter().find(|(key, _)| *key == name))
                .map(|(_, value)| *value)
                .unwrap_or(segment);
            segments.push(value);
        }
    }
    url
}
