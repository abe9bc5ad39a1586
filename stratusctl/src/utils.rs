use anyhow::Result;
use reqwest::Url;

use crate::CONFIG;

pub fn gen_url(kind: String, name: Option<&String>) -> Result<Url> {
    let url = CONFIG.base_url.to_owned();
    let path = if let Some(name) = name {
        format!("api/v1/{}/{}", kind, name)
    } else {
        format!("api/v1/{}", kind)
    };
    Ok(url.join(path.as_str())?)
}

/// Watch endpoint for a single named resource.
pub fn gen_watch_url(kind: String, name: &String) -> Result<Url> {
    let mut url = CONFIG.base_url.to_owned();
    match url.scheme() {
        "https" => url.set_scheme("wss").ok(),
        _ => url.set_scheme("ws").ok(),
    };
    Ok(url.join(format!("api/v1/watch/{}/{}", kind, name).as_str())?)
}
