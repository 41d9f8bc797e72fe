//! The `fetch(url, opts?)` host function (spec §4.E).
//!
//! The script run already executes inside `tokio::task::spawn_blocking`
//! (see `provider.rs`), so a blocking HTTP client here is the correct way
//! to give scripts a "suspend on fetch" point without requiring `rhai` to
//! understand `async`/await or real JS promises.

use std::time::Duration;

use rhai::{Dynamic, EvalAltResult, Map};

const MAX_REDIRECTS: usize = 100;

fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest blocking client builds")
}

pub fn fetch_blocking(url: &str, opts: Map) -> Result<Dynamic, Box<EvalAltResult>> {
    let method = opts
        .get("method")
        .map(|m| m.to_string())
        .unwrap_or_else(|| "GET".to_string());
    let body = opts.get("body").map(|b| b.to_string());
    let headers = opts.get("headers").and_then(|h| h.clone().try_cast::<Map>());

    let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|err| runtime_err(err.to_string()))?;

    let mut request = client().request(method, url);
    if let Some(headers) = headers {
        for (name, value) in headers.iter() {
            request = request.header(name.as_str(), value.to_string());
        }
    }
    if let Some(body) = body {
        request = request.body(body);
    }

    let response = request.send().map_err(|err| runtime_err(err.to_string()))?;
    let code = response.status().as_u16();
    let body_text = response.text().unwrap_or_default();

    if !(200..300).contains(&code) {
        return Err(runtime_err(format!(
            "fetch to {url} rejected with status {code}"
        )));
    }

    let mut result = Map::new();
    result.insert("code".into(), Dynamic::from(code as i64));
    result.insert("body".into(), Dynamic::from(body_text));
    Ok(Dynamic::from(result))
}

fn runtime_err(message: String) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(message.into(), rhai::Position::NONE))
}
