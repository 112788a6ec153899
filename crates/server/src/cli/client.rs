//! Convenience client for `onboard`, `process_update`, and `identity`
//! (spec §6's "CLI surface (minimal)"). Talks to a running server over
//! the same `/v1/rpc` endpoint any other transport would use.

use sentinel_domain::operation::{IdentityArgs, OnboardArgs, ProcessUpdateArgs, Request};

const DEFAULT_URL: &str = "http://127.0.0.1:3210";

fn base_url() -> String {
    std::env::var("SENTINEL_SERVER_URL").unwrap_or_else(|_| DEFAULT_URL.into())
}

async fn call(request: Request, session_key: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let client = reqwest::Client::new();
    let mut builder = client.post(format!("{}/v1/rpc", base_url())).json(&request);
    if let Some(key) = session_key {
        builder = builder.header("x-session-key", key);
    }
    let response = builder.send().await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!("server returned {status}: {body}");
    }
    Ok(body)
}

pub async fn onboard(display_name: Option<String>, model_hint: Option<String>, agent_id: Option<String>) -> anyhow::Result<()> {
    let result = call(
        Request::Onboard(OnboardArgs {
            display_name,
            model_hint,
            agent_id,
        }),
        None,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn process_update(agent_id: String, api_key: String, response_text: String, complexity: f64) -> anyhow::Result<()> {
    let result = call(
        Request::ProcessUpdate(ProcessUpdateArgs {
            agent_id: Some(agent_id),
            api_key: Some(api_key),
            response_text,
            complexity,
            parameters: Vec::new(),
            ethical_drift: Vec::new(),
        }),
        None,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn identity(session_key: String) -> anyhow::Result<()> {
    let result = call(Request::Identity(IdentityArgs {}), Some(&session_key)).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
