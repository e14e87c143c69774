//! Raw API requests through the authenticated client.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use wayfare_http::{ApiRequest, ApiResponse};

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct ApiCommand {
    #[command(subcommand)]
    pub command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApiSubcommand {
    /// Send a GET request
    Get(RequestArgs),

    /// Send a POST request
    Post(RequestArgs),

    /// Send a PUT request
    Put(RequestArgs),

    /// Send a PATCH request
    Patch(RequestArgs),

    /// Send a DELETE request
    Delete(RequestArgs),
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Path relative to the API base URL, e.g. /places
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn handle(cmd: ApiCommand, client_args: &ClientArgs) -> Result<()> {
    let (request, args) = match cmd.command {
        ApiSubcommand::Get(args) => (ApiRequest::get(&args.path), args),
        ApiSubcommand::Post(args) => (ApiRequest::post(&args.path), args),
        ApiSubcommand::Put(args) => (ApiRequest::put(&args.path), args),
        ApiSubcommand::Patch(args) => (ApiRequest::patch(&args.path), args),
        ApiSubcommand::Delete(args) => (ApiRequest::delete(&args.path), args),
    };

    let request = build_request(request, &args)?;
    let client = session::connect(client_args)?;

    let response = client.send(request).await.context("Request failed")?;
    print_response(&response, args.compact)
}

fn build_request(mut request: ApiRequest, args: &RequestArgs) -> Result<ApiRequest> {
    for pair in &args.query {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid query parameter '{}', expected KEY=VALUE", pair);
        };
        request = request.query(key, value);
    }

    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("Request body is not valid JSON")?;
        request = request.json(&body)?;
    }

    Ok(request)
}

fn print_response(response: &ApiResponse, compact: bool) -> Result<()> {
    if response.bytes().iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    match serde_json::from_slice::<serde_json::Value>(response.bytes()) {
        Ok(value) if compact => output::json(&value),
        Ok(value) => output::json_pretty(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}
