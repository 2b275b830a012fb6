//! confkv CLI Client
//!
//! Command-line interface for a running confkv server.

use clap::{Parser, Subcommand};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

/// confkv CLI
#[derive(Parser, Debug)]
#[command(name = "confkv-cli")]
#[command(about = "CLI for the confkv configuration store")]
struct Args {
    /// Server base URL
    #[arg(short, long, env = "CONFKV_URL", default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the latest config of a client, or one exact version
    Get {
        client: String,
        version: Option<String>,
    },

    /// Create a new (client, version) record holding one entry
    Create {
        client: String,
        version: i64,
        key: String,
        value: String,
    },

    /// Set one entry, keeping the others
    Set {
        client: String,
        version: String,
        key: String,
        value: String,
    },

    /// Replace every entry with a single one
    Replace {
        client: String,
        version: String,
        key: String,
        value: String,
    },

    /// Delete a record
    Delete { client: String, version: String },
}

impl Commands {
    /// HTTP method, path and optional JSON body for this command
    fn request(self) -> (Method, String, Option<Value>) {
        match self {
            Commands::Get { client, version: None } => (Method::GET, format!("/config/{}", client), None),
            Commands::Get {
                client,
                version: Some(version),
            } => (Method::GET, format!("/config/{}/{}", client, version), None),
            Commands::Create {
                client,
                version,
                key,
                value,
            } => (
                Method::POST,
                "/config".to_string(),
                Some(json!({"client": client, "version": version, "key": key, "value": value})),
            ),
            Commands::Set {
                client,
                version,
                key,
                value,
            } => (
                Method::PATCH,
                format!("/config/{}/{}", client, version),
                Some(json!({"key": key, "value": value})),
            ),
            Commands::Replace {
                client,
                version,
                key,
                value,
            } => (
                Method::PUT,
                format!("/config/{}/{}", client, version),
                Some(json!({"key": key, "value": value})),
            ),
            Commands::Delete { client, version } => {
                (Method::DELETE, format!("/config/{}/{}", client, version), None)
            }
        }
    }
}

async fn execute(server: &str, command: Commands) -> Result<(StatusCode, Option<Value>), reqwest::Error> {
    let (method, path, body) = command.request();
    let url = format!("{}{}", server.trim_end_matches('/'), path);

    let mut request = Client::new().request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok((status, None));
    }
    Ok((status, Some(response.json().await?)))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match execute(&args.server, args.command).await {
        Ok((status, body)) => {
            match body {
                Some(body) => match serde_json::to_string_pretty(&body) {
                    Ok(text) => println!("{}", text),
                    Err(_) => println!("{}", body),
                },
                None => println!("{}", status),
            }
            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(2);
        }
    }
}
