mod api;
mod controller;
mod health;

use api::ApiClient;
use colored::Colorize;
use controller::{ChatController, ChatMessage, Speaker};
use health::HealthPoller;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let base_url =
        std::env::var("ADMISSION_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let client = Arc::new(ApiClient::new(base_url));

    let poller = HealthPoller::new(Arc::clone(&client));
    let _poll_task = poller.spawn();

    let mut controller = ChatController::new();

    println!("{}", "College Admission Assistant".bold());
    println!("Ask a question, or use /upload <path>, /health, /quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&poller);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/health" => {
                let snapshot = poller.snapshot();
                println!(
                    "watsonx: {} | documents loaded: {}",
                    snapshot.indicator, snapshot.documents_loaded
                );
            }
            _ if line.starts_with("/upload") => {
                let path = line.trim_start_matches("/upload").trim();
                if path.is_empty() {
                    println!("Usage: /upload <path>");
                    continue;
                }
                handle_upload(&client, &mut controller, Path::new(path)).await;
            }
            _ => {
                handle_query(&client, &mut controller, &line).await;
            }
        }
    }

    Ok(())
}

async fn handle_query(client: &ApiClient, controller: &mut ChatController, input: &str) {
    let Some(query) = controller.begin_query(input) else {
        return;
    };

    match client.query(&query).await {
        Ok(reply) => controller.complete_query(&reply),
        Err(e) => {
            log::error!("Query request failed: {}", e);
            controller.fail_query();
        }
    }

    if let Some(message) = controller.transcript().last() {
        print_message(message);
    }
}

async fn handle_upload(client: &ApiClient, controller: &mut ChatController, path: &Path) {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let size = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            println!("{}", format!("Cannot read {}: {}", path.display(), e).red());
            return;
        }
    };

    // Rejected files never generate a request.
    if let Err(rejection) = controller::validate_upload(&filename, size) {
        println!("{}", rejection.to_string().yellow().bold());
        return;
    }

    match client.upload(path).await {
        Ok(reply) => controller.note_upload_success(&filename, &reply),
        Err(e) => {
            log::error!("Upload request failed: {}", e);
            controller.note_upload_failure(&filename);
        }
    }

    if let Some(message) = controller.transcript().last() {
        print_message(message);
    }
}

fn print_prompt(poller: &HealthPoller) {
    let snapshot = poller.snapshot();
    let glyph = match snapshot.indicator {
        "connected" => "●".green(),
        "disconnected" => "●".red(),
        _ => "●".yellow(),
    };
    print!("{} > ", glyph);
    let _ = std::io::stdout().flush();
}

fn print_message(message: &ChatMessage) {
    match message.speaker {
        Speaker::User => println!("{} {}", "you:".dimmed(), message.text),
        Speaker::Assistant => println!("{} {}", "assistant:".cyan().bold(), message.text),
        Speaker::System => println!("{} {}", "system:".yellow(), message.text),
    }
}
