mod handlers;
mod payload;
mod state;

use admission_rag::{DocumentManager, RagEngine, WatsonxClient};
use state::AppState;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let watsonx = match WatsonxClient::from_env() {
        Ok(watsonx) => watsonx,
        Err(e) => {
            eprintln!("Failed to configure watsonx client: {}", e);
            std::process::exit(1);
        }
    };

    let storage_path =
        std::env::var("DOCUMENTS_DIR").unwrap_or_else(|_| "data/documents".to_string());
    let store = match DocumentManager::new(&storage_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open document storage at {}: {}", storage_path, e);
            std::process::exit(1);
        }
    };

    let engine = match RagEngine::new(watsonx, store).await {
        Ok(engine) => {
            println!("RAG engine initialized successfully");
            engine
        }
        Err(e) => {
            eprintln!("Failed to initialize RAG engine: {}", e);
            std::process::exit(1);
        }
    };

    let app = handlers::router(AppState::new(engine));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
