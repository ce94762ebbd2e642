//! Writes a small demo dataset to the data file so a fresh checkout
//! has something to browse.

use anyhow::Result;
use chrono::Utc;
use common::document::{Document, Memorial, Post, User};
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::crypto;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = api::AppConfig::from_env();

    let now = Utc::now();
    let mut doc = Document::default();

    doc.memorials.push(Memorial {
        id: 1,
        name: "John Doe".to_string(),
        note: "Beloved father and grandfather. 1945-2023.".to_string(),
        owner: None,
        private: false,
        tags: vec![],
        created_at: now,
        updated_at: None,
    });
    doc.memorials.push(Memorial {
        id: 2,
        name: "Jane Smith".to_string(),
        note: "Loving mother, devoted teacher. 1950-2024.".to_string(),
        owner: None,
        private: false,
        tags: vec![],
        created_at: now,
        updated_at: None,
    });

    doc.users.push(User {
        id: 1,
        username: "demo".to_string(),
        password: crypto::hash_password("demo"),
        created_at: now,
        private: false,
        suspended: false,
        admin: false,
    });

    doc.posts.push(Post {
        id: 1,
        user_id: 1,
        title: "In Loving Memory".to_string(),
        body: "A tribute to a wonderful life.".to_string(),
        video_url: String::new(),
        tags: vec!["memory".to_string(), "tribute".to_string()],
        mentions: vec![],
        created_at: now,
    });

    let store = common::DocumentStore::json_only(&config.data_file);
    store
        .update(|existing| {
            *existing = doc;
            Ok::<_, common::StoreError>(())
        })
        .await??;

    info!("Seeded {}", config.data_file.display());
    info!("- 2 sample records");
    info!("- 1 demo user (username: demo, password: demo)");
    info!("- 1 sample post");

    Ok(())
}
