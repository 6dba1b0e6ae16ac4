//! Loads the initial snippet corpus from a YAML resource file.
//!
//! Every snippet is linted before anything is written; one invalid snippet
//! aborts the whole run so a partial corpus never lands.

use anyhow::{bail, Context};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use sv_core::models::Post;
use sv_core::traits::{SnipRepo, SnippetLinter};
use sv_db_sqlite::SqliteSnipRepo;
use sv_lint_python::PythonLinter;
use uuid::Uuid;

#[derive(Deserialize)]
struct SeedFile {
    posts: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "resources/posts.yaml".into());
    let raw =
        std::fs::read_to_string(&path).with_context(|| format!("could not read {path}"))?;
    let seed: SeedFile = serde_yaml::from_str(&raw).context("malformed seed file")?;

    let linter = PythonLinter;
    for (title, code) in &seed.posts {
        if let Some(err) = linter.lint(code).first() {
            bail!(
                "invalid code in '{}': line {}: {}",
                title,
                err.line,
                err.reason
            );
        }
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:snipvote.db".into());
    let repo = SqliteSnipRepo::new(&database_url).await?;

    let mut saved = 0usize;
    for (title, code) in seed.posts {
        repo.create_post(Post {
            id: Uuid::now_v7(),
            title,
            code,
            note: None,
            submitter_id: None,
            created_at: Utc::now(),
        })
        .await?;
        saved += 1;
    }
    println!("Successfully saved {saved} posts");
    Ok(())
}
