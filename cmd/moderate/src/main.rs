//! Admin moderation workflow: list posts awaiting review, approve one
//! (optionally attaching a note), or delete one. Deletion is refused while
//! votes or suggestions reference the post.

use anyhow::{bail, Context};
use chrono::Utc;
use sv_core::traits::SnipRepo;
use sv_db_sqlite::SqliteSnipRepo;
use uuid::Uuid;

const USAGE: &str = "usage: moderate <list | approve <post-id> [note] | delete <post-id>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:snipvote.db".into());
    let repo = SqliteSnipRepo::new(&database_url).await?;

    match args.first().map(String::as_str) {
        Some("list") => {
            let pending = repo.pending_posts().await?;
            if pending.is_empty() {
                println!("no posts awaiting review");
            }
            for post in pending {
                println!(
                    "{}  {}  {}",
                    post.id,
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.title
                );
            }
        }
        Some("approve") => {
            let id = parse_id(args.get(1))?;
            if repo.approve_post(id, Utc::now()).await? {
                println!("approved {id}");
            } else {
                println!("post {id} already approved, skipping...");
            }
            if let Some(note) = args.get(2) {
                repo.set_note(id, note).await?;
                println!("note attached");
            }
        }
        Some("delete") => {
            let id = parse_id(args.get(1))?;
            repo.delete_post(id).await?;
            println!("deleted {id}");
        }
        _ => bail!(USAGE),
    }
    Ok(())
}

fn parse_id(raw: Option<&String>) -> anyhow::Result<Uuid> {
    let raw = raw.context(USAGE)?;
    Uuid::parse_str(raw).with_context(|| format!("'{raw}' is not a post id"))
}
