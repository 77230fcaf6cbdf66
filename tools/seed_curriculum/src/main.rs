use std::env;
use std::error::Error;

use dotenvy::dotenv;
use funbox_learn::db::{self, repository};
use funbox_learn::meeting::completable;
use funbox_learn::models::{Meeting, MeetingContent, Module};
use funbox_learn::scoring;
use funbox_learn::serial::Button;
use serde::Deserialize;

fn is_dry_run() -> bool {
    !env::args().any(|a| a == "--apply")
}

#[derive(Debug, Deserialize)]
struct Curriculum {
    modules: Vec<Module>,
    #[serde(default)]
    meetings: Vec<Meeting>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let path = env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .unwrap_or_else(|| "curriculum.json".to_string());
    let raw = std::fs::read_to_string(&path)?;
    let curriculum: Curriculum = serde_json::from_str(&raw)?;

    check(&curriculum)?;

    let dry_run = is_dry_run();
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://funbox.db".to_string());

    if dry_run {
        for module in &curriculum.modules {
            println!("[DRY RUN] Would upsert module {} ({})", module.id, module.title);
        }
        for meeting in &curriculum.meetings {
            println!(
                "[DRY RUN] Would upsert meeting {} -> module {} #{} ({} questions, max {} points)",
                meeting.id,
                meeting.module_id,
                meeting.order,
                meeting.content.quiz.len(),
                scoring::get_meeting_max_points(meeting.module_id, meeting.order),
            );
        }
    } else {
        let pool = db::create_db_pool(&database_url).await?;

        for module in &curriculum.modules {
            repository::upsert_module(&pool, module).await?;
            println!("Upserted module {} ({})", module.id, module.title);
        }
        for meeting in &curriculum.meetings {
            repository::upsert_meeting(&pool, meeting).await?;
            println!("Upserted meeting {} ({})", meeting.id, meeting.title);
        }
    }

    println!(
        "Modules: {} / Meetings: {}",
        curriculum.modules.len(),
        curriculum.meetings.len()
    );

    Ok(())
}

/// Rejects meetings that point at a module not in the file, and content the
/// FunBox cannot finish: quiz answers or activity picks outside the option
/// list or past the four answer buttons.
fn check(curriculum: &Curriculum) -> Result<(), Box<dyn Error>> {
    for module in &curriculum.modules {
        if let Some(content) = &module.content {
            check_content(&format!("module {}", module.id), content)?;
        }
    }
    for meeting in &curriculum.meetings {
        if !curriculum.modules.iter().any(|m| m.id == meeting.module_id) {
            return Err(format!(
                "meeting {} refers to unknown module {}",
                meeting.id, meeting.module_id
            )
            .into());
        }
        check_content(&format!("meeting {}", meeting.id), &meeting.content)?;
    }
    Ok(())
}

fn check_content(owner: &str, content: &MeetingContent) -> Result<(), Box<dyn Error>> {
    for (i, question) in content.quiz.iter().enumerate() {
        let reachable = question.options.len().min(Button::ANSWER_COUNT);
        if question.correct_answer >= reachable {
            return Err(format!(
                "{} question {} has answer {} but only {} options and {} answer buttons",
                owner,
                i + 1,
                question.correct_answer,
                question.options.len(),
                Button::ANSWER_COUNT
            )
            .into());
        }
    }
    for (i, activity) in content.activities.iter().enumerate() {
        completable(activity).map_err(|reason| {
            format!("{} activity {} ({}): {}", owner, i + 1, activity.kind(), reason)
        })?;
    }
    Ok(())
}
