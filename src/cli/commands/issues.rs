use crate::config::Config;
use crate::db::{IssueFilter, Store};
use crate::domain::IssueStatus;

pub async fn cmd_issues(config: &Config, active: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let filter = IssueFilter {
        status: active.then_some(IssueStatus::Issued),
        ..IssueFilter::default()
    };
    let issues = store.list_issues(&filter).await?;

    if issues.is_empty() {
        println!("No issue records.");
        return Ok(());
    }

    println!("Issues ({} total)", issues.len());
    println!("{:-<70}", "");

    for issue in issues {
        println!(
            "#{} {} -> {} ({})",
            issue.id, issue.item_name, issue.student_name, issue.student_id
        );
        match &issue.return_date {
            Some(returned) => println!(
                "  Issued: {} | Returned: {} | Room: {}",
                issue.issue_date, returned, issue.room_number
            ),
            None => println!(
                "  Issued: {} | Status: {} | Room: {}",
                issue.issue_date, issue.status, issue.room_number
            ),
        }
    }

    Ok(())
}
