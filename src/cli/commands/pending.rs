use crate::config::Config;
use crate::db::Store;
use crate::domain::RequestStatus;

pub async fn cmd_pending(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let returns = store
        .list_return_requests(Some(RequestStatus::Pending), None)
        .await?;
    let transfers = store
        .list_transfer_requests(Some(RequestStatus::Pending), None)
        .await?;

    println!("Pending Returns ({})", returns.len());
    println!("{:-<70}", "");
    for request in &returns {
        println!(
            "#{} {} from {} ({}) on {}",
            request.id,
            request.item_name,
            request.student_name,
            request.student_id,
            request.request_date
        );
    }

    println!();
    println!("Pending Transfers ({})", transfers.len());
    println!("{:-<70}", "");
    for transfer in &transfers {
        println!(
            "#{} {}: {} -> {} on {}",
            transfer.id,
            transfer.item_name,
            transfer.from_user_name,
            transfer.to_user_name,
            transfer.request_date
        );
    }

    Ok(())
}
