use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // At most one open return request per issue.
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_return_requests_pending_issue \
             ON return_requests(issue_id) WHERE status = 'pending'",
        )
        .await?;

        // At most one open transfer per held issue.
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_transfer_requests_pending_issue \
             ON transfer_requests(issue_id) WHERE status = 'pending'",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_event_registrations_event_user \
             ON event_registrations(event_id, user_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_issues_student_status ON issues(student_id, status)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_notifications_recipient")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_issues_student_status")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_event_registrations_event_user")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_transfer_requests_pending_issue")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_return_requests_pending_issue")
            .await?;

        Ok(())
    }
}
