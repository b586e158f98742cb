use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Seeds the configured first admin so a fresh database has someone who can
/// reach the admin portal. An existing user with that uid is left alone
/// unless its role drifted away from admin.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    let uid = admin.first_admin_uid.trim();
    if uid.is_empty() {
        tracing::warn!("FIRST_ADMIN_UID not configured; skipping admin bootstrap");
        return Ok(());
    }

    let now = primitive_now_utc();

    if let Some(existing) = repositories::users::find_by_id(state.db(), uid).await? {
        if existing.role.parse::<UserRole>() == Ok(UserRole::Admin) {
            tracing::info!(uid, "Default admin already present");
            return Ok(());
        }

        sqlx::query("UPDATE users SET role = $1, class_id = NULL, updated_at = $2 WHERE id = $3")
            .bind(UserRole::Admin.as_str())
            .bind(now)
            .bind(uid)
            .execute(state.db())
            .await?;
        tracing::info!(
            uid,
            previous_role = %existing.role,
            "Restored admin role for default admin"
        );
        return Ok(());
    }

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: uid,
            email: &admin.first_admin_email,
            name: &admin.first_admin_name,
            role: UserRole::Admin,
            class_id: None,
            nis: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(uid, "Created default admin");
    Ok(())
}
