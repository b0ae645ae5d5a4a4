use anyhow::{anyhow, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db;
use crate::error::IssueError;
use crate::registry;
use crate::schema::{AdminProfile, NotificationSettings, PrivacySettings, Role, User};

/// Profile data collected at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub admin: Option<AdminProfile>,
    pub photo_url: Option<String>,
}

/// Stores a new profile. The role is fixed here; admin-only fields are kept
/// only when the role is admin.
pub fn register(conn: &Connection, new_user: NewUser) -> Result<User> {
    if db::get_user(conn, &new_user.uid)?.is_some() {
        return Err(anyhow!("User {} already exists", new_user.uid));
    }

    let admin = match new_user.role {
        Role::Admin => {
            let admin = new_user.admin.ok_or(IssueError::AdminWithoutMunicipalCode)?;
            if admin.municipal_code.is_empty() {
                return Err(IssueError::AdminWithoutMunicipalCode.into());
            }
            Some(admin)
        }
        Role::Citizen => None,
    };

    let now = crate::timestamp_now();
    let selected_municipal_corp = admin
        .as_ref()
        .and_then(|admin| registry::municipal_name_by_code(&admin.municipal_code))
        .map(str::to_string);
    let user = User {
        uid: new_user.uid,
        email: new_user.email,
        display_name: new_user.display_name,
        phone_number: new_user.phone_number,
        role: new_user.role,
        municipal_code: admin.as_ref().map(|admin| admin.municipal_code.clone()),
        designation: admin.as_ref().and_then(|admin| admin.designation.clone()),
        department: admin.as_ref().and_then(|admin| admin.department.clone()),
        area_name: admin.as_ref().and_then(|admin| admin.area_name.clone()),
        photo_url: new_user.photo_url,
        selected_municipal_corp,
        notification_settings: NotificationSettings::default(),
        privacy_settings: PrivacySettings::default(),
        created_at: now.clone(),
        updated_at: now,
    };
    db::upsert_user(conn, &user)?;
    info!(uid = %user.uid, role = ?user.role, "user registered");
    Ok(user)
}

/// Unknown users are treated as citizens with no stored profile.
pub fn role_of(conn: &Connection, uid: &str) -> Result<Role> {
    Ok(db::get_user(conn, uid)?
        .map(|user| user.role)
        .unwrap_or(Role::Citizen))
}

pub fn update_notification_settings(
    conn: &Connection,
    uid: &str,
    settings: NotificationSettings,
) -> Result<User> {
    update(conn, uid, |user| user.notification_settings = settings)
}

pub fn update_privacy_settings(
    conn: &Connection,
    uid: &str,
    settings: PrivacySettings,
) -> Result<User> {
    update(conn, uid, |user| user.privacy_settings = settings)
}

/// Accepts a corporation name or its six-digit code.
pub fn select_municipal_corp(conn: &Connection, uid: &str, corp: &str) -> Result<User> {
    let name = registry::municipal_name_by_code(corp)
        .or_else(|| registry::corporation_by_name(corp).map(|entry| entry.name))
        .ok_or_else(|| anyhow!("Unknown municipal corporation: {corp}"))?;
    update(conn, uid, |user| {
        user.selected_municipal_corp = Some(name.to_string())
    })
}

fn update(conn: &Connection, uid: &str, apply: impl FnOnce(&mut User)) -> Result<User> {
    let mut user = db::get_user(conn, uid)?.ok_or_else(|| anyhow!("User not found: {uid}"))?;
    apply(&mut user);
    user.updated_at = crate::timestamp_now();
    db::upsert_user(conn, &user)?;
    Ok(user)
}
