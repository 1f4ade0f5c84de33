//! Display gate for the manage UI.
//!
//! This compares display names only; it is not proof of ownership, and
//! real enforcement belongs to the storage backend.

use crate::error::{AppError, Result};
use crate::traits::AuthUser;

pub fn can_manage(user: Option<&AuthUser>, page_owner: &str, super_admins: &[String]) -> bool {
    match user {
        Some(user) => user.display_name == page_owner || super_admins.iter().any(|a| *a == user.display_name),
        None => false,
    }
}

pub fn ensure_can_manage(user: Option<&AuthUser>, page_owner: &str, super_admins: &[String]) -> Result<()> {
    if can_manage(user, page_owner, super_admins) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("only {page_owner} can manage this page")))
    }
}
