//! Institute, batch and student rows.

use classpulse_core::render::InstituteTemplates;
use classpulse_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `institutes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Institute {
    pub id: DbId,
    pub name: String,
    pub notifications_enabled: bool,
    pub notify_for_present: bool,
    pub absent_template: Option<String>,
    pub late_template: Option<String>,
    pub present_template: Option<String>,
}

impl Institute {
    /// The institute's long-form message overrides.
    pub fn templates(&self) -> InstituteTemplates {
        InstituteTemplates {
            absent: self.absent_template.clone(),
            late: self.late_template.clone(),
            present: self.present_template.clone(),
        }
    }
}

/// A row from the `batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub institute_id: DbId,
    pub name: String,
}

/// A row from the `students` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: DbId,
    pub institute_id: DbId,
    pub batch_id: DbId,
    pub name: String,
    pub parent_phone: Option<String>,
}

