use common::Role;
use sea_orm::DbErr;

use super::directory::ProfileDirectory;

/// Who is asking. Identity is taken as given by the token service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

/// Student owners whose records a caller may see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// No owner filter.
    Unrestricted,
    /// Exactly these student ids. May be empty.
    Owners(Vec<i32>),
}

impl Scope {
    pub fn contains(&self, student_id: i32) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Owners(owners) => owners.contains(&student_id),
        }
    }

    /// True when nothing can match, so queries can be skipped.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Owners(owners) if owners.is_empty())
    }

    /// Owner filter to push down to a store. `None` means no restriction.
    pub fn owner_filter(&self) -> Option<&[i32]> {
        match self {
            Self::Unrestricted => None,
            Self::Owners(owners) => Some(owners),
        }
    }
}

/// Compute the caller's scope. A missing profile yields an empty scope.
pub async fn resolve(directory: &dyn ProfileDirectory, caller: &Caller) -> Result<Scope, DbErr> {
    match caller.role {
        Role::Student => Ok(Scope::Owners(
            directory
                .find_student_by_user(caller.user_id)
                .await?
                .map(|s| vec![s.id])
                .unwrap_or_default(),
        )),
        Role::Advisor => match directory.find_lecturer_by_user(caller.user_id).await? {
            Some(lecturer) => Ok(Scope::Owners(
                directory.find_students_by_advisor(lecturer.id).await?,
            )),
            None => Ok(Scope::Owners(Vec::new())),
        },
        Role::Admin => Ok(Scope::Unrestricted),
    }
}
