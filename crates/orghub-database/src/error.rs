//! Mapping of sqlx errors into [`AppError`].

use orghub_core::error::{AppError, ErrorKind};

use crate::store::conflict;

/// Convert a sqlx error raised by `operation` into an application error.
///
/// Unique violations become [`ErrorKind::Conflict`] with the message of the
/// violated constraint. Everything else is a database error.
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::conflict(conflict_message(db_err.constraint()));
        }
    }
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return AppError::with_source(
            ErrorKind::Timeout,
            format!("{operation}: timed out waiting for a connection"),
            err,
        );
    }
    AppError::with_source(
        ErrorKind::Database,
        format!("{operation} failed: {err}"),
        err,
    )
}

fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("companies_name_key") => conflict::COMPANY_NAME,
        Some("positions_company_id_rank_key") => conflict::POSITION_RANK,
        Some("department_positions_department_id_rank_key") => conflict::DEPARTMENT_POSITION_RANK,
        Some("employee_company_user_id_company_id_key") => conflict::EMPLOYEE,
        Some("employee_department_employee_id_department_id_key") => conflict::DEPARTMENT_MEMBER,
        _ => conflict::PRIMARY_KEY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_names_map_to_messages() {
        assert_eq!(
            conflict_message(Some("companies_name_key")),
            conflict::COMPANY_NAME
        );
        assert_eq!(
            conflict_message(Some("department_positions_department_id_rank_key")),
            conflict::DEPARTMENT_POSITION_RANK
        );
        assert_eq!(conflict_message(None), conflict::PRIMARY_KEY);
    }

    #[test]
    fn test_non_database_errors_are_infrastructure() {
        let err = map_sqlx_error("find_company", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(err.message.starts_with("find_company failed"));
    }
}
