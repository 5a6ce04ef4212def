use crate::{
    data::{
        PersistenceContext,
        student::{StudentFieldErrors, StudentForm},
    },
    error::{
        ConcurrentUpdateSnafu, InvalidRowVersionSnafu, InvalidStudentIdSnafu,
        MissingStudentSnafu, RollcallError, RollcallResult, StudentIdMismatchSnafu,
    },
    maud_conveniences::{detail_row, hidden_input, render_table, title},
    session::{issue_csrf_token, verify_csrf_token},
    state::RollcallState,
};
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use tower_sessions::Session;

/// What became of a submitted student form.
#[derive(Debug)]
pub enum Submission {
    Saved(i32),
    Invalid {
        form: StudentForm,
        errors: StudentFieldErrors,
    },
}

pub fn parse_student_id(raw: &str) -> RollcallResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .context(InvalidStudentIdSnafu { raw })
}

pub async fn create_student<C: PersistenceContext>(
    mut ctx: C,
    form: StudentForm,
) -> RollcallResult<Submission> {
    let new_student = match form.validate() {
        Ok(new_student) => new_student,
        Err(errors) => return Ok(Submission::Invalid { form, errors }),
    };

    let id = ctx.add_student(new_student).await?;
    ctx.save().await?;
    info!(id, "Created student");

    Ok(Submission::Saved(id))
}

pub async fn edit_student<C: PersistenceContext>(
    mut ctx: C,
    path_id: i32,
    submitted_id: &str,
    row_version: &str,
    form: StudentForm,
) -> RollcallResult<Submission> {
    snafu::ensure!(
        submitted_id.trim().parse::<i32>().is_ok_and(|id| id == path_id),
        StudentIdMismatchSnafu {
            path: path_id,
            submitted: submitted_id,
        }
    );
    let row_version = match row_version.trim().parse::<i32>() {
        Ok(row_version) => row_version,
        Err(source) => {
            // a missing row outranks a bad hidden field
            if !ctx.student_exists(path_id).await? {
                return MissingStudentSnafu { id: path_id }.fail();
            }
            return Err(source).context(InvalidRowVersionSnafu { raw: row_version });
        }
    };

    let student = match form.validate() {
        Ok(new_student) => new_student.into_student(path_id, row_version),
        Err(errors) => return Ok(Submission::Invalid { form, errors }),
    };

    match ctx.update_student(&student).await {
        Ok(()) => {}
        Err(RollcallError::ConcurrentUpdate { id }) => {
            if !ctx.student_exists(id).await? {
                return MissingStudentSnafu { id }.fail();
            }
            return ConcurrentUpdateSnafu { id }.fail();
        }
        Err(e) => return Err(e),
    }
    ctx.save().await?;
    info!(id = path_id, "Updated student");

    Ok(Submission::Saved(path_id))
}

pub async fn delete_student<C: PersistenceContext>(mut ctx: C, id: i32) -> RollcallResult<()> {
    if ctx.remove_student(id).await? {
        ctx.save().await?;
        info!(id, "Deleted student");
    } else {
        debug!(id, "Asked to delete a student that doesn't exist");
    }
    Ok(())
}

pub async fn get_students(State(state): State<RollcallState>) -> RollcallResult<Markup> {
    let students = state.persistence_context().await?.list_students().await?;

    let rows = students
        .into_iter()
        .map(|student| {
            [
                html! {
                    a class="hover:text-blue-300 underline" href={"/students/details/" (student.id)} {
                        (student)
                    }
                },
                html! {(student.date_of_birth_display())},
                html! {(student.email.as_str())},
                html! {
                    div class="flex flex-row space-x-4" {
                        a class="hover:text-blue-300 underline" href={"/students/edit/" (student.id)} {"Edit"}
                        a class="hover:text-red-300 underline" href={"/students/delete/" (student.id)} {"Delete"}
                    }
                },
            ]
        })
        .collect::<Vec<_>>();

    Ok(state.render(
        "Students",
        html! {
            div class="bg-gray-800 p-8 rounded shadow-md w-full flex flex-col space-y-4" {
                @if rows.is_empty() {
                    (title("All Students"))
                    p class="text-gray-400 italic" {"No students yet."}
                } @else {
                    (render_table("All Students", ["Name", "Date of Birth", "Email", ""], rows))
                }
                div {
                    a href="/students/create" class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" {
                        "Add new Student"
                    }
                }
            }
        },
    ))
}

pub async fn get_student_details(
    State(state): State<RollcallState>,
    Path(raw_id): Path<String>,
) -> RollcallResult<Markup> {
    let id = parse_student_id(&raw_id)?;
    let student = state
        .persistence_context()
        .await?
        .find_student(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(state.render(
        "Student Details",
        html! {
            div class="bg-gray-800 p-6 md:p-8 rounded-lg shadow-xl" {
                (title(&student))
                div class="grid grid-cols-1 md:grid-cols-2 gap-6 mb-8" {
                    (detail_row("First Name:", student.first_name.as_str()))
                    (detail_row("Last Name:", student.last_name.as_str()))
                    (detail_row("Date of Birth:", student.date_of_birth.to_string()))
                    (detail_row("Email:", student.email.as_str()))
                }
                div class="flex flex-row space-x-4" {
                    a href={"/students/edit/" (student.id)} class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" {"Edit"}
                    a href="/students" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Back to List"}
                }
            }
        },
    ))
}

pub async fn get_delete_student(
    State(state): State<RollcallState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> RollcallResult<Markup> {
    let id = parse_student_id(&raw_id)?;
    let student = state
        .persistence_context()
        .await?
        .find_student(id)
        .await?
        .context(MissingStudentSnafu { id })?;
    let csrf_token = issue_csrf_token(&session).await?;

    Ok(state.render(
        "Delete Student",
        html! {
            div class="bg-gray-800 p-6 md:p-8 rounded-lg shadow-xl" {
                (title("Are you sure you want to delete this student?"))
                div class="grid grid-cols-1 md:grid-cols-2 gap-6 mb-8" {
                    (detail_row("Name:", &student))
                    (detail_row("Date of Birth:", student.date_of_birth.to_string()))
                    (detail_row("Email:", student.email.as_str()))
                }
                form method="post" action={"/students/delete/" (student.id)} class="flex flex-row space-x-4" {
                    (hidden_input("csrf_token", csrf_token))
                    button type="submit" class="bg-red-600 hover:bg-red-800 font-bold py-2 px-4 rounded" {"Delete"}
                    a href="/students" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Back to List"}
                }
            }
        },
    ))
}

#[derive(Deserialize)]
pub struct DeleteStudentSubmission {
    #[serde(default)]
    csrf_token: String,
}

pub async fn post_delete_student(
    State(state): State<RollcallState>,
    session: Session,
    Path(raw_id): Path<String>,
    Form(DeleteStudentSubmission { csrf_token }): Form<DeleteStudentSubmission>,
) -> RollcallResult<Redirect> {
    verify_csrf_token(&session, &csrf_token).await?;

    if let Ok(id) = parse_student_id(&raw_id) {
        delete_student(state.persistence_context().await?, id).await?;
    }

    Ok(Redirect::to("/students"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryDatabase;

    fn ada() -> StudentForm {
        StudentForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: "1815-12-10T00:00:00+02:00".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    async fn db_with_ada() -> (MemoryDatabase, i32) {
        let db = MemoryDatabase::default();
        let Submission::Saved(id) = create_student(db.context(), ada()).await.unwrap() else {
            panic!("ada should be valid");
        };
        (db, id)
    }

    #[tokio::test]
    async fn create_normalises_date_of_birth() {
        let (db, id) = db_with_ada().await;

        let student = db.context().find_student(id).await.unwrap().unwrap();
        assert_eq!(student.date_of_birth.to_string(), "1815-12-09T22:00:00Z");
        assert_eq!(student.first_name, "Ada");

        let listed = db.context().list_students().await.unwrap();
        assert_eq!(listed, vec![student]);
        assert_eq!(db.saves(), 1);
    }

    #[tokio::test]
    async fn invalid_create_keeps_submitted_values() {
        let db = MemoryDatabase::default();
        let form = StudentForm {
            email: "ada at example dot com".to_string(),
            ..ada()
        };

        let Submission::Invalid { form: kept, errors } =
            create_student(db.context(), form.clone()).await.unwrap()
        else {
            panic!("email should have been rejected");
        };
        assert_eq!(kept, form);
        assert_eq!(errors, StudentFieldErrors::INVALID_EMAIL);
        assert!(db.rows().is_empty());
        assert_eq!(db.saves(), 0);
    }

    #[tokio::test]
    async fn edit_updates_and_bumps_row_version() {
        let (db, id) = db_with_ada().await;
        let form = StudentForm {
            last_name: "King".to_string(),
            date_of_birth: "1815-12-10".to_string(),
            ..ada()
        };

        let outcome = edit_student(db.context(), id, &id.to_string(), "1", form)
            .await
            .unwrap();
        assert!(matches!(outcome, Submission::Saved(saved) if saved == id));

        let student = db.context().find_student(id).await.unwrap().unwrap();
        assert_eq!(student.last_name, "King");
        assert_eq!(student.date_of_birth.to_string(), "1815-12-10T00:00:00Z");
        assert_eq!(student.row_version, 2);
    }

    #[tokio::test]
    async fn edit_with_mismatched_id_is_not_found() {
        let (db, id) = db_with_ada().await;

        for submitted in [(id + 1).to_string(), String::new(), "seven".to_string()] {
            let result = edit_student(db.context(), id, &submitted, "1", ada()).await;
            let error = result.unwrap_err();
            assert!(matches!(error, RollcallError::StudentIdMismatch { .. }));
            assert_eq!(error.status_code(), axum::http::StatusCode::NOT_FOUND);
        }
        assert_eq!(db.saves(), 1);
    }

    #[tokio::test]
    async fn edit_of_missing_student_is_not_found() {
        let (db, _) = db_with_ada().await;

        let result = edit_student(db.context(), 99, "99", "1", ada()).await;
        assert!(matches!(result, Err(RollcallError::MissingStudent { id: 99 })));
        assert_eq!(db.saves(), 1);
        assert_eq!(db.rows().len(), 1);
    }

    #[tokio::test]
    async fn edit_with_stale_version_is_a_conflict() {
        let (db, id) = db_with_ada().await;
        db.touch(id);

        let form = StudentForm {
            first_name: "Augusta".to_string(),
            ..ada()
        };
        let result = edit_student(db.context(), id, &id.to_string(), "1", form).await;
        assert!(matches!(result, Err(RollcallError::ConcurrentUpdate { id: conflicted }) if conflicted == id));
        assert_eq!(db.rows()[0].first_name, "Ada");
        assert_eq!(db.saves(), 1);
    }

    #[tokio::test]
    async fn invalid_edit_is_redisplayed_without_a_write() {
        let (db, id) = db_with_ada().await;
        let form = StudentForm {
            first_name: String::new(),
            ..ada()
        };

        let outcome = edit_student(db.context(), id, &id.to_string(), "1", form)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Submission::Invalid { errors, .. } if errors == StudentFieldErrors::EMPTY_FIRST_NAME
        ));
        assert_eq!(db.saves(), 1);
    }

    #[tokio::test]
    async fn malformed_row_version_is_bad_input() {
        let (db, id) = db_with_ada().await;
        let result = edit_student(db.context(), id, &id.to_string(), "v1", ada()).await;
        assert!(matches!(result, Err(RollcallError::InvalidRowVersion { .. })));
    }

    #[tokio::test]
    async fn malformed_row_version_on_missing_student_is_not_found() {
        let (db, _) = db_with_ada().await;

        for row_version in ["", "v1"] {
            let error = edit_student(db.context(), 99, "99", row_version, ada())
                .await
                .unwrap_err();
            assert!(matches!(error, RollcallError::MissingStudent { id: 99 }));
            assert_eq!(error.status_code(), axum::http::StatusCode::NOT_FOUND);
        }
        assert_eq!(db.saves(), 1);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_row() {
        let (db, ada_id) = db_with_ada().await;
        let grace = StudentForm {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            ..ada()
        };
        create_student(db.context(), grace).await.unwrap();
        assert_eq!(db.rows().len(), 2);

        delete_student(db.context(), ada_id).await.unwrap();

        let remaining = db.rows();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].first_name, "Grace");
    }

    #[tokio::test]
    async fn deleting_missing_student_changes_nothing() {
        let (db, _) = db_with_ada().await;

        delete_student(db.context(), 42).await.unwrap();

        assert_eq!(db.rows().len(), 1);
        assert_eq!(db.saves(), 1);
    }

    #[test]
    fn student_ids_must_be_integers() {
        assert_eq!(parse_student_id(" 12 ").unwrap(), 12);
        assert!(matches!(
            parse_student_id("twelve"),
            Err(RollcallError::InvalidStudentId { .. })
        ));
    }
}
