use crate::{
    data::{
        PersistenceContext,
        student::{StudentFieldErrors, StudentForm},
    },
    error::{MissingStudentSnafu, RollcallResult},
    maud_conveniences::{
        errors_list, form_submit_button, hidden_input, simple_form_element, title,
    },
    routes::students::{Submission, create_student, edit_student, parse_student_id},
    session::{issue_csrf_token, verify_csrf_token},
    state::RollcallState,
};
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt;
use tower_sessions::Session;

pub fn student_form_fields(form: &StudentForm) -> Markup {
    html! {
        (simple_form_element("first_name", "First Name", true, None, Some(form.first_name.as_str())))
        (simple_form_element("last_name", "Last Name", true, None, Some(form.last_name.as_str())))
        (simple_form_element("date_of_birth", "Date of Birth (e.g. 2008-03-14 or 2008-03-14T09:30:00+01:00)", true, None, Some(form.date_of_birth.as_str())))
        (simple_form_element("email", "Email", true, Some("email"), Some(form.email.as_str())))
    }
}

fn render_student_form(
    heading: &'static str,
    action: &str,
    csrf_token: &str,
    form: &StudentForm,
    errors: StudentFieldErrors,
    extra_hidden_fields: Markup,
) -> Markup {
    html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-md mx-auto" {
            (title(heading))
            @if !errors.is_empty() {
                (errors_list(None, errors.as_nice_list()))
            }
            form method="post" action=(action) {
                (hidden_input("csrf_token", csrf_token))
                (extra_hidden_fields)
                (student_form_fields(form))
                (form_submit_button(Some("Save")))
            }
            a href="/students" class="text-blue-300 hover:text-blue-500 underline" {"Back to List"}
        }
    }
}

pub async fn get_create_student(
    State(state): State<RollcallState>,
    session: Session,
) -> RollcallResult<Markup> {
    let csrf_token = issue_csrf_token(&session).await?;

    Ok(state.render(
        "Add Student",
        render_student_form(
            "Add New Student",
            "/students/create",
            &csrf_token,
            &StudentForm::default(),
            StudentFieldErrors::empty(),
            html! {},
        ),
    ))
}

#[derive(Deserialize)]
pub struct CreateStudentSubmission {
    #[serde(default)]
    csrf_token: String,
    #[serde(flatten)]
    student: StudentForm,
}

pub async fn post_create_student(
    State(state): State<RollcallState>,
    session: Session,
    Form(CreateStudentSubmission {
        csrf_token,
        student,
    }): Form<CreateStudentSubmission>,
) -> RollcallResult<Response> {
    verify_csrf_token(&session, &csrf_token).await?;

    match create_student(state.persistence_context().await?, student).await? {
        Submission::Saved(_) => Ok(Redirect::to("/students").into_response()),
        Submission::Invalid { form, errors } => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            state.render(
                "Add Student",
                render_student_form(
                    "Add New Student",
                    "/students/create",
                    &csrf_token,
                    &form,
                    errors,
                    html! {},
                ),
            ),
        )
            .into_response()),
    }
}

fn edit_hidden_fields(id: &str, row_version: &str) -> Markup {
    html! {
        (hidden_input("id", id))
        (hidden_input("row_version", row_version))
    }
}

pub async fn get_edit_student(
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
        "Edit Student",
        render_student_form(
            "Edit Student",
            &format!("/students/edit/{id}"),
            &csrf_token,
            &StudentForm::from(&student),
            StudentFieldErrors::empty(),
            edit_hidden_fields(&student.id.to_string(), &student.row_version.to_string()),
        ),
    ))
}

#[derive(Deserialize)]
pub struct EditStudentSubmission {
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    row_version: String,
    #[serde(flatten)]
    student: StudentForm,
}

pub async fn post_edit_student(
    State(state): State<RollcallState>,
    session: Session,
    Path(raw_id): Path<String>,
    Form(EditStudentSubmission {
        csrf_token,
        id: submitted_id,
        row_version,
        student,
    }): Form<EditStudentSubmission>,
) -> RollcallResult<Response> {
    verify_csrf_token(&session, &csrf_token).await?;
    let id = parse_student_id(&raw_id)?;

    match edit_student(
        state.persistence_context().await?,
        id,
        &submitted_id,
        &row_version,
        student,
    )
    .await?
    {
        Submission::Saved(_) => Ok(Redirect::to("/students").into_response()),
        Submission::Invalid { form, errors } => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            state.render(
                "Edit Student",
                render_student_form(
                    "Edit Student",
                    &format!("/students/edit/{id}"),
                    &csrf_token,
                    &form,
                    errors,
                    edit_hidden_fields(&submitted_id, &row_version),
                ),
            ),
        )
            .into_response()),
    }
}
