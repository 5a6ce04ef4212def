use crate::state::RollcallState;
use axum::{Router, routing::get};
use index::{fallback, get_index_route};
use student_form::{get_create_student, get_edit_student, post_create_student, post_edit_student};
use students::{get_delete_student, get_student_details, get_students, post_delete_student};

pub mod index;
pub mod student_form;
pub mod students;

pub fn router() -> Router<RollcallState> {
    Router::new()
        .route("/", get(get_index_route))
        .route("/students", get(get_students))
        .route(
            "/students/create",
            get(get_create_student).post(post_create_student),
        )
        .route(
            "/students/edit/{id}",
            get(get_edit_student).post(post_edit_student),
        )
        .route("/students/details/{id}", get(get_student_details))
        .route(
            "/students/delete/{id}",
            get(get_delete_student).post(post_delete_student),
        )
        .fallback(fallback)
}
