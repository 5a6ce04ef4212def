use crate::{
    data::student::{NewStudent, Student},
    error::RollcallResult,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod student;

/// One unit of work against the students table.
///
/// Changes made through a context only become visible to others once [`PersistenceContext::save`]
/// is called; dropping a context discards them.
pub trait PersistenceContext: Sized {
    async fn list_students(&mut self) -> RollcallResult<Vec<Student>>;
    async fn find_student(&mut self, id: i32) -> RollcallResult<Option<Student>>;
    async fn student_exists(&mut self, id: i32) -> RollcallResult<bool>;
    async fn add_student(&mut self, to_be_added: NewStudent) -> RollcallResult<i32>;
    /// Fails with [`crate::error::RollcallError::ConcurrentUpdate`] when no row has both the
    /// student's id and row version.
    async fn update_student(&mut self, student: &Student) -> RollcallResult<()>;
    /// Returns whether a row was removed.
    async fn remove_student(&mut self, id: i32) -> RollcallResult<bool>;
    async fn save(self) -> RollcallResult<()>;
}
