use crate::{
    data::{
        PersistenceContext,
        student::{NewStudent, Student},
    },
    error::{ConcurrentUpdateSnafu, RollcallResult},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, Student>,
}

/// Students table kept in memory, counting how many contexts have saved changes into it.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    table: Arc<Mutex<Table>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryDatabase {
    pub fn context(&self) -> MemoryContext {
        MemoryContext {
            working: self.table.lock().unwrap().clone(),
            dirty: false,
            database: self.clone(),
        }
    }

    pub fn rows(&self) -> Vec<Student> {
        self.table.lock().unwrap().rows.values().cloned().collect()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    /// Simulates another request editing a student.
    pub fn touch(&self, id: i32) {
        if let Some(student) = self.table.lock().unwrap().rows.get_mut(&id) {
            student.row_version += 1;
        }
    }
}

pub struct MemoryContext {
    database: MemoryDatabase,
    working: Table,
    dirty: bool,
}

impl PersistenceContext for MemoryContext {
    async fn list_students(&mut self) -> RollcallResult<Vec<Student>> {
        Ok(self.working.rows.values().cloned().collect())
    }

    async fn find_student(&mut self, id: i32) -> RollcallResult<Option<Student>> {
        Ok(self.working.rows.get(&id).cloned())
    }

    async fn student_exists(&mut self, id: i32) -> RollcallResult<bool> {
        Ok(self.working.rows.contains_key(&id))
    }

    async fn add_student(&mut self, to_be_added: NewStudent) -> RollcallResult<i32> {
        self.working.next_id += 1;
        let id = self.working.next_id;
        self.working.rows.insert(id, to_be_added.into_student(id, 1));
        self.dirty = true;
        Ok(id)
    }

    async fn update_student(&mut self, student: &Student) -> RollcallResult<()> {
        let Some(stored) = self
            .working
            .rows
            .get_mut(&student.id)
            .filter(|stored| stored.row_version == student.row_version)
        else {
            return ConcurrentUpdateSnafu { id: student.id }.fail();
        };

        *stored = Student {
            row_version: student.row_version + 1,
            ..student.clone()
        };
        self.dirty = true;
        Ok(())
    }

    async fn remove_student(&mut self, id: i32) -> RollcallResult<bool> {
        let removed = self.working.rows.remove(&id).is_some();
        self.dirty |= removed;
        Ok(removed)
    }

    async fn save(self) -> RollcallResult<()> {
        if self.dirty {
            *self.database.table.lock().unwrap() = self.working;
            *self.database.saves.lock().unwrap() += 1;
        }
        Ok(())
    }
}
