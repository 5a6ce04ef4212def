use crate::{
    data::{
        PersistenceContext,
        student::{NewStudent, Student},
    },
    error::{
        CommitTransactionSnafu, ConcurrentUpdateSnafu, EmailSnafu, InvalidStoredDateTimeSnafu,
        MakeQuerySnafu, RollcallResult, UnstorableDateTimeSnafu,
    },
};
use email_address::EmailAddress;
use jiff::Timestamp;
use snafu::ResultExt;
use sqlx::{FromRow, Postgres, Transaction};
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(FromRow)]
struct StudentRow {
    id: i32,
    first_name: String,
    last_name: String,
    date_of_birth: OffsetDateTime,
    email: String,
    row_version: i32,
}

impl TryFrom<StudentRow> for Student {
    type Error = crate::error::RollcallError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let date_of_birth = Timestamp::from_nanosecond(row.date_of_birth.unix_timestamp_nanos())
            .context(InvalidStoredDateTimeSnafu {
                stored: row.date_of_birth,
            })?;
        let email = EmailAddress::from_str(&row.email).context(EmailSnafu)?;

        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth,
            email,
            row_version: row.row_version,
        })
    }
}

fn to_offset_date_time(timestamp: Timestamp) -> RollcallResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(timestamp.as_nanosecond())
        .context(UnstorableDateTimeSnafu { timestamp })
}

pub struct PgPersistenceContext {
    transaction: Transaction<'static, Postgres>,
}

impl PgPersistenceContext {
    pub const fn new(transaction: Transaction<'static, Postgres>) -> Self {
        Self { transaction }
    }
}

impl PersistenceContext for PgPersistenceContext {
    async fn list_students(&mut self) -> RollcallResult<Vec<Student>> {
        sqlx::query_as::<_, StudentRow>("SELECT * FROM public.students ORDER BY id")
            .fetch_all(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)?
            .into_iter()
            .map(Student::try_from)
            .collect()
    }

    async fn find_student(&mut self, id: i32) -> RollcallResult<Option<Student>> {
        sqlx::query_as::<_, StudentRow>("SELECT * FROM public.students WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)?
            .map(Student::try_from)
            .transpose()
    }

    async fn student_exists(&mut self, id: i32) -> RollcallResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM public.students WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)
    }

    async fn add_student(&mut self, to_be_added: NewStudent) -> RollcallResult<i32> {
        let NewStudent {
            first_name,
            last_name,
            date_of_birth,
            email,
        } = to_be_added;

        sqlx::query_scalar::<_, i32>("INSERT INTO public.students (first_name, last_name, date_of_birth, email) VALUES ($1, $2, $3, $4) RETURNING id")
            .bind(first_name)
            .bind(last_name)
            .bind(to_offset_date_time(date_of_birth)?)
            .bind(email.as_str())
            .fetch_one(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)
    }

    async fn update_student(&mut self, student: &Student) -> RollcallResult<()> {
        let rows_affected = sqlx::query("UPDATE public.students SET first_name = $3, last_name = $4, date_of_birth = $5, email = $6, row_version = row_version + 1 WHERE id = $1 AND row_version = $2")
            .bind(student.id)
            .bind(student.row_version)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(to_offset_date_time(student.date_of_birth)?)
            .bind(student.email.as_str())
            .execute(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        snafu::ensure!(rows_affected == 1, ConcurrentUpdateSnafu { id: student.id });
        Ok(())
    }

    async fn remove_student(&mut self, id: i32) -> RollcallResult<bool> {
        Ok(sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&mut *self.transaction)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected()
            > 0)
    }

    async fn save(self) -> RollcallResult<()> {
        self.transaction
            .commit()
            .await
            .context(CommitTransactionSnafu)
    }
}
