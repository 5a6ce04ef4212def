use bitflags::bitflags;
use email_address::EmailAddress;
use jiff::{Timestamp, civil, tz::TimeZone};
use maud::{Markup, Render, html};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Timestamp,
    pub email: EmailAddress,
    pub row_version: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Timestamp,
    pub email: EmailAddress,
}

impl NewStudent {
    pub fn into_student(self, id: i32, row_version: i32) -> Student {
        let Self {
            first_name,
            last_name,
            date_of_birth,
            email,
        } = self;

        Student {
            id,
            first_name,
            last_name,
            date_of_birth,
            email,
            row_version,
        }
    }
}

impl Student {
    /// RFC 3339 in UTC, which [`parse_date_of_birth`] reads back to the same instant.
    pub fn date_of_birth_for_input(&self) -> String {
        self.date_of_birth.to_string()
    }

    pub fn date_of_birth_display(&self) -> String {
        self.date_of_birth.strftime("%d %B %Y").to_string()
    }
}

impl Render for Student {
    fn render(&self) -> Markup {
        html! {
            (self.first_name) " " (self.last_name)
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentFieldErrors: u8 {
        const EMPTY_FIRST_NAME =      0b0000_0001;
        const EMPTY_LAST_NAME =       0b0000_0010;
        const EMPTY_DATE_OF_BIRTH =   0b0000_0100;
        const INVALID_DATE_OF_BIRTH = 0b0000_1000;
        const EMPTY_EMAIL =           0b0001_0000;
        const INVALID_EMAIL =         0b0010_0000;
    }
}

impl StudentFieldErrors {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_FIRST_NAME => Some("First name is required"),
            Self::EMPTY_LAST_NAME => Some("Last name is required"),
            Self::EMPTY_DATE_OF_BIRTH => Some("Date of birth is required"),
            Self::INVALID_DATE_OF_BIRTH => Some("Date of birth must be a date, optionally with a time and UTC offset"),
            Self::EMPTY_EMAIL => Some("Email is required"),
            Self::INVALID_EMAIL => Some("Email must be a valid email address"),
            _ => None,
        })
    }
}

/// Raw student fields as submitted by a browser.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub email: String,
}

impl From<&Student> for StudentForm {
    fn from(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            date_of_birth: student.date_of_birth_for_input(),
            email: student.email.to_string(),
        }
    }
}

impl StudentForm {
    pub fn validate(&self) -> Result<NewStudent, StudentFieldErrors> {
        let mut errors = StudentFieldErrors::empty();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors |= StudentFieldErrors::EMPTY_FIRST_NAME;
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors |= StudentFieldErrors::EMPTY_LAST_NAME;
        }

        let date_of_birth = if self.date_of_birth.trim().is_empty() {
            errors |= StudentFieldErrors::EMPTY_DATE_OF_BIRTH;
            None
        } else {
            let parsed = parse_date_of_birth(&self.date_of_birth);
            if parsed.is_none() {
                errors |= StudentFieldErrors::INVALID_DATE_OF_BIRTH;
            }
            parsed
        };

        let email = self.email.trim();
        let email = if email.is_empty() {
            errors |= StudentFieldErrors::EMPTY_EMAIL;
            None
        } else {
            let parsed = EmailAddress::from_str(email).ok();
            if parsed.is_none() {
                errors |= StudentFieldErrors::INVALID_EMAIL;
            }
            parsed
        };

        match (date_of_birth, email) {
            (Some(date_of_birth), Some(email)) if errors.is_empty() => Ok(NewStudent {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                date_of_birth,
                email,
            }),
            _ => Err(errors),
        }
    }
}

/// Parses a date of birth into an instant in UTC.
///
/// Inputs carrying an offset are converted to UTC; wall-clock inputs without one
/// (as sent by `datetime-local` and `date` inputs) are taken to already be UTC.
pub fn parse_date_of_birth(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();

    if let Ok(timestamp) = raw.parse::<Timestamp>() {
        return Some(timestamp);
    }
    if let Ok(datetime) = raw.parse::<civil::DateTime>() {
        return datetime
            .to_zoned(TimeZone::UTC)
            .ok()
            .map(|zoned| zoned.timestamp());
    }

    raw.parse::<civil::Date>()
        .ok()
        .and_then(|date| date.to_zoned(TimeZone::UTC).ok())
        .map(|zoned| zoned.timestamp())
}
