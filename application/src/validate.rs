use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use error_stack::Report;
use serde::Serialize;

use kernel::KernelError;

use crate::transfer::{CreateAuthorDto, CreateBookDto, UpdateBookDto};

const TITLE_MAX_LENGTH: usize = 100;
const DESCRIPTION_MAX_LENGTH: usize = 500;
const AUTHOR_FIELD_MAX_LENGTH: usize = 50;

/// Business-rule violations keyed by the field they concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Folds violations of a nested representation in under `prefix.field`.
    pub fn nest(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Runs the rules of `value` and turns violations into a
/// [`KernelError::Validation`] report carrying the [`ValidationErrors`].
pub fn ensure_valid<T: Validate>(value: &T) -> error_stack::Result<(), KernelError> {
    value
        .validate()
        .map_err(|errors| Report::new(KernelError::Validation).attach(errors))
}

impl Validate for CreateBookDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, self.title.as_deref());
        check_description(&mut errors, self.description.as_deref(), false);
        check_page_count(&mut errors, self.page_count);
        check_distinct(&mut errors, self.title.as_deref(), self.description.as_deref());
        errors.into_result()
    }
}

impl Validate for UpdateBookDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, self.title.as_deref());
        check_description(&mut errors, self.description.as_deref(), true);
        check_page_count(&mut errors, self.page_count);
        check_distinct(&mut errors, self.title.as_deref(), self.description.as_deref());
        errors.into_result()
    }
}

impl Validate for CreateAuthorDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_author_field(&mut errors, "first_name", "first name", &self.first_name);
        check_author_field(&mut errors, "last_name", "last name", &self.last_name);
        check_author_field(&mut errors, "genre", "genre", &self.genre);
        for (index, book) in self.books.iter().enumerate() {
            if let Err(nested) = book.validate() {
                errors.nest(&format!("books[{index}]"), nested);
            }
        }
        errors.into_result()
    }
}

fn check_author_field(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    if value.is_empty() {
        errors.add(field, format!("You should fill out a {label}."));
    } else if value.chars().count() > AUTHOR_FIELD_MAX_LENGTH {
        errors.add(
            field,
            format!("The {label} shouldn't have more than {AUTHOR_FIELD_MAX_LENGTH} characters."),
        );
    }
}

fn check_title(errors: &mut ValidationErrors, title: Option<&str>) {
    match title {
        None | Some("") => errors.add("title", "You should fill out a title."),
        Some(title) if title.chars().count() > TITLE_MAX_LENGTH => errors.add(
            "title",
            format!("The title shouldn't have more than {TITLE_MAX_LENGTH} characters."),
        ),
        Some(_) => {}
    }
}

fn check_description(errors: &mut ValidationErrors, description: Option<&str>, required: bool) {
    match description {
        None | Some("") if required => {
            errors.add("description", "You should fill out a description.")
        }
        Some(description) if description.chars().count() > DESCRIPTION_MAX_LENGTH => errors.add(
            "description",
            format!(
                "The description shouldn't have more than {DESCRIPTION_MAX_LENGTH} characters."
            ),
        ),
        _ => {}
    }
}

fn check_page_count(errors: &mut ValidationErrors, page_count: Option<i32>) {
    if matches!(page_count, Some(pages) if pages <= 0) {
        errors.add("page_count", "The page count should be a positive number.");
    }
}

// Exact comparison: no trimming, no case folding.
fn check_distinct(errors: &mut ValidationErrors, title: Option<&str>, description: Option<&str>) {
    if let (Some(title), Some(description)) = (title, description) {
        if title == description {
            errors.add(
                "description",
                "The provided description should be different from the title.",
            );
        }
    }
}
