use thiserror::Error;

/// Validation failures surfaced to whoever submitted the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("Description is required")]
    MissingDescription,
    #[error("Description must be 1000 characters or less")]
    DescriptionTooLong,
    #[error("Category is required")]
    MissingCategory,
    #[error("Subcategory is required")]
    MissingSubcategory,
    #[error("Subcategory `{subcategory}` does not belong to {category}")]
    SubcategoryMismatch { category: String, subcategory: String },
    #[error("Municipal Corporation is required")]
    MissingMunicipalCorp,
    #[error("Municipal Code is required")]
    MissingMunicipalCode,
    #[error("Area is required")]
    MissingArea,
    #[error("Issue not found: {0}")]
    NotFound(String),
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Unknown social platform: {0}")]
    UnknownPlatform(String),
    #[error("Admin accounts require a municipal code")]
    AdminWithoutMunicipalCode,
}
