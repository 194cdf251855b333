use thiserror::Error;

/// Максимальная длина краткого описания курса (для списков)
pub const SHORT_DESCRIPTION_MAX_LEN: usize = 255;

/// Ошибки валидации значений, передаваемых в агрегаты и строители
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Price must be a non-negative number, got {0}")]
    InvalidPrice(f64),

    #[error("Duration must be a non-negative number of hours, got {0}")]
    InvalidDuration(f64),

    #[error("Short description is {actual} characters long, limit is {max}")]
    ShortDescriptionTooLong { max: usize, actual: usize },

    #[error("Rate must be a whole number of stars between 1 and 5, got {0}")]
    InvalidRate(f64),

    #[error("Comment must not be empty")]
    EmptyComment,

    #[error("Category name must not be empty")]
    EmptyCategoryName,

    #[error("Category cannot be its own parent")]
    SelfParentCategory,
}

/// Проверка цены: конечное неотрицательное число
pub fn ensure_price(price: f64) -> Result<f64, ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ValidationError::InvalidPrice(price))
    }
}

/// Проверка длительности курса в часах
pub fn ensure_duration(hours: f64) -> Result<f64, ValidationError> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(ValidationError::InvalidDuration(hours))
    }
}

pub fn ensure_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

pub fn ensure_short_description(text: &str) -> Result<(), ValidationError> {
    let actual = text.chars().count();
    if actual > SHORT_DESCRIPTION_MAX_LEN {
        return Err(ValidationError::ShortDescriptionTooLong {
            max: SHORT_DESCRIPTION_MAX_LEN,
            actual,
        });
    }
    Ok(())
}
