use validator::ValidationErrors;

use crate::error::AppError;

/// Flatten `validator` errors into a single 400 message naming each
/// offending field.
pub fn validation_errors_to_app_error(errors: ValidationErrors) -> AppError {
    let mut parts: Vec<String> = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let detail = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            parts.push(format!("{}: {}", field, detail));
        }
    }

    if parts.is_empty() {
        parts.push("Invalid request".to_string());
    }

    parts.sort();
    AppError::Validation(parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn errors_name_each_field() {
        let probe = Probe {
            name: "ab".to_string(),
            quantity: 0,
        };
        let err = validation_errors_to_app_error(probe.validate().unwrap_err());
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("name"), "{msg}");
                assert!(msg.contains("quantity"), "{msg}");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}
