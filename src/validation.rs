//! Field checks shared by the store helpers and the snapshot importer.

/// Difficulty and priority are both rated on a 1..=5 scale.
pub fn validate_rating(field: &'static str, value: u8) -> Result<(), String> {
    if !(1..=5).contains(&value) {
        return Err(format!("{field} must be between 1 and 5, got {value}"));
    }
    Ok(())
}

pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

/// Ids are assigned from 1; an explicit id of 0 can only come from a bad snapshot.
pub fn validate_id(id: Option<u64>) -> Result<(), String> {
    if id == Some(0) {
        return Err("id must be a positive integer".to_string());
    }
    Ok(())
}

pub fn validate_ratio(field: &'static str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("{field} must be within 0.0..=1.0, got {value}"));
    }
    Ok(())
}

pub fn validate_page(page: usize, limit: usize) -> Result<(), String> {
    if page == 0 {
        return Err("page must be >= 1".to_string());
    }
    if limit == 0 {
        return Err("limit must be > 0".to_string());
    }
    Ok(())
}
