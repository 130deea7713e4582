pub fn validate_scores(local: i32, away: i32) -> Result<(), String> {
    if local < 0 || away < 0 {
        return Err(format!(
            "scores must be non-negative, got local={local} away={away}"
        ));
    }
    Ok(())
}

pub fn validate_score(value: i32) -> Result<(), String> {
    if value < 0 {
        return Err(format!("score must be non-negative, got {value}"));
    }
    Ok(())
}

pub fn validate_entity_id(id: i64) -> Result<(), String> {
    if id <= 0 {
        return Err(format!("{id} is not a valid identifier"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    const MAX: usize = 80;
    if !(1..=MAX).contains(&name.chars().count()) {
        return Err(format!(
            "Failed name length check: 1 <= length={} <= {MAX}",
            name.chars().count()
        ));
    }
    Ok(())
}

pub fn validate_minute(minute: i32) -> Result<(), String> {
    const MAX: i32 = 130;
    if !(0..=MAX).contains(&minute) {
        return Err(format!("minute {minute} outside of [0..{MAX}]"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scores() {
        assert!(validate_scores(0, 0).is_ok());
        assert!(validate_scores(7, 3).is_ok());
        assert!(validate_scores(-1, 0).is_err());
        assert!(validate_scores(0, -4).is_err());
    }

    #[test]
    fn entity_ids() {
        assert!(validate_entity_id(1).is_ok());
        assert!(validate_entity_id(0).is_err());
        assert!(validate_entity_id(-7).is_err());
    }

    #[test]
    fn minutes() {
        assert!(validate_minute(0).is_ok());
        assert!(validate_minute(95).is_ok());
        assert!(validate_minute(-1).is_err());
        assert!(validate_minute(200).is_err());
    }
}
