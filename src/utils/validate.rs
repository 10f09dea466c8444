use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$").expect("Invalid email regex")
});

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    // 邮箱格式校验：必须包含 @ 和 .
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 原始分必须是区间内的整数
pub fn validate_raw_score(score: i32, min_score: i32, max_score: i32) -> Result<(), String> {
    if score < min_score || score > max_score {
        return Err(format!(
            "Score {score} out of range [{min_score}, {max_score}]"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("judge@hexathon.org").is_ok());
        assert!(validate_email("first.last+tag@sub.domain.io").is_ok());
    }

    #[test]
    fn test_invalid_email() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@nouser.com").is_err());
    }

    #[test]
    fn test_raw_score_range() {
        assert!(validate_raw_score(1, 1, 4).is_ok());
        assert!(validate_raw_score(4, 1, 4).is_ok());
        assert!(validate_raw_score(0, 1, 4).is_err());
        assert!(validate_raw_score(5, 1, 4).is_err());
    }
}
