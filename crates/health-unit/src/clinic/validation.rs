//! Data-quality checks applied before patient and professional writes.
//!
//! These are total functions: malformed input yields `false`, never an error.

/// Keep only the ASCII digits of a CPF as typed by the user.
pub fn normalize_tax_id(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Validate a Brazilian CPF (11 digits, two modulo-11 check digits).
///
/// Punctuation is ignored, so `"529.982.247-25"` and `"52998224725"` are equivalent.
pub fn is_valid_tax_id(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }

    if digits.iter().all(|digit| *digit == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Weighted modulo-11 digit: weights run from `len + 1` down to 2.
fn check_digit(prefix: &[u32]) -> u32 {
    let top_weight = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(index, digit)| digit * (top_weight - index as u32))
        .sum();

    match sum % 11 {
        remainder if remainder < 2 => 0,
        remainder => 11 - remainder,
    }
}

/// Loose e-mail shape check: `local@domain.tld` with no whitespace.
pub fn is_valid_email(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_valid_numbers() {
        assert!(is_valid_tax_id("52998224725"));
        assert!(is_valid_tax_id("529.982.247-25"));
        assert!(is_valid_tax_id("123.456.789-09"));
    }

    #[test]
    fn rejects_repeated_digits() {
        for digit in 0..=9 {
            let cpf = digit.to_string().repeat(11);
            assert!(!is_valid_tax_id(&cpf), "{cpf} should be rejected");
        }
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_tax_id("1234567890"));
        assert!(!is_valid_tax_id("529982247250"));
        assert!(!is_valid_tax_id(""));
        assert!(!is_valid_tax_id("abc.def.ghi-jk"));
    }

    #[test]
    fn rejects_any_check_digit_mutation() {
        let valid = "52998224725";
        for position in [9usize, 10] {
            for replacement in '0'..='9' {
                let mut mutated: Vec<char> = valid.chars().collect();
                if mutated[position] == replacement {
                    continue;
                }
                mutated[position] = replacement;
                let candidate: String = mutated.into_iter().collect();
                assert!(!is_valid_tax_id(&candidate), "{candidate} should fail");
            }
        }
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_tax_id(" 529.982.247-25 "), "52998224725");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("recepcao@clinica.med.br"));
        assert!(!is_valid_email("recepcao@clinica"));
        assert!(!is_valid_email("@clinica.com"));
        assert!(!is_valid_email("ana maria@clinica.com"));
        assert!(!is_valid_email("ana@@clinica.com"));
        assert!(!is_valid_email("ana@clinica."));
    }
}
