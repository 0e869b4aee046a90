// CPF (Cadastro de Pessoas Físicas) validation and masking
//
// A CPF is 11 digits: nine base digits followed by two check digits, each a
// weighted sum of the digits before it reduced modulo 11.

use crate::utils::digits_only;

/// Number of digits in a complete CPF
pub const CPF_LEN: usize = 11;

/// Computes one check digit over `digits`, weighting the first digit with
/// `digits.len() + 1` and decreasing by one per position.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let remainder = (sum * 10) % 11;
    if remainder >= 10 { 0 } else { remainder }
}

/// Validates a CPF with or without punctuation.
///
/// Rejects anything that does not have exactly 11 digits after stripping
/// non-digits, the ten repeated-digit sequences, and numbers whose check
/// digits do not match.
pub fn is_valid_cpf(input: &str) -> bool {
    let numbers = digits_only(input);
    if numbers.len() != CPF_LEN {
        return false;
    }

    let digits: Vec<u32> = numbers.chars().filter_map(|c| c.to_digit(10)).collect();

    // 000.000.000-00 .. 999.999.999-99 pass the arithmetic but are not issued
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    if check_digit(&digits[..9]) != digits[9] {
        return false;
    }
    check_digit(&digits[..10]) == digits[10]
}

/// Lenient check used while the user is still typing: up to 11 digits,
/// punctuation ignored, no check-digit verification.
pub fn is_valid_cpf_input(partial: &str) -> bool {
    digits_only(partial).len() <= CPF_LEN
}

/// Formats a CPF as `000.000.000-00`.
///
/// Input that does not contain exactly 11 digits is returned unchanged.
pub fn format_cpf(cpf: &str) -> String {
    let n = digits_only(cpf);
    if n.len() != CPF_LEN {
        return cpf.to_string();
    }
    format!("{}.{}.{}-{}", &n[..3], &n[3..6], &n[6..9], &n[9..])
}

/// Progressive input mask: `123` → `123`, `1234` → `123.4`,
/// `1234567890` → `123.456.789-0`. Digits beyond the eleventh are dropped.
pub fn format_cpf_input(cpf: &str) -> String {
    let mut n = digits_only(cpf);
    n.truncate(CPF_LEN);

    match n.len() {
        0..=3 => n,
        4..=6 => format!("{}.{}", &n[..3], &n[3..]),
        7..=9 => format!("{}.{}.{}", &n[..3], &n[3..6], &n[6..]),
        _ => format!("{}.{}.{}-{}", &n[..3], &n[3..6], &n[6..9], &n[9..]),
    }
}
