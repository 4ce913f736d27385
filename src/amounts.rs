//! Recipient/amount list parsing and aggregation.
//!
//! Pure functions over the three raw input fields; nothing in this module
//! touches the chain. Amounts are decimal strings in the smallest token unit
//! and are summed as 256-bit integers, never as floats.

use ethers::types::{Address, U256};

use crate::error::ValidationError;

/// Split raw input on runs of commas/newlines, trim each segment and drop
/// empties. Leading/trailing separators and blank lines are tolerated on
/// purpose. Idempotent: re-splitting the joined result yields the same list.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `^0x[0-9a-fA-F]{40}$`
pub fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Strictly positive decimal integer that fits in 256 bits.
fn parse_amount(s: &str) -> Option<U256> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = U256::from_dec_str(s).ok()?;
    if value.is_zero() {
        None
    } else {
        Some(value)
    }
}

/// Lenient preview total shown before (and independent of) validation: sums
/// whatever entries currently parse as positive integers and ignores the
/// rest. Saturates rather than wraps if someone pastes absurd values.
pub fn calculate_total(raw_amounts: &str) -> U256 {
    split_list(raw_amounts)
        .iter()
        .filter_map(|s| parse_amount(s))
        .fold(U256::zero(), |acc, v| acc.saturating_add(v))
}

/// Outcome of a fully successful validation pass. Recipients and amounts are
/// index-paired and never reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub token: Address,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    pub total: U256,
}

/// Validate the three raw inputs into a batch. Rules run in a fixed order and
/// the first failure short-circuits the rest: token address, recipients
/// non-empty, amounts non-empty, length equality, each recipient, each amount.
pub fn validate(
    token_text: &str,
    recipients_text: &str,
    amounts_text: &str,
) -> Result<ValidatedBatch, ValidationError> {
    let token_text = token_text.trim();
    if !is_hex_address(token_text) {
        return Err(ValidationError::MalformedToken(token_text.to_string()));
    }
    let token: Address = token_text
        .parse()
        .map_err(|_| ValidationError::MalformedToken(token_text.to_string()))?;

    let recipients_raw = split_list(recipients_text);
    if recipients_raw.is_empty() {
        return Err(ValidationError::NoRecipients);
    }
    let amounts_raw = split_list(amounts_text);
    if amounts_raw.is_empty() {
        return Err(ValidationError::NoAmounts);
    }
    if recipients_raw.len() != amounts_raw.len() {
        return Err(ValidationError::LengthMismatch {
            recipients: recipients_raw.len(),
            amounts: amounts_raw.len(),
        });
    }

    let mut recipients = Vec::with_capacity(recipients_raw.len());
    for (index, raw) in recipients_raw.iter().enumerate() {
        if !is_hex_address(raw) {
            return Err(ValidationError::MalformedRecipient {
                index,
                value: raw.clone(),
            });
        }
        let addr = raw.parse().map_err(|_| ValidationError::MalformedRecipient {
            index,
            value: raw.clone(),
        })?;
        recipients.push(addr);
    }

    let mut amounts = Vec::with_capacity(amounts_raw.len());
    let mut total = U256::zero();
    for (index, raw) in amounts_raw.iter().enumerate() {
        let value = parse_amount(raw).ok_or_else(|| ValidationError::NonPositiveAmount {
            index,
            value: raw.clone(),
        })?;
        total = total
            .checked_add(value)
            .ok_or(ValidationError::TotalOverflow)?;
        amounts.push(value);
    }

    Ok(ValidatedBatch {
        token,
        recipients,
        amounts,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_text(byte: &str) -> String {
        format!("0x{}", byte.repeat(20))
    }

    #[test]
    fn split_trims_and_drops_empties() {
        let raw = " 0xaa ,\n\n0xbb,,,\n 0xcc ,";
        assert_eq!(split_list(raw), vec!["0xaa", "0xbb", "0xcc"]);
    }

    #[test]
    fn split_is_idempotent() {
        let raw = "100,\n200,,\n\n300,";
        let once = split_list(raw);
        let again = split_list(&once.join(","));
        assert_eq!(once, again);
        assert_eq!(once, vec!["100", "200", "300"]);
    }

    #[test]
    fn total_is_exact_big_integer_sum() {
        let total = calculate_total("1000000000000000000, 2000000000000000000");
        assert_eq!(total, U256::from_dec_str("3000000000000000000").unwrap());
    }

    #[test]
    fn preview_total_ignores_entries_that_do_not_parse() {
        // Shown live while the user is still typing; leniency is deliberate.
        assert_eq!(calculate_total("100, abc, 200, -5"), U256::from(300u64));
        assert_eq!(calculate_total(""), U256::zero());
    }

    #[test]
    fn malformed_token_rejected_first() {
        let err = validate("0x123", &addr_text("11"), "100").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedToken("0x123".to_string())
        );
    }

    #[test]
    fn empty_lists_rejected_in_order() {
        let token = addr_text("aa");
        assert_eq!(
            validate(&token, " \n ", "100").unwrap_err(),
            ValidationError::NoRecipients
        );
        assert_eq!(
            validate(&token, &addr_text("11"), ",,\n").unwrap_err(),
            ValidationError::NoAmounts
        );
    }

    #[test]
    fn length_mismatch_reports_both_counts() {
        let token = addr_text("aa");
        let recipients = format!("{}, {}", addr_text("11"), addr_text("22"));
        let err = validate(&token, &recipients, "100, 200, 300").unwrap_err();
        assert_eq!(err.to_string(), "2 recipients but 3 amounts");
    }

    #[test]
    fn malformed_recipient_identified_by_index() {
        let token = addr_text("aa");
        let recipients = format!("{}, 0xdead", addr_text("11"));
        let err = validate(&token, &recipients, "100, 200").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedRecipient {
                index: 1,
                value: "0xdead".to_string()
            }
        );
    }

    #[test]
    fn zero_and_non_integer_amounts_rejected() {
        let token = addr_text("aa");
        let recipients = addr_text("11");
        assert!(matches!(
            validate(&token, &recipients, "0").unwrap_err(),
            ValidationError::NonPositiveAmount { index: 0, .. }
        ));
        assert!(matches!(
            validate(&token, &recipients, "1.5").unwrap_err(),
            ValidationError::NonPositiveAmount { index: 0, .. }
        ));
        assert!(matches!(
            validate(&token, &recipients, "-3").unwrap_err(),
            ValidationError::NonPositiveAmount { index: 0, .. }
        ));
    }

    #[test]
    fn valid_batch_preserves_pairing_and_total() {
        let token = addr_text("aa");
        let recipients = format!("{},\n{}", addr_text("11"), addr_text("22"));
        let batch = validate(&token, &recipients, "100,\n200").unwrap();
        assert_eq!(batch.recipients.len(), 2);
        assert_eq!(batch.amounts, vec![U256::from(100u64), U256::from(200u64)]);
        assert_eq!(batch.total, U256::from(300u64));
        assert_eq!(batch.recipients[0], addr_text("11").parse().unwrap());
        assert_eq!(batch.recipients[1], addr_text("22").parse().unwrap());
    }
}
