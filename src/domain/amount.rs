use std::fmt;

/// Amounts are whole units of the local currency. The fee never needs
/// fractions, so there is no minor-unit scaling.
pub type Amount = i64;

/// The total every person is expected to pay.
pub const FIXED_FEE: Amount = 700;

/// Granularity accepted for a single payment entered by hand.
pub const PAYMENT_STEP: Amount = 100;

/// Remaining balance for a given paid total, floored at zero.
pub fn amount_due_for(amount_paid: Amount) -> Amount {
    FIXED_FEE.saturating_sub(amount_paid).max(0)
}

/// Parse a whole-unit amount typed by a user.
/// Example: "300" -> 300, " 700 " -> 700
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    input
        .trim()
        .parse::<Amount>()
        .map_err(|_| ParseAmountError::InvalidFormat)
}

/// Check a hand-entered payment against the input bounds: between zero and
/// the fixed fee, in steps of `PAYMENT_STEP`.
pub fn validate_payment_input(amount: Amount) -> Result<Amount, ParseAmountError> {
    if !(0..=FIXED_FEE).contains(&amount) {
        return Err(ParseAmountError::OutOfRange(amount));
    }
    if amount % PAYMENT_STEP != 0 {
        return Err(ParseAmountError::NotAStep(amount));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    OutOfRange(Amount),
    NotAStep(Amount),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid amount format"),
            ParseAmountError::OutOfRange(amount) => {
                write!(f, "amount {} must be between 0 and {}", amount, FIXED_FEE)
            }
            ParseAmountError::NotAStep(amount) => {
                write!(f, "amount {} must be a multiple of {}", amount, PAYMENT_STEP)
            }
        }
    }
}

impl std::error::Error for ParseAmountError {}
