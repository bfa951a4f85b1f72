//! Credit transfer primitive.

/// Move as much credit as possible from `debit` to `credit` while keeping
/// `debit >= debit_floor` and `credit <= credit_ceil`.
///
/// If either bound is already violated nothing moves. Returns the amount
/// transferred.
pub fn xfer_credit(debit: &mut i64, debit_floor: i64, credit: &mut i64, credit_ceil: i64) -> i64 {
    let xfer = (*debit - debit_floor).min(credit_ceil - *credit);
    if xfer > 0 {
        *debit -= xfer;
        *credit += xfer;
        xfer
    } else {
        0
    }
}
