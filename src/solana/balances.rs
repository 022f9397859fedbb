use crate::solana::models::{DeltaDirection, RawAmount, TokenBalanceSnapshot, TokenDelta};

/// Compute per-token balance deltas.
///
/// Snapshots are paired by position: the i-th post balance against the i-th
/// pre balance, as the ledger emits both lists in the same order. Mismatched
/// lengths or a missing list yield no deltas.
pub fn analyze(
    pre_balances: Option<&[TokenBalanceSnapshot]>,
    post_balances: Option<&[TokenBalanceSnapshot]>,
) -> Vec<TokenDelta> {
    let (Some(pre_balances), Some(post_balances)) = (pre_balances, post_balances) else {
        return Vec::new();
    };

    if pre_balances.len() != post_balances.len() {
        return Vec::new();
    }

    post_balances
        .iter()
        .zip(pre_balances)
        .map(|(post, pre)| delta_between(pre, post))
        .collect()
}

fn delta_between(pre: &TokenBalanceSnapshot, post: &TokenBalanceSnapshot) -> TokenDelta {
    let raw_change = post.amount.signed_sub(pre.amount);

    let direction = match raw_change.signum() {
        1 => DeltaDirection::Buy,
        -1 => DeltaDirection::Sell,
        _ => DeltaDirection::NoChange,
    };

    TokenDelta {
        account_index: post.account_index,
        mint: post.mint.clone(),
        owner: post.owner.clone(),
        pre_amount: pre.amount,
        post_amount: post.amount,
        raw_change,
        decimals: post.decimals,
        ui_amount: normalize(raw_change, post.decimals),
        direction,
    }
}

fn normalize(raw_change: i128, decimals: u8) -> f64 {
    raw_change.unsigned_abs() as f64 / 10f64.powi(i32::from(decimals))
}
