use crate::solana::models::{DeltaDirection, TokenDelta, TradePair};

/// Greedily pair Buy deltas with Sell deltas in their original order.
///
/// Yields min(buys, sells) pairs; surplus deltas of either side and
/// NoChange deltas are left unpaired.
pub fn pair(deltas: &[TokenDelta]) -> Vec<TradePair> {
    let buys = deltas.iter().filter(|d| d.direction == DeltaDirection::Buy);
    let sells = deltas.iter().filter(|d| d.direction == DeltaDirection::Sell);

    buys.zip(sells)
        .map(|(buy, sell)| TradePair { buy: buy.clone(), sell: sell.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::models::RawAmount;

    fn delta(owner: &str, raw_change: i128) -> TokenDelta {
        let direction = match raw_change.signum() {
            1 => DeltaDirection::Buy,
            -1 => DeltaDirection::Sell,
            _ => DeltaDirection::NoChange,
        };
        TokenDelta {
            account_index: None,
            mint: "mint".to_string(),
            owner: owner.to_string(),
            pre_amount: RawAmount::from(1_000),
            post_amount: RawAmount::new((1_000 + raw_change) as u128).unwrap(),
            raw_change,
            decimals: 0,
            ui_amount: raw_change.unsigned_abs() as f64,
            direction,
        }
    }

    #[test]
    fn test_single_pair() {
        let deltas = vec![delta("a", 50), delta("b", -60)];
        let pairs = pair(&deltas);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].buy, deltas[0]);
        assert_eq!(pairs[0].sell, deltas[1]);
    }

    #[test]
    fn test_surplus_left_unpaired_in_order() {
        let deltas = vec![
            delta("s1", -1),
            delta("b1", 1),
            delta("s2", -2),
            delta("flat", 0),
            delta("s3", -3),
            delta("b2", 2),
        ];

        let pairs = pair(&deltas);

        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].buy.owner.as_str(), pairs[0].sell.owner.as_str()), ("b1", "s1"));
        assert_eq!((pairs[1].buy.owner.as_str(), pairs[1].sell.owner.as_str()), ("b2", "s2"));
    }

    #[test]
    fn test_pair_count_is_min_of_sides() {
        for buys in 0..4i128 {
            for sells in 0..4i128 {
                let mut deltas: Vec<_> = (1..=buys).map(|i| delta("b", i)).collect();
                deltas.extend((1..=sells).map(|i| delta("s", -i)));
                assert_eq!(pair(&deltas).len() as i128, buys.min(sells));
            }
        }
    }

    #[test]
    fn test_only_no_change() {
        assert!(pair(&[delta("x", 0), delta("y", 0)]).is_empty());
        assert!(pair(&[]).is_empty());
    }
}
