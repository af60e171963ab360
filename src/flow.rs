//! Material flow aggregation and valuation

use std::collections::BTreeMap;

use crate::models::{Direction, MaterialFlowLine};

/// Merge flow lists into one line per ticker, summing inputs and outputs
/// independently.
///
/// Every ticker that appears in any list appears exactly once in the result,
/// even when its totals are zero. Lines are ordered by ticker, so the result
/// doesn't depend on the order or grouping of the lists.
pub fn combine<L>(lists: &[L]) -> Vec<MaterialFlowLine>
where
    L: AsRef<[MaterialFlowLine]>,
{
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for list in lists {
        for line in list.as_ref() {
            let entry = totals.entry(line.ticker.as_str()).or_insert((0.0, 0.0));
            entry.0 += line.input;
            entry.1 += line.output;
        }
    }

    totals
        .into_iter()
        .map(|(ticker, (input, output))| MaterialFlowLine {
            ticker: ticker.to_string(),
            input,
            output,
        })
        .collect()
}

/// Net delta of one ticker across a flow, 0 when it doesn't appear
pub fn net_delta(lines: &[MaterialFlowLine], ticker: &str) -> f64 {
    lines
        .iter()
        .filter(|l| l.ticker == ticker)
        .map(MaterialFlowLine::delta)
        .sum()
}

/// Direction a net delta is traded in: surplus is sold, deficit is bought
pub fn trade_direction(delta: f64) -> Direction {
    if delta >= 0.0 {
        Direction::Sell
    } else {
        Direction::Buy
    }
}

/// A flow line together with the value of its net delta
#[derive(Debug, Clone, PartialEq)]
pub struct PricedFlowLine {
    pub ticker: String,
    pub input: f64,
    pub output: f64,
    pub delta: f64,
    pub unit_price: f64,
    pub value: f64,
}

/// Price each distinct ticker's net delta in its trade direction.
pub fn price_lines<F>(lines: &[MaterialFlowLine], price: F) -> Vec<PricedFlowLine>
where
    F: Fn(&str, Direction) -> f64,
{
    combine(&[lines])
        .into_iter()
        .map(|line| {
            let delta = line.delta();
            let unit_price = price(&line.ticker, trade_direction(delta));
            PricedFlowLine {
                value: unit_price * delta,
                ticker: line.ticker,
                input: line.input,
                output: line.output,
                delta,
                unit_price,
            }
        })
        .collect()
}

/// Total value of a flow: sum of price x net delta, surplus priced at SELL
/// and deficit at BUY.
pub fn value_flow<F>(lines: &[MaterialFlowLine], price: F) -> f64
where
    F: Fn(&str, Direction) -> f64,
{
    price_lines(lines, price).iter().map(|l| l.value).sum()
}

/// Total value of a flow with every ticker priced in one direction
pub fn total_price<F>(lines: &[MaterialFlowLine], direction: Direction, price: F) -> f64
where
    F: Fn(&str, Direction) -> f64,
{
    lines
        .iter()
        .map(|line| price(&line.ticker, direction) * line.delta())
        .sum()
}

/// Scale every line by a factor, e.g. a building count
pub fn scale(lines: &[MaterialFlowLine], factor: f64) -> Vec<MaterialFlowLine> {
    lines
        .iter()
        .map(|l| MaterialFlowLine {
            ticker: l.ticker.clone(),
            input: l.input * factor,
            output: l.output * factor,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(ticker: &str, input: f64, output: f64) -> MaterialFlowLine {
        MaterialFlowLine {
            ticker: ticker.to_string(),
            input,
            output,
        }
    }

    fn fixed_price(ticker: &str, direction: Direction) -> f64 {
        match (ticker, direction) {
            ("DW", Direction::Buy) => 10.0,
            ("DW", Direction::Sell) => 8.0,
            ("O", Direction::Buy) => 100.0,
            ("O", Direction::Sell) => 90.0,
            _ => 0.0,
        }
    }

    #[test]
    fn combine_sums_by_ticker() {
        let a = vec![line("DW", 10.0, 0.0), line("O", 0.0, 3.0)];
        let b = vec![line("DW", 5.0, 2.0)];
        let combined = combine(&[a, b]);
        assert_eq!(combined, vec![line("DW", 15.0, 2.0), line("O", 0.0, 3.0)]);
    }

    #[test]
    fn combine_keeps_net_zero_lines() {
        let combined = combine(&[
            vec![line("DW", 5.0, 0.0)],
            vec![line("DW", 0.0, 5.0)],
            vec![line("RAT", 0.0, 0.0)],
        ]);
        assert_eq!(combined, vec![line("DW", 5.0, 5.0), line("RAT", 0.0, 0.0)]);
        assert_eq!(combined[0].delta(), 0.0);
    }

    #[test]
    fn combine_of_nothing() {
        let empty: Vec<Vec<MaterialFlowLine>> = vec![];
        assert!(combine(&empty).is_empty());
        assert!(combine(&[Vec::<MaterialFlowLine>::new()]).is_empty());
    }

    #[test]
    fn value_prices_surplus_at_sell_and_deficit_at_buy() {
        let lines = vec![line("DW", 20.0, 0.0), line("O", 0.0, 3.0)];
        // -20 * 10 + 3 * 90
        assert_eq!(value_flow(&lines, fixed_price), 70.0);

        let priced = price_lines(&lines, fixed_price);
        assert_eq!(priced[0].unit_price, 10.0);
        assert_eq!(priced[0].value, -200.0);
        assert_eq!(priced[1].unit_price, 90.0);
        assert_eq!(priced[1].value, 270.0);
    }

    #[test]
    fn value_nets_duplicate_tickers_before_pricing() {
        // net +1 DW is a surplus, priced once at SELL
        let lines = vec![line("DW", 2.0, 0.0), line("DW", 0.0, 3.0)];
        assert_eq!(value_flow(&lines, fixed_price), 8.0);
    }

    #[test]
    fn zero_delta_priced_as_sell_and_worth_nothing() {
        assert_eq!(trade_direction(0.0), Direction::Sell);
        assert_eq!(value_flow(&[line("O", 1.0, 1.0)], fixed_price), 0.0);
    }

    #[test]
    fn total_price_in_one_direction() {
        let lines = vec![line("DW", 4.0, 0.0), line("O", 1.0, 0.0)];
        assert_eq!(total_price(&lines, Direction::Buy, fixed_price), -140.0);
    }

    #[test]
    fn net_delta_across_lines() {
        let lines = vec![line("DW", 2.0, 0.0), line("O", 0.0, 3.0), line("DW", 0.0, 5.0)];
        assert_eq!(net_delta(&lines, "DW"), 3.0);
        assert_eq!(net_delta(&lines, "RAT"), 0.0);
    }

    #[test]
    fn scaling() {
        assert_eq!(scale(&[line("DW", 2.0, 1.0)], 3.0), vec![line("DW", 6.0, 3.0)]);
    }

    fn arb_lists() -> impl Strategy<Value = Vec<Vec<MaterialFlowLine>>> {
        let ticker = prop::sample::select(vec!["DW", "RAT", "O", "FEO", "H2O"]);
        let line = (ticker, 0u32..1000, 0u32..1000)
            .prop_map(|(t, i, o)| MaterialFlowLine {
                ticker: t.to_string(),
                input: i as f64,
                output: o as f64,
            });
        prop::collection::vec(prop::collection::vec(line, 0..6), 0..6)
    }

    proptest! {
        #[test]
        fn combine_is_order_independent(lists in arb_lists(), seed in any::<u64>()) {
            let flat = combine(&lists);

            let mut reversed = lists.clone();
            reversed.reverse();
            prop_assert_eq!(&combine(&reversed), &flat);

            // rotate by a seeded amount
            let mut rotated = lists.clone();
            if !rotated.is_empty() {
                let k = (seed as usize) % rotated.len();
                rotated.rotate_left(k);
            }
            prop_assert_eq!(&combine(&rotated), &flat);
        }

        #[test]
        fn combine_is_associative(lists in arb_lists(), split in 0usize..6) {
            let split = split.min(lists.len());
            let (left, right) = lists.split_at(split);
            let grouped = combine(&[combine(left), combine(right)]);
            prop_assert_eq!(grouped, combine(&lists));
        }
    }
}
