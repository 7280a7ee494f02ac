//! Depth helpers over book snapshots
//!
//! Zero-allocation walks over the published levels. The engine's own resting
//! order is part of the public book, so anything that looks for "the
//! competition" has to subtract it first.
use super::l2_book::BookSnapshot;
use crate::core::{Price, Side, Volume};

/// Best price on `side` that has volume from someone other than us
///
/// `own` is the price and remaining volume of the engine's resting order on
/// that side, if any. A level at our price counts only for the volume in
/// excess of ours.
///
/// # Returns
/// * `Some(price)` - best competing price
/// * `None` - nobody else is quoting within the published depth
#[inline]
pub fn competing_price(
    book: &BookSnapshot,
    side: Side,
    own: Option<(Price, Volume)>,
) -> Option<Price> {
    book.levels(side).find_map(|(price, volume)| {
        let others = match own {
            Some((own_price, own_volume)) if own_price == price => {
                volume.saturating_sub(own_volume)
            }
            _ => volume,
        };
        (others > 0).then_some(price)
    })
}

/// Total volume on `side` at prices at least as good as `limit`
///
/// For bids "at least as good" means `>= limit`, for asks `<= limit`.
#[inline]
pub fn volume_through(book: &BookSnapshot, side: Side, limit: Price) -> Volume {
    book.levels(side)
        .take_while(|(price, _)| match side {
            Side::Buy => *price >= limit,
            Side::Sell => *price <= limit,
        })
        .map(|(_, volume)| volume)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Instrument;

    fn book() -> BookSnapshot {
        BookSnapshot {
            instrument: Instrument::Primary,
            sequence: 1,
            ask_prices: [10_100, 10_200, 10_300, 0, 0],
            ask_volumes: [50, 20, 30, 0, 0],
            bid_prices: [9_900, 9_800, 0, 0, 0],
            bid_volumes: [15, 25, 0, 0, 0],
        }
    }

    #[test]
    fn test_competing_price_without_own_order() {
        let book = book();
        assert_eq!(competing_price(&book, Side::Sell, None), Some(10_100));
        assert_eq!(competing_price(&book, Side::Buy, None), Some(9_900));
    }

    #[test]
    fn test_competing_price_skips_own_level() {
        let book = book();
        // Our ask is the whole 10_100 level
        assert_eq!(
            competing_price(&book, Side::Sell, Some((10_100, 50))),
            Some(10_200)
        );
        // Someone else shares our level
        assert_eq!(
            competing_price(&book, Side::Sell, Some((10_100, 40))),
            Some(10_100)
        );
        // Our order elsewhere doesn't matter
        assert_eq!(
            competing_price(&book, Side::Buy, Some((9_700, 10))),
            Some(9_900)
        );
    }

    #[test]
    fn test_competing_price_empty_side() {
        let book = BookSnapshot::empty(Instrument::Primary, 1);
        assert_eq!(competing_price(&book, Side::Sell, None), None);
    }

    #[test]
    fn test_volume_through() {
        let book = book();
        assert_eq!(volume_through(&book, Side::Sell, 10_200), 70);
        assert_eq!(volume_through(&book, Side::Sell, 10_000), 0);
        assert_eq!(volume_through(&book, Side::Buy, 9_800), 40);
        assert_eq!(volume_through(&book, Side::Buy, 9_850), 15);
    }
}
