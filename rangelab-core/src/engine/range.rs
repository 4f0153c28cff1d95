//! Range allocation: turn a width specifier and a reference tick into
//! spacing-aligned tick bounds.

use crate::domain::{PositionRange, TokenPair, WidthSpec};
use crate::error::EngineError;
use crate::math::tick::{price_to_raw_tick, quote_price_at_tick, MAX_TICK, MIN_TICK};

/// Lowest and highest ticks usable at `tick_spacing`.
///
/// The spacing must leave at least one nonzero tick on each side of zero.
pub fn usable_tick_bounds(tick_spacing: i32) -> Result<(i32, i32), EngineError> {
    if tick_spacing <= 0 || tick_spacing > MAX_TICK {
        return Err(EngineError::InvalidTickSpacing { spacing: tick_spacing });
    }
    let lowest = (MIN_TICK as f64 / tick_spacing as f64).ceil() as i32 * tick_spacing;
    let highest = (MAX_TICK as f64 / tick_spacing as f64).floor() as i32 * tick_spacing;
    Ok((lowest, highest))
}

/// Compute the position range centered on the quote price at
/// `reference_tick`.
///
/// A percentage width `w` targets the quote band `[P(1 - w/2), P(1 + w/2)]`.
/// The higher quote maps to the lower tick; that tick is floored and the
/// other ceiled to the spacing grid, so the bounds always contain the band.
pub fn compute_range(
    reference_tick: i32,
    width: WidthSpec,
    tick_spacing: i32,
    pair: TokenPair,
) -> Result<PositionRange, EngineError> {
    let (lowest, highest) = usable_tick_bounds(tick_spacing)?;
    if !(MIN_TICK..=MAX_TICK).contains(&reference_tick) {
        return Err(EngineError::TickOutOfDomain {
            tick: reference_tick as i64,
        });
    }

    let fraction = match width {
        WidthSpec::FullRange => {
            return Ok(PositionRange {
                tick_lower: lowest,
                tick_upper: highest,
                price_lower: 0.0,
                price_upper: f64::INFINITY,
                range_width_fraction: None,
            });
        }
        WidthSpec::Percent(_) => width.fraction().unwrap_or_default(),
    };

    let spacing = tick_spacing as f64;
    let price = quote_price_at_tick(reference_tick, pair);
    let raw_lower = price_to_raw_tick(price * (1.0 + fraction / 2.0), pair)?;
    let raw_upper = price_to_raw_tick(price * (1.0 - fraction / 2.0), pair)?;

    let mut tick_lower = ((raw_lower / spacing).floor() * spacing).max(lowest as f64) as i32;
    let mut tick_upper = ((raw_upper / spacing).ceil() * spacing).min(highest as f64) as i32;
    // Near a domain edge both bounds can clamp onto the same usable tick.
    // Keep one spacing of width, inward from that edge.
    if tick_lower >= tick_upper {
        if tick_upper <= lowest {
            tick_upper = lowest + tick_spacing;
        } else if tick_lower >= highest {
            tick_lower = highest - tick_spacing;
        }
    }
    if tick_lower >= tick_upper {
        return Err(EngineError::InvertedRange {
            tick_lower,
            tick_upper,
        });
    }

    Ok(PositionRange {
        tick_lower,
        tick_upper,
        price_lower: quote_price_at_tick(tick_upper, pair),
        price_upper: quote_price_at_tick(tick_lower, pair),
        range_width_fraction: Some(fraction),
    })
}
