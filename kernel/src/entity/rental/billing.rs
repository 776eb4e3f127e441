use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln, References};

use crate::entity::{EndedAt, Position, PricePerMinute, StartedAt};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct DurationMinutes(i64);

impl DurationMinutes {
    pub fn new(minutes: impl Into<i64>) -> Self {
        Self(minutes.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct RentalCost(f64);

impl RentalCost {
    pub const ZERO: Self = Self(0.0);

    pub fn new(cost: impl Into<f64>) -> Self {
        Self(cost.into())
    }
}

/// Everything written to a rental row when it is closed.
///
/// The billed cost uses the exact elapsed minutes while the reported duration is rounded to
/// the nearest minute, so `cost` is not always `price * duration`.
#[derive(Debug, Clone, Copy, PartialEq, References, Destructure)]
pub struct Settlement {
    ended_at: EndedAt,
    end_position: Position,
    duration: DurationMinutes,
    cost: RentalCost,
}

impl Settlement {
    pub fn new(
        ended_at: EndedAt,
        end_position: Position,
        duration: DurationMinutes,
        cost: RentalCost,
    ) -> Self {
        Self {
            ended_at,
            end_position,
            duration,
            cost,
        }
    }

    pub fn compute(
        price: &PricePerMinute,
        started_at: &StartedAt,
        ended_at: EndedAt,
        end_position: Position,
    ) -> Self {
        let elapsed = *ended_at.as_ref() - *started_at.as_ref();
        let minutes = (elapsed.as_seconds_f64() / 60.0).max(0.0);
        let price: f64 = (*price).into();
        Self {
            ended_at,
            end_position,
            duration: DurationMinutes(minutes.round() as i64),
            cost: RentalCost(price * minutes),
        }
    }
}
